//! Enemy movement system.
//!
//! Walks every living enemy along the level path. An enemy that moves past
//! the final waypoint leaks: it latches into `Dying` and reports to the
//! economy and the scheduler through the match context.

use hecs::World;
use tracing::trace;

use rampart_core::components::{Enemy, EnemyStats, Lifecycle, PathFollower};
use rampart_core::types::Position;

use crate::context::MatchContext;
use crate::enemy::{advance_along_path, is_alive, mark_leaked, PathProgress};

pub fn run(world: &mut World, ctx: &mut MatchContext<'_>, dt: f64) {
    let config = ctx.config;
    let path = &config.level.path;

    let mut leaked: Vec<(u32, u32)> = Vec::new();

    for (_entity, (enemy, pos, follower, stats, life)) in world.query_mut::<(
        &Enemy,
        &mut Position,
        &mut PathFollower,
        &EnemyStats,
        &mut Lifecycle,
    )>() {
        if !is_alive(life) {
            continue;
        }

        let progress = advance_along_path(
            pos,
            follower,
            path,
            stats.move_speed,
            dt,
            config.arrival_tolerance,
        );
        if progress == PathProgress::ReachedEnd && mark_leaked(life, config.death_effect_secs) {
            trace!(enemy = enemy.id, "reached end of path");
            leaked.push((enemy.id, stats.damage_on_reach_end));
        }
    }

    // Report in id order so the event stream does not depend on archetype layout.
    leaked.sort_by_key(|(id, _)| *id);
    for (enemy_id, damage) in leaked {
        ctx.enemy_leaked(enemy_id, damage);
    }
}
