//! Combat resolution: projectile travel and hit application.
//!
//! Projectiles fly in a straight line at constant speed. Each tick the
//! segment travelled is swept against the collision spheres of living
//! enemies; the earliest contact takes the damage and consumes the
//! projectile (one hit, no penetration, no splash). A projectile that misses
//! loses lifetime and is removed once it runs out.

use hecs::{Entity, World};
use tracing::trace;

use rampart_core::components::*;
use rampart_core::enums::EnemyKind;
use rampart_core::events::SimEvent;
use rampart_core::types::{segment_sphere_entry, Position};

use crate::context::MatchContext;
use crate::enemy::{apply_damage, is_alive, DamageOutcome};

/// A living enemy's collision volume, gathered once per tick.
struct Target {
    id: u32,
    entity: Entity,
    kind: EnemyKind,
    center: Position,
    radius: f64,
}

pub fn run(world: &mut World, ctx: &mut MatchContext<'_>, dt: f64, despawn_buffer: &mut Vec<Entity>) {
    despawn_buffer.clear();

    let mut targets: Vec<Target> = world
        .query::<(&Enemy, &Position, &Collider, &Lifecycle)>()
        .iter()
        .filter(|(_, (_, _, _, life))| is_alive(life))
        .map(|(entity, (enemy, pos, collider, _))| Target {
            id: enemy.id,
            entity,
            kind: enemy.kind,
            center: *pos,
            radius: collider.radius,
        })
        .collect();
    targets.sort_by_key(|t| t.id);

    let mut projectiles: Vec<(Entity, Position, Projectile)> = world
        .query::<(&Projectile, &Position)>()
        .iter()
        .map(|(entity, (projectile, pos))| (entity, *pos, *projectile))
        .collect();
    projectiles.sort_by_key(|(_, _, p)| p.id);

    for (entity, start, projectile) in projectiles {
        let end = Position(start.0 + projectile.direction * projectile.speed * dt);

        match first_contact(&targets, &start, &end) {
            Some(index) => {
                despawn_buffer.push(entity);
                if resolve_hit(world, ctx, &targets[index], &projectile) {
                    // Dying enemies no longer stop projectiles.
                    targets.remove(index);
                }
            }
            None => {
                let Ok((pos, live)) = world.query_one_mut::<(&mut Position, &mut Projectile)>(entity)
                else {
                    continue;
                };
                *pos = end;
                live.remaining_lifetime_secs -= dt;
                if live.remaining_lifetime_secs <= 0.0 {
                    trace!(projectile = projectile.id, "expired");
                    ctx.events.push(SimEvent::ProjectileExpired {
                        projectile_id: projectile.id,
                    });
                    despawn_buffer.push(entity);
                }
            }
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}

/// Index of the target hit first along `start -> end`. Equal contact
/// fractions go to the lower enemy id.
fn first_contact(targets: &[Target], start: &Position, end: &Position) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, target) in targets.iter().enumerate() {
        let Some(t) = segment_sphere_entry(start.0, end.0, target.center.0, target.radius) else {
            continue;
        };
        if best.map_or(true, |(_, best_t)| t < best_t) {
            best = Some((index, t));
        }
    }
    best.map(|(index, _)| index)
}

/// Apply the projectile's damage. Returns true if this hit killed the enemy.
fn resolve_hit(
    world: &mut World,
    ctx: &mut MatchContext<'_>,
    target: &Target,
    projectile: &Projectile,
) -> bool {
    let death_effect = ctx.config.death_effect_secs;
    let Ok((stats, life)) = world.query_one_mut::<(&mut EnemyStats, &mut Lifecycle)>(target.entity)
    else {
        return false;
    };

    let outcome = apply_damage(stats, life, projectile.damage, death_effect);
    if outcome == DamageOutcome::Ignored {
        return false;
    }
    let reward = stats.money_on_kill;

    trace!(projectile = projectile.id, enemy = target.id, "hit");
    ctx.events.push(SimEvent::ProjectileHit {
        projectile_id: projectile.id,
        enemy_id: target.id,
        damage: projectile.damage,
    });

    if outcome == DamageOutcome::Killed {
        ctx.enemy_killed(target.id, target.kind, reward, target.center);
        return true;
    }
    false
}
