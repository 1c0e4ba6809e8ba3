//! Cleanup system: removes dying enemies once their death effect has elapsed.

use hecs::{Entity, World};
use tracing::trace;

use rampart_core::components::{Enemy, Lifecycle};
use rampart_core::enums::EnemyPhase;
use rampart_core::events::SimEvent;

/// Count down death effects and despawn finished enemies.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(world: &mut World, dt: f64, despawn_buffer: &mut Vec<Entity>, events: &mut Vec<SimEvent>) {
    despawn_buffer.clear();

    let mut removed = Vec::new();
    for (entity, (enemy, life)) in world.query_mut::<(&Enemy, &mut Lifecycle)>() {
        if life.phase != EnemyPhase::Dying {
            continue;
        }
        life.removal_in_secs -= dt;
        if life.removal_in_secs <= 0.0 {
            despawn_buffer.push(entity);
            removed.push(enemy.id);
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }

    removed.sort_unstable();
    for enemy_id in removed {
        trace!(enemy = enemy_id, "removed");
        events.push(SimEvent::EnemyRemoved { enemy_id });
    }
}
