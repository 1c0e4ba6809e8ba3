//! Entity spawn factories for setting up the simulation world.
//!
//! Creates no-build zones, enemies and towers with their component bundles.

use hecs::World;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use rampart_core::components::*;
use rampart_core::config::{MatchConfig, TowerSpec};
use rampart_core::enums::{EnemyKind, TowerKind};
use rampart_core::types::Position;

/// Set up the static match world: the path corridor and authored no-build
/// zones. Enemies are spawned by the wave scheduler, towers by placement.
pub fn setup_match(world: &mut World, config: &MatchConfig) {
    let level = &config.level;
    for shape in level.corridor_zones().into_iter().chain(level.no_build_zones.iter().copied()) {
        world.spawn((NoBuildZone { shape },));
    }
}

/// Spawn one enemy at the start of the path, jittered sideways by up to
/// `spawn_spread`. Returns `None` if the kind has no catalog entry or the
/// level has no path.
pub fn spawn_enemy(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    config: &MatchConfig,
    kind: EnemyKind,
    id: u32,
) -> Option<Position> {
    let spec = config.enemies.get(&kind)?;
    let start = *config.level.path.first()?;

    let mut position = start;
    if config.spawn_spread > 0.0 {
        // Perpendicular to the first segment on the ground plane.
        let lateral = config
            .level
            .path
            .get(1)
            .and_then(|next| start.direction_to(next))
            .map(|dir| glam::DVec3::new(-dir.z, 0.0, dir.x))
            .unwrap_or(glam::DVec3::Z);
        let offset: f64 = rng.gen_range(-config.spawn_spread..=config.spawn_spread);
        position.0 += lateral * offset;
    }

    world.spawn((
        Enemy { id, kind },
        position,
        EnemyStats {
            health: spec.health,
            max_health: spec.health,
            move_speed: spec.move_speed,
            money_on_kill: spec.money_on_kill,
            damage_on_reach_end: spec.damage_on_reach_end,
        },
        PathFollower { waypoint: 1 },
        Collider {
            radius: spec.collision_radius,
        },
        Lifecycle::default(),
    ));

    Some(position)
}

/// Spawn a placed tower. Weapon parameters are copied from the catalog once
/// and never change afterwards.
pub fn spawn_tower(
    world: &mut World,
    id: u32,
    kind: TowerKind,
    spec: &TowerSpec,
    position: Position,
) -> hecs::Entity {
    world.spawn((
        Tower {
            id,
            kind,
            cost: spec.cost,
            footprint_radius: spec.footprint_radius,
        },
        position,
        Weapon {
            attack_range: spec.attack_range,
            fire_rate: spec.fire_rate,
            projectile_speed: spec.projectile_speed,
            projectile_damage: spec.projectile_damage,
            projectile_lifetime_secs: spec.projectile_lifetime_secs,
        },
        FireControl::default(),
    ))
}
