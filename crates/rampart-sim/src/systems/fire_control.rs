//! Fire control system: tower target acquisition and fire-rate gating.
//!
//! Every tick each tower re-queries the enemies within its attack range and
//! takes the nearest one. A shot leaves only when a target exists and the
//! tower's cooldown has elapsed; the target is re-validated right before
//! firing so a stale handle never produces a shot.

use hecs::{Entity, World};
use tracing::trace;

use rampart_core::components::*;
use rampart_core::constants::TIME_EPSILON;
use rampart_core::enums::SpatialCategory;
use rampart_core::events::SimEvent;
use rampart_core::types::Position;

use crate::enemy::is_alive;
use crate::spatial::SpatialQuery;

/// A shot decided during the read pass, applied afterwards.
struct Shot {
    tower_id: u32,
    target_id: u32,
    origin: Position,
    aim: Position,
    weapon: Weapon,
}

/// Run target selection and firing for every tower.
pub fn run(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    now: f64,
    next_projectile_id: &mut u32,
    events: &mut Vec<SimEvent>,
) {
    let mut towers: Vec<(Entity, u32, Position, Weapon)> = world
        .query::<(&Tower, &Position, &Weapon)>()
        .iter()
        .map(|(entity, (tower, pos, weapon))| (entity, tower.id, *pos, *weapon))
        .collect();
    towers.sort_by_key(|(_, id, ..)| *id);

    let mut shots = Vec::new();
    for (entity, tower_id, origin, weapon) in towers {
        let target = select_target(world, spatial, &origin, weapon.attack_range);

        let Ok(fire_control) = world.query_one_mut::<&mut FireControl>(entity) else {
            continue;
        };
        fire_control.target = target.map(|(id, _)| id);

        let Some((target_id, target_entity)) = target else {
            continue;
        };
        if now + TIME_EPSILON < fire_control.next_fire_time {
            continue;
        }

        // Re-validate: the handle may have gone stale since selection.
        let Some(aim) = live_position(world, target_entity) else {
            continue;
        };
        if let Ok(fire_control) = world.query_one_mut::<&mut FireControl>(entity) {
            fire_control.next_fire_time =
                next_fire_time(fire_control.next_fire_time, now, weapon.fire_rate);
        }
        shots.push(Shot {
            tower_id,
            target_id,
            origin,
            aim,
            weapon,
        });
    }

    for shot in shots {
        fire(world, shot, next_projectile_id, events);
    }
}

/// Nearest living enemy within `range` of `origin`, as `(enemy id, entity)`.
/// Candidates arrive in a fixed order and ties keep the first one found.
pub fn select_target(
    world: &World,
    spatial: &dyn SpatialQuery,
    origin: &Position,
    range: f64,
) -> Option<(u32, Entity)> {
    let mut best: Option<(u32, Entity, f64)> = None;

    for entity in spatial.find_within_radius(world, origin, range, SpatialCategory::Enemy) {
        let Ok(mut query) = world.query_one::<(&Enemy, &Position)>(entity) else {
            continue;
        };
        let Some((enemy, pos)) = query.get() else {
            continue;
        };

        let distance_sq = origin.distance_squared_to(pos);
        if best.map_or(true, |(_, _, best_sq)| distance_sq < best_sq) {
            best = Some((enemy.id, entity, distance_sq));
        }
    }

    best.map(|(id, entity, _)| (id, entity))
}

/// Cooldown end after a shot at `now`. A shot that was due within the last
/// period keeps the schedule, so tick granularity never stretches the
/// cadence; after a longer idle spell the period starts from `now`.
pub fn next_fire_time(scheduled: f64, now: f64, fire_rate: f64) -> f64 {
    let period = 1.0 / fire_rate;
    if now - scheduled < period {
        scheduled + period
    } else {
        now + period
    }
}

/// Current position of an enemy that is still alive.
fn live_position(world: &World, entity: Entity) -> Option<Position> {
    let mut query = world.query_one::<(&Position, &Lifecycle)>(entity).ok()?;
    let (pos, life) = query.get()?;
    is_alive(life).then_some(*pos)
}

fn fire(world: &mut World, shot: Shot, next_projectile_id: &mut u32, events: &mut Vec<SimEvent>) {
    // Target sitting exactly on the tower: no direction to fire in.
    let Some(direction) = shot.origin.direction_to(&shot.aim) else {
        return;
    };

    let id = *next_projectile_id;
    *next_projectile_id += 1;

    world.spawn((
        Projectile {
            id,
            tower_id: shot.tower_id,
            direction,
            speed: shot.weapon.projectile_speed,
            damage: shot.weapon.projectile_damage,
            remaining_lifetime_secs: shot.weapon.projectile_lifetime_secs,
        },
        shot.origin,
    ));

    trace!(tower = shot.tower_id, target = shot.target_id, projectile = id, "fired");
    events.push(SimEvent::ProjectileFired {
        tower_id: shot.tower_id,
        target_id: shot.target_id,
        position: shot.origin,
    });
}
