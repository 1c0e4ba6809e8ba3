//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Game logic lives in the simulation systems, not here.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::ZoneShape;

/// Marks an entity as an enemy. `id` is the stable handle towers use to
/// refer to it; a stale id simply resolves to nothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
}

/// Combat and economy stats of a spawned enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyStats {
    pub health: f64,
    pub max_health: f64,
    /// World units per time unit.
    pub move_speed: f64,
    /// Paid to the player when killed.
    pub money_on_kill: u32,
    /// Dealt to the player when it leaks.
    pub damage_on_reach_end: u32,
}

/// Cursor into the level's waypoint path.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PathFollower {
    /// Index of the waypoint currently being walked toward.
    pub waypoint: usize,
}

/// Enemy lifecycle latch. Leaves `Alive` at most once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lifecycle {
    pub phase: EnemyPhase,
    pub cause: Option<TerminalCause>,
    /// Remaining death-effect time before the entity is removed.
    pub removal_in_secs: f64,
}

/// Spherical collision volume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f64,
}

/// Marks an entity as a placed tower.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tower {
    pub id: u32,
    pub kind: TowerKind,
    /// Price paid; the sale refund is derived from this.
    pub cost: u32,
    /// Radius of the tower's own no-build footprint.
    pub footprint_radius: f64,
}

/// Immutable weapon parameters, fixed at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weapon {
    pub attack_range: f64,
    /// Shots per time unit.
    pub fire_rate: f64,
    pub projectile_speed: f64,
    pub projectile_damage: f64,
    pub projectile_lifetime_secs: f64,
}

/// Mutable targeting state of a tower.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FireControl {
    /// Enemy id of the current target, re-validated every use.
    pub target: Option<u32>,
    /// Earliest simulation time the next shot may leave.
    pub next_fire_time: f64,
}

/// A projectile in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Tower that fired it.
    pub tower_id: u32,
    /// Unit vector.
    pub direction: DVec3,
    pub speed: f64,
    pub damage: f64,
    pub remaining_lifetime_secs: f64,
}

/// A region where towers may never be placed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoBuildZone {
    pub shape: ZoneShape,
}
