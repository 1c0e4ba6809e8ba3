//! Game state snapshot: the complete visible state handed to the UI each tick.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::SimEvent;
use crate::types::{Position, SimTime};

/// Complete game state produced after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub time: SimTime,
    pub phase: RoundPhase,
    pub paused: bool,
    pub economy: EconomyView,
    pub round: RoundView,
    pub interaction: InteractionView,
    pub enemies: Vec<EnemyView>,
    pub towers: Vec<TowerView>,
    pub projectiles: Vec<ProjectileView>,
    /// Events emitted during this tick, in emission order.
    pub events: Vec<SimEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyView {
    pub health: u32,
    pub money: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    /// 1-based; 0 before the first round is prepared.
    pub current_round: u32,
    pub wave_count: u32,
    pub enemies_remaining: u32,
    /// Enemies of the current wave not spawned yet.
    pub pending_spawns: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionView {
    pub mode: InteractionMode,
    /// Tower kind being previewed (Placing only).
    pub preview_kind: Option<TowerKind>,
    /// Preview position; follows the pointer regardless of legality.
    pub preview_position: Option<Position>,
    pub preview_legal: bool,
    /// Tower under the pointer (Selling only).
    pub hovered_tower: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyView {
    pub enemy_id: u32,
    pub kind: EnemyKind,
    pub position: Position,
    pub health: f64,
    pub max_health: f64,
    pub phase: EnemyPhase,
    pub waypoint: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerView {
    pub tower_id: u32,
    pub kind: TowerKind,
    pub position: Position,
    pub attack_range: f64,
    pub target: Option<u32>,
    /// What selling this tower would pay out.
    pub sell_value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileView {
    pub projectile_id: u32,
    pub position: Position,
    pub remaining_lifetime_secs: f64,
}
