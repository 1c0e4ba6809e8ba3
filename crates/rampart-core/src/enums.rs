//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Enemy archetype. Stats live in the match's enemy catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline walker.
    Grunt,
    /// Fast, fragile.
    Runner,
    /// Slow, heavily armoured, leaks hard.
    Brute,
}

/// Tower archetype. Stats live in the match's tower catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Medium range, medium rate.
    Cannon,
    /// Long range, slow, heavy hits.
    Sniper,
    /// Short range, high rate, light hits.
    Rapid,
}

/// Round/wave scheduler state (top-level match phase).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No match has been started yet.
    #[default]
    NotStarted,
    /// Round prepared; waiting for the player to start it.
    AwaitingStart,
    /// Spawn sequence running and/or enemies still alive.
    Spawning,
    /// Round cleared; next round is prepared after a delay.
    Intermission,
    /// All waves cleared.
    Victory,
    /// Player health reached zero.
    Defeat,
}

/// Enemy lifecycle phase. `Removed` is represented by despawning the entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyPhase {
    #[default]
    Alive,
    /// Terminal event recorded; waiting out the death effect.
    Dying,
}

/// Why an enemy left the `Alive` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalCause {
    /// Health reached zero.
    Killed,
    /// Walked past the final waypoint.
    Leaked,
}

/// Current player interaction mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Idle,
    Placing,
    Selling,
}

/// Category filter for spatial queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialCategory {
    /// Living enemies (collision volume vs. query sphere).
    Enemy,
    /// No-build zones and existing tower footprints.
    NoBuild,
}

impl RoundPhase {
    /// Victory or Defeat.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundPhase::Victory | RoundPhase::Defeat)
    }

    /// A match is in progress (started and not finished).
    pub fn is_active(self) -> bool {
        !self.is_terminal() && self != RoundPhase::NotStarted
    }
}
