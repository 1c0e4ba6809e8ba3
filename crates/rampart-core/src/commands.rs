//! Player commands sent from the UI/input layer to the simulation.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::Position;

/// All possible player actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Match ---
    /// Start a new match (or restart a finished one).
    StartMatch,
    /// Start the prepared round.
    StartRound,

    // --- Placement ---
    /// Buy a tower and enter placement preview.
    StartPlacingTower { kind: TowerKind },
    /// Result of the pointer raycast against the ground, if it hit anything.
    PointerMoved { point: Option<Position> },
    /// Commit the preview at its current (legal) position.
    CommitPlacement,
    /// Abort the preview and refund its cost.
    CancelPlacement,

    // --- Selling ---
    StartSellMode,
    ExitSellMode,
    /// Result of the pointer raycast against towers.
    HoverTower { tower_id: Option<u32> },
    SellHoveredTower,

    // --- Simulation control ---
    /// Set time scale (1.0 = normal, 2.0 = double).
    SetTimeScale { scale: f64 },
    Pause,
    Resume,
}
