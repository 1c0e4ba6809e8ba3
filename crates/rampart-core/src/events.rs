//! Events emitted by the simulation for visual, audio and UI feedback.
//!
//! Fire-and-forget: nothing the collaborators do with them feeds back into
//! the simulation.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::error::Rejection;
use crate::types::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// A round is prepared; show the "start round" affordance.
    RoundReady { round: u32, enemies: u32 },
    RoundStarted { round: u32 },
    /// All enemies of the round are gone.
    RoundCleared { round: u32 },

    EnemySpawned {
        enemy_id: u32,
        kind: EnemyKind,
        position: Position,
    },
    EnemyKilled {
        enemy_id: u32,
        kind: EnemyKind,
        reward: u32,
        position: Position,
    },
    EnemyLeaked { enemy_id: u32, damage: u32 },
    /// Death effect finished; the entity is gone.
    EnemyRemoved { enemy_id: u32 },

    ProjectileFired {
        tower_id: u32,
        target_id: u32,
        position: Position,
    },
    ProjectileHit {
        projectile_id: u32,
        enemy_id: u32,
        damage: f64,
    },
    ProjectileExpired { projectile_id: u32 },

    PlacementStarted { kind: TowerKind, cost: u32 },
    PlacementCancelled { kind: TowerKind, refund: u32 },
    TowerPlaced {
        tower_id: u32,
        kind: TowerKind,
        position: Position,
    },
    TowerSold { tower_id: u32, refund: u32 },
    ModeChanged { mode: InteractionMode },

    PlayerDamaged { amount: u32, health: u32 },
    GameOver { won: bool },

    /// Transient message for a refused operation.
    Notice { rejection: Rejection, message: String },
}

impl SimEvent {
    pub fn notice(rejection: Rejection) -> Self {
        SimEvent::Notice {
            message: rejection.to_string(),
            rejection,
        }
    }
}
