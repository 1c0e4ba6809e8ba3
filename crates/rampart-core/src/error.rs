//! Error types.
//!
//! `RampartError` covers configuration problems found while loading or
//! validating a match. `Rejection` covers player operations that are refused
//! without changing any state; those never abort the match.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::enums::{EnemyKind, TowerKind};

pub type RampartResult<T> = Result<T, RampartError>;

#[derive(Debug, thiserror::Error)]
pub enum RampartError {
    #[error("failed to read match config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid match config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("match config defines no waves")]
    NoWaves,

    #[error("wave {wave} has no enemy groups")]
    EmptyWave { wave: usize },

    #[error("wave {wave} group {group} has count 0")]
    EmptyGroup { wave: usize, group: usize },

    #[error("enemy path needs at least 2 waypoints, got {0}")]
    PathTooShort(usize),

    #[error("no stats configured for enemy kind {0:?}")]
    MissingEnemy(EnemyKind),

    #[error("no towers configured")]
    NoTowers,

    #[error("refund percentage {0} outside [0, 1]")]
    RefundOutOfRange(f64),

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// An invalid player operation. Refused with no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Rejection {
    #[error("not enough money (need {cost}, have {money})")]
    InsufficientMoney { cost: u32, money: u32 },

    #[error("already placing a tower")]
    AlreadyPlacing,

    #[error("not placing a tower")]
    NotPlacing,

    #[error("tower cannot be placed here")]
    IllegalPlacement,

    #[error("a round is already active")]
    RoundAlreadyActive,

    #[error("no round is ready to start")]
    RoundNotReady,

    #[error("no tower under the pointer")]
    NothingHovered,

    #[error("sell mode is not active")]
    NotSelling,

    #[error("the match is not running")]
    MatchOver,

    #[error("match already in progress")]
    MatchInProgress,

    #[error("tower kind {0:?} is not configured")]
    UnknownTowerKind(TowerKind),
}
