//! Types shared between the runner's main thread and the game loop thread.

use rampart_core::commands::PlayerCommand;

/// Commands sent from the main thread to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player command to forward to the simulation engine.
    PlayerCommand(PlayerCommand),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// How the game loop paces and ends itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    /// Sleep between ticks so one simulated second takes one wall-clock
    /// second (divided by the engine's time scale). Off = run flat out.
    pub realtime: bool,
    /// Stop after this many ticks. `None` runs until the match ends.
    pub max_ticks: Option<u64>,
    /// Stop as soon as the match reaches Victory or Defeat.
    pub stop_on_game_over: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            realtime: false,
            max_ticks: None,
            stop_on_game_over: true,
        }
    }
}

/// Why the game loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Shutdown,
    /// Every receiver or sender on the other side went away.
    Disconnected,
    MaxTicks,
    GameOver { won: bool },
}
