//! Rampart headless runner.
//!
//! Runs the simulation engine on its own thread, feeds it commands from a
//! scripted autopilot and reports what happens through `tracing`.

pub mod autopilot;
pub mod game_loop;
pub mod report;
pub mod state;

pub use rampart_core as core;
