//! Simulation engine for Rampart.
//!
//! Owns the hecs ECS world, runs systems at a fixed tick rate,
//! and produces GameStateSnapshots for the frontend.

pub mod context;
pub mod economy;
pub mod enemy;
pub mod engine;
pub mod placement;
pub mod spatial;
pub mod systems;
pub mod world_setup;

pub use engine::{SimConfig, SimulationEngine};
pub use rampart_core as core;

#[cfg(test)]
mod tests;
