//! Core types and definitions for the Rampart simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, commands, snapshots, events, match configuration, errors
//! and constants. It has no dependency on the ECS world or any runtime.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use error::{RampartError, RampartResult, Rejection};
