//! Shared type definitions for the Schelling segregation simulation.
//!
//! This crate is the single source of truth for the values that cross crate
//! boundaries: cell states, coordinates, model parameters, grid snapshots and
//! run statistics. Types exported with `ts-rs` feed external snapshot viewers.
//!
//! # Modules
//!
//! - [`enums`] -- Cell states and agent groups
//! - [`structs`] -- Coordinates, parameters, snapshots and statistics

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Cell, Group};
pub use structs::{
    Coord, DEFAULT_SIDE, GridSnapshot, GroupParams, ModelParams, SimulationSummary, TrialStats,
};
