//! Lattice geometry, satisfaction, and relocation for the Schelling simulation.
//!
//! This crate owns the mutable world state of a single trial: a toroidal
//! lattice stored with a halo, the occupancy indices that name every agent
//! and vacancy, and the two pure hot-path functions that decide who moves.
//!
//! # Modules
//!
//! - [`error`] -- Error types for world operations.
//! - [`happiness`] -- Satisfaction index and the unhappy predicate.
//! - [`lattice`] -- The padded toroidal grid and halo resynchronisation.
//! - [`params`] -- Construction-time validation of [`ModelParams`].
//! - [`relocation`] -- Occupancy indices and the relocation move.
//!
//! [`ModelParams`]: schelling_types::ModelParams

pub mod error;
pub mod happiness;
pub mod lattice;
pub mod params;
pub mod relocation;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use happiness::{is_unhappy, satisfaction};
pub use lattice::{CellCounts, Lattice};
pub use params::validate;
pub use relocation::{OccupancyIndex, relocate};
