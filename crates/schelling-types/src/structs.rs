//! Core value structs for the Schelling simulation.
//!
//! Parameters describe a model before it runs; snapshots and statistics
//! describe what a run produced. None of these types carry behavior beyond
//! simple derived queries.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Cell, Group};

/// Default lattice side length.
pub const DEFAULT_SIDE: usize = 100;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// An interior lattice coordinate, `0 <= row, col < side`.
///
/// Coordinates never point into the halo; translation to padded storage is
/// the lattice's concern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Coord {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl Coord {
    /// Create a coordinate from a row and column.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Per-group model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupParams {
    /// Number of agents of this group.
    #[serde(default = "default_population")]
    pub population: u32,

    /// Minimum satisfaction index required to be happy. Expected in
    /// `[0, 1]` but not enforced.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Chebyshev radius of the neighborhood window (at least 1).
    #[serde(default = "default_radius")]
    pub radius: usize,
}

impl GroupParams {
    /// Create group parameters.
    pub const fn new(population: u32, threshold: f64, radius: usize) -> Self {
        Self {
            population,
            threshold,
            radius,
        }
    }
}

impl Default for GroupParams {
    fn default() -> Self {
        Self {
            population: default_population(),
            threshold: default_threshold(),
            radius: default_radius(),
        }
    }
}

/// Full model parameters: lattice side plus both groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Side length `L` of the square lattice.
    #[serde(default = "default_side")]
    pub side: usize,

    /// Parameters of group A.
    #[serde(default)]
    pub group_a: GroupParams,

    /// Parameters of group B.
    #[serde(default)]
    pub group_b: GroupParams,
}

impl ModelParams {
    /// Build parameters from `(A, B)` tuples, mirroring the usual
    /// `sizes`, `thresholds`, `radii` calling convention.
    pub const fn from_pairs(
        side: usize,
        sizes: (u32, u32),
        thresholds: (f64, f64),
        radii: (usize, usize),
    ) -> Self {
        Self {
            side,
            group_a: GroupParams::new(sizes.0, thresholds.0, radii.0),
            group_b: GroupParams::new(sizes.1, thresholds.1, radii.1),
        }
    }

    /// Parameters of the given group.
    pub const fn group(&self, group: Group) -> &GroupParams {
        match group {
            Group::A => &self.group_a,
            Group::B => &self.group_b,
        }
    }

    /// Parameters governing the agent in `cell`, or `None` for an empty cell.
    pub const fn for_cell(&self, cell: Cell) -> Option<&GroupParams> {
        match cell.group() {
            Some(group) => Some(self.group(group)),
            None => None,
        }
    }

    /// Halo width: the largest neighborhood radius of either group.
    pub fn padding(&self) -> usize {
        self.group_a.radius.max(self.group_b.radius)
    }

    /// Combined population of both groups.
    pub fn total_population(&self) -> u64 {
        u64::from(self.group_a.population).saturating_add(u64::from(self.group_b.population))
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            side: default_side(),
            group_a: GroupParams::default(),
            group_b: GroupParams::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A copy of the lattice interior (halo excluded) at one point of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GridSnapshot {
    /// Trial the snapshot belongs to (0-indexed).
    pub trial: u32,
    /// Ticks completed in the trial when captured; 0 is the initial layout.
    pub tick: u64,
    /// Side length of the captured interior.
    pub side: usize,
    /// Row-major `side * side` cell states.
    pub cells: Vec<Cell>,
}

impl GridSnapshot {
    /// Cell state at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.side || col >= self.side {
            return None;
        }
        let idx = row.checked_mul(self.side)?.checked_add(col)?;
        self.cells.get(idx).copied()
    }

    /// Iterate the snapshot row by row.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.side.max(1))
    }

    /// Number of cells in the given state.
    pub fn count(&self, state: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Outcome of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrialStats {
    /// Trial index (0-indexed).
    pub trial: u32,
    /// Ticks needed to reach full happiness.
    pub ticks: u64,
    /// Mean satisfaction index over all agents at convergence.
    pub mean_satisfaction: f64,
    /// Total relocations performed during the trial.
    pub relocations: u64,
    /// Whether the trial ran past the configured soft tick cap.
    pub soft_cap_exceeded: bool,
}

/// Averages across all trials of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationSummary {
    /// Number of trials run.
    pub trials: u32,
    /// Arithmetic mean of ticks-to-convergence.
    pub average_ticks: f64,
    /// Arithmetic mean of the final mean satisfaction index.
    pub average_satisfaction: f64,
    /// Per-trial results, in trial order.
    pub per_trial: Vec<TrialStats>,
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_side() -> usize {
    DEFAULT_SIDE
}

const fn default_population() -> u32 {
    250
}

const fn default_threshold() -> f64 {
    0.8
}

const fn default_radius() -> usize {
    1
}
