//! Satisfaction index and the unhappy predicate.
//!
//! Both functions are evaluated once per agent per tick and are the hot path
//! of the simulation. They borrow the lattice, allocate nothing, and rely on
//! the halo so the neighborhood is a plain rectangle.
//!
//! # Satisfaction index
//!
//! For an agent at `coord` with neighborhood radius `r`, let the window be
//! the `(2r + 1)^2` square centred on it. Then
//!
//! - `occupied` = non-empty cells in the window, minus the agent itself
//! - `same` = cells in the window matching the agent's state, minus itself
//!
//! and the index is `same / occupied`, or `0` when `occupied == 0`. An agent
//! with no neighbors is at minimum satisfaction, not undefined.
//!
//! # Unhappiness
//!
//! An agent is unhappy when its index is strictly below its threshold. With
//! a threshold of exactly `0` an isolated agent (index `0`) is happy.

use schelling_types::{Cell, Coord};

use crate::lattice::Lattice;

/// Satisfaction index of the agent at `coord` for the given radius.
///
/// Returns `0.0` for an empty or out-of-range cell.
#[inline]
pub fn satisfaction(lattice: &Lattice, coord: Coord, radius: usize) -> f64 {
    let Some(own) = lattice.get(coord) else {
        return 0.0;
    };
    if own == Cell::Empty {
        return 0.0;
    }

    let mut occupied: u32 = 0;
    let mut same: u32 = 0;
    for cell in lattice.window(coord, radius) {
        if cell.is_occupied() {
            occupied = occupied.saturating_add(1);
        }
        if cell == own {
            same = same.saturating_add(1);
        }
    }

    // The centre cell counts towards both tallies.
    let occupied = occupied.saturating_sub(1);
    let same = same.saturating_sub(1);
    if occupied == 0 {
        return 0.0;
    }
    f64::from(same) / f64::from(occupied)
}

/// Whether the agent at `coord` falls strictly below `threshold`.
#[inline]
pub fn is_unhappy(lattice: &Lattice, coord: Coord, threshold: f64, radius: usize) -> bool {
    satisfaction(lattice, coord, radius) < threshold
}
