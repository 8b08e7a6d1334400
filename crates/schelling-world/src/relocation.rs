//! Occupancy indices and the relocation move.
//!
//! An [`OccupancyIndex`] pairs two coordinate lists that together partition
//! the lattice interior:
//!
//! - **positions**: one entry per agent. An agent's slot in this list is its
//!   identity for the whole trial; relocation rewrites the coordinate in
//!   place and never reorders the list.
//! - **vacancies**: one entry per empty cell, in no meaningful order.
//!
//! [`relocate`] swaps an agent's coordinate with a uniformly chosen vacancy
//! and keeps the lattice, both lists, and the halo consistent.

use rand::Rng;
use schelling_types::{Cell, Coord};
use tracing::trace;

use crate::error::WorldError;
use crate::lattice::Lattice;

/// Agent positions and vacant cells of a lattice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OccupancyIndex {
    /// Interior coordinate of each agent, indexed by agent id.
    positions: Vec<Coord>,
    /// Interior coordinate of each empty cell.
    vacancies: Vec<Coord>,
}

impl OccupancyIndex {
    /// Build both indices from a full scan of the padded storage, cropped
    /// to the interior. Agent ids follow row-major order.
    pub fn from_lattice(lattice: &Lattice) -> Self {
        let positions = lattice.crop_to_interior(lattice.padded_positions(Cell::is_occupied));
        let vacancies = lattice.crop_to_interior(lattice.padded_positions(|c| c == Cell::Empty));
        Self {
            positions,
            vacancies,
        }
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of empty cells.
    pub fn vacancy_count(&self) -> usize {
        self.vacancies.len()
    }

    /// Current coordinate of `agent`.
    pub fn position(&self, agent: usize) -> Option<Coord> {
        self.positions.get(agent).copied()
    }

    /// All agent coordinates, indexed by agent id.
    pub fn positions(&self) -> &[Coord] {
        &self.positions
    }

    /// All empty-cell coordinates.
    pub fn vacancies(&self) -> &[Coord] {
        &self.vacancies
    }
}

/// Move `agent` to a uniformly random empty cell.
///
/// The agent's state is written at the destination and its origin is
/// cleared; the chosen vacancy slot then records the origin and the
/// agent's position slot records the destination. The halo is resynced
/// before returning. Returns the destination coordinate.
///
/// # Errors
///
/// Returns [`WorldError::AgentOutOfRange`] if `agent` has no slot,
/// [`WorldError::NoEmptyCells`] if there is no vacancy to move into, and
/// [`WorldError::CoordOutOfRange`] if the index disagrees with the lattice.
pub fn relocate<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    index: &mut OccupancyIndex,
    agent: usize,
    rng: &mut R,
) -> Result<Coord, WorldError> {
    let population = index.positions.len();
    let position = index
        .positions
        .get_mut(agent)
        .ok_or(WorldError::AgentOutOfRange { agent, population })?;
    let origin = *position;

    if index.vacancies.is_empty() {
        return Err(WorldError::NoEmptyCells);
    }

    let side = lattice.side();
    let state = lattice
        .get(origin)
        .ok_or_else(|| out_of_range(origin, side))?;

    let slot = rng.random_range(0..index.vacancies.len());
    let vacancy = index
        .vacancies
        .get_mut(slot)
        .ok_or(WorldError::NoEmptyCells)?;
    let destination = *vacancy;
    if lattice.get(destination).is_none() {
        return Err(out_of_range(destination, side));
    }

    // Both coordinates are in range, so neither write below can fail.
    lattice.set(destination, state)?;
    lattice.set(origin, Cell::Empty)?;
    *vacancy = origin;
    *position = destination;
    lattice.resync_halo();

    trace!(agent, ?origin, ?destination, "Agent relocated");
    Ok(destination)
}

const fn out_of_range(coord: Coord, side: usize) -> WorldError {
    WorldError::CoordOutOfRange {
        row: coord.row,
        col: coord.col,
        side,
    }
}
