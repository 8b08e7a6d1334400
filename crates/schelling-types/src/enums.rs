//! Enumeration types for the Schelling simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Cell state
// ---------------------------------------------------------------------------

/// The state of a single lattice cell.
///
/// `Empty` is a real state, not the absence of one: vacancies are tracked
/// and relocated into just like occupied cells are tracked and moved.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Cell {
    /// A vacant cell.
    #[default]
    Empty,
    /// A cell occupied by an agent of group A.
    GroupA,
    /// A cell occupied by an agent of group B.
    GroupB,
}

impl Cell {
    /// Return the group occupying this cell, or `None` when it is empty.
    pub const fn group(self) -> Option<Group> {
        match self {
            Self::Empty => None,
            Self::GroupA => Some(Group::A),
            Self::GroupB => Some(Group::B),
        }
    }

    /// Whether an agent occupies this cell.
    pub const fn is_occupied(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

// ---------------------------------------------------------------------------
// Agent group
// ---------------------------------------------------------------------------

/// One of the two agent populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Group {
    /// First population.
    A,
    /// Second population.
    B,
}

impl Group {
    /// Both groups, in canonical order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// The cell state an agent of this group occupies.
    pub const fn cell(self) -> Cell {
        match self {
            Self::A => Cell::GroupA,
            Self::B => Cell::GroupB,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_default_and_unoccupied() {
        assert_eq!(Cell::default(), Cell::Empty);
        assert!(!Cell::Empty.is_occupied());
        assert_eq!(Cell::Empty.group(), None);
    }

    #[test]
    fn group_cell_conversion_is_consistent() {
        for group in Group::ALL {
            assert!(group.cell().is_occupied());
            assert_eq!(group.cell().group(), Some(group));
        }
    }

    #[test]
    fn cell_serializes_as_variant_name() {
        let json = serde_json::to_string(&Cell::GroupB).ok();
        assert_eq!(json.as_deref(), Some("\"GroupB\""));
    }
}
