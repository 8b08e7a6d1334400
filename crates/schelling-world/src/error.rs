//! Error types for the `schelling-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type.

/// Errors that can occur during world operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The model parameters describe a lattice that cannot be built.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// Explanation of what is wrong with the parameters.
        reason: String,
    },

    /// A relocation was requested while the lattice has no vacancy.
    #[error("precondition failed: no empty cells available")]
    NoEmptyCells,

    /// An agent id does not name a slot in the position index.
    #[error("agent {agent} out of range (population {population})")]
    AgentOutOfRange {
        /// The requested agent id.
        agent: usize,
        /// Number of agents in the index.
        population: usize,
    },

    /// A coordinate lies outside the lattice interior.
    #[error("coordinate ({row}, {col}) outside lattice of side {side}")]
    CoordOutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Lattice side length.
        side: usize,
    },

    /// An explicit interior layout has the wrong number of cells.
    #[error("layout has {actual} cells, expected {expected}")]
    LayoutSize {
        /// Cells required for the lattice side.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in lattice calculation")]
    ArithmeticOverflow,
}
