//! The padded toroidal lattice.
//!
//! The logical grid is a `side x side` torus. It is stored as a
//! `(side + 2p) x (side + 2p)` row-major array whose outer `p`-wide border
//! (the halo) holds copies of the opposite interior edges, so that any
//! neighborhood window of radius `<= p` around an interior cell can be read
//! as a plain rectangle without wrap-around arithmetic.
//!
//! # Halo layout
//!
//! ```text
//!        p      side       p
//!      +---+-----------+---+
//!    p | C |     T     | C |
//!      +---+-----------+---+
//!      |   |           |   |
//! side | L |  interior | R |
//!      |   |           |   |
//!      +---+-----------+---+
//!    p | C |     B     | C |
//!      +---+-----------+---+
//! ```
//!
//! `L`/`R` are refreshed from the opposite interior columns first, then the
//! full-width `T`/`B` bands are refreshed from the opposite padded rows,
//! which fills the four corners `C` in the same pass.
//!
//! The halo is only valid after [`Lattice::resync_halo`]; every mutation in
//! this crate resyncs before returning.

use rand::Rng;
use rand::seq::SliceRandom;
use schelling_types::{Cell, Coord, ModelParams};

use crate::error::WorldError;
use crate::params;

/// Per-state cell tallies over the lattice interior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    /// Vacant cells.
    pub empty: usize,
    /// Cells occupied by group A.
    pub group_a: usize,
    /// Cells occupied by group B.
    pub group_b: usize,
}

impl CellCounts {
    /// Total number of interior cells counted.
    pub const fn total(&self) -> usize {
        self.empty
            .saturating_add(self.group_a)
            .saturating_add(self.group_b)
    }
}

/// A square toroidal lattice stored with a wrap-around halo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    /// Interior side length.
    side: usize,
    /// Halo width on every edge.
    padding: usize,
    /// Padded row length, `side + 2 * padding`.
    stride: usize,
    /// Row-major padded storage, `stride * stride` cells.
    cells: Vec<Cell>,
}

impl Lattice {
    /// Build a lattice with a uniformly random arrangement of the
    /// populations in `params`; the remaining cells are empty.
    ///
    /// The halo width is the largest radius of the two groups.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Configuration`] if `params` fail validation.
    pub fn random<R: Rng + ?Sized>(params: &ModelParams, rng: &mut R) -> Result<Self, WorldError> {
        params::validate(params)?;

        let area = params
            .side
            .checked_mul(params.side)
            .ok_or(WorldError::ArithmeticOverflow)?;
        let group_a = usize::try_from(params.group_a.population)
            .map_err(|_err| WorldError::ArithmeticOverflow)?;
        let group_b = usize::try_from(params.group_b.population)
            .map_err(|_err| WorldError::ArithmeticOverflow)?;
        let empty = area
            .checked_sub(group_a)
            .and_then(|rest| rest.checked_sub(group_b))
            .ok_or(WorldError::ArithmeticOverflow)?;

        let mut interior = Vec::with_capacity(area);
        interior.extend(std::iter::repeat_n(Cell::Empty, empty));
        interior.extend(std::iter::repeat_n(Cell::GroupB, group_b));
        interior.extend(std::iter::repeat_n(Cell::GroupA, group_a));
        interior.shuffle(rng);

        Self::from_interior(params.side, params.padding(), &interior)
    }

    /// Build a lattice from an explicit row-major interior layout.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Configuration`] if `side` is zero or `padding`
    /// exceeds `side`, and [`WorldError::LayoutSize`] if `interior` does
    /// not hold exactly `side * side` cells.
    pub fn from_interior(
        side: usize,
        padding: usize,
        interior: &[Cell],
    ) -> Result<Self, WorldError> {
        if side == 0 {
            return Err(WorldError::Configuration {
                reason: "side must be at least 1".to_owned(),
            });
        }
        if padding > side {
            return Err(WorldError::Configuration {
                reason: format!("padding {padding} exceeds lattice side {side}"),
            });
        }

        let expected = side.checked_mul(side).ok_or(WorldError::ArithmeticOverflow)?;
        if interior.len() != expected {
            return Err(WorldError::LayoutSize {
                expected,
                actual: interior.len(),
            });
        }

        let stride = padding
            .checked_mul(2)
            .and_then(|halo| halo.checked_add(side))
            .ok_or(WorldError::ArithmeticOverflow)?;
        let total = stride.checked_mul(stride).ok_or(WorldError::ArithmeticOverflow)?;

        let mut lattice = Self {
            side,
            padding,
            stride,
            cells: vec![Cell::Empty; total],
        };

        for (row, source) in interior.chunks_exact(side).enumerate() {
            let start = lattice.offset(row.saturating_add(padding), padding);
            if let Some(target) = lattice.cells.get_mut(start..start.saturating_add(side)) {
                target.copy_from_slice(source);
            }
        }

        lattice.resync_halo();
        Ok(lattice)
    }

    /// Interior side length.
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Halo width.
    pub const fn padding(&self) -> usize {
        self.padding
    }

    /// Padded row length.
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// State of the interior cell at `coord`, or `None` when out of range.
    pub fn get(&self, coord: Coord) -> Option<Cell> {
        if coord.row >= self.side || coord.col >= self.side {
            return None;
        }
        let idx = self.offset(
            coord.row.saturating_add(self.padding),
            coord.col.saturating_add(self.padding),
        );
        self.cells.get(idx).copied()
    }

    /// State of the padded cell at `(row, col)`, halo included.
    pub fn get_padded(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.stride || col >= self.stride {
            return None;
        }
        self.cells.get(self.offset(row, col)).copied()
    }

    /// Overwrite an interior cell. The halo is left stale; callers must
    /// resync before the next neighborhood read.
    pub(crate) fn set(&mut self, coord: Coord, cell: Cell) -> Result<(), WorldError> {
        if coord.row >= self.side || coord.col >= self.side {
            return Err(WorldError::CoordOutOfRange {
                row: coord.row,
                col: coord.col,
                side: self.side,
            });
        }
        let idx = self.offset(
            coord.row.saturating_add(self.padding),
            coord.col.saturating_add(self.padding),
        );
        let slot = self.cells.get_mut(idx).ok_or(WorldError::CoordOutOfRange {
            row: coord.row,
            col: coord.col,
            side: self.side,
        })?;
        *slot = cell;
        Ok(())
    }

    /// Refresh every halo cell from the interior cell it wraps to.
    ///
    /// Idempotent: a second call without an intervening mutation leaves
    /// the storage unchanged.
    // All ranges stay inside `cells` because `padding <= side` and
    // `stride = side + 2 * padding`, both checked at construction.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn resync_halo(&mut self) {
        let (side, p, stride) = (self.side, self.padding, self.stride);
        if p == 0 {
            return;
        }

        // Left and right bands of the interior rows.
        for row in p..p + side {
            let base = row * stride;
            // left halo <- last `p` interior columns
            self.cells.copy_within(base + side..base + side + p, base);
            // right halo <- first `p` interior columns
            self.cells
                .copy_within(base + p..base + 2 * p, base + p + side);
        }

        // Top and bottom bands, full width, corners included.
        for row in 0..p {
            let source = (row + side) * stride;
            self.cells.copy_within(source..source + stride, row * stride);
        }
        for row in p + side..stride {
            let source = (row - side) * stride;
            self.cells.copy_within(source..source + stride, row * stride);
        }
    }

    /// Keep only the padded coordinates whose row and column both fall in
    /// `[padding, padding + side)`, translated to interior coordinates.
    pub fn crop_to_interior<I>(&self, padded: I) -> Vec<Coord>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let bounds = self.padding..self.padding.saturating_add(self.side);
        padded
            .into_iter()
            .filter(|(row, col)| bounds.contains(row) && bounds.contains(col))
            .map(|(row, col)| {
                Coord::new(
                    row.saturating_sub(self.padding),
                    col.saturating_sub(self.padding),
                )
            })
            .collect()
    }

    /// Padded coordinates of every stored cell, halo included, whose state
    /// matches `predicate`, in row-major order.
    pub fn padded_positions<F>(&self, predicate: F) -> impl Iterator<Item = (usize, usize)>
    where
        F: Fn(Cell) -> bool,
    {
        let stride = self.stride.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(move |&(_, &cell)| predicate(cell))
            .map(move |(idx, _)| (idx / stride, idx % stride))
    }

    /// The cells of the `(2r + 1)^2` window centred on `coord`, row by row,
    /// centre included.
    ///
    /// `radius` is clamped to the halo width. An out-of-range `coord`
    /// yields an empty iterator.
    // Bounds follow from `coord < side` and `radius <= padding`.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn window(&self, coord: Coord, radius: usize) -> impl Iterator<Item = Cell> + '_ {
        let radius = radius.min(self.padding);
        let (rows, cols) = if coord.row < self.side && coord.col < self.side {
            let row = coord.row + self.padding;
            let col = coord.col + self.padding;
            (row - radius..=row + radius, col - radius..col + radius + 1)
        } else {
            (1..=0, 0..0)
        };

        rows.flat_map(move |row| {
            let base = row * self.stride;
            self.cells
                .get(base + cols.start..base + cols.end)
                .unwrap_or_default()
                .iter()
                .copied()
        })
    }

    /// Copy of the interior (halo excluded) in row-major order.
    pub fn interior(&self) -> Vec<Cell> {
        let mut out = Vec::with_capacity(self.side.saturating_mul(self.side));
        for row in 0..self.side {
            let start = self.offset(row.saturating_add(self.padding), self.padding);
            if let Some(slice) = self.cells.get(start..start.saturating_add(self.side)) {
                out.extend_from_slice(slice);
            }
        }
        out
    }

    /// Tally the interior cells by state.
    pub fn counts(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        for cell in self.interior() {
            match cell {
                Cell::Empty => counts.empty = counts.empty.saturating_add(1),
                Cell::GroupA => counts.group_a = counts.group_a.saturating_add(1),
                Cell::GroupB => counts.group_b = counts.group_b.saturating_add(1),
            }
        }
        counts
    }

    /// Flat index of a padded coordinate.
    const fn offset(&self, row: usize, col: usize) -> usize {
        row.saturating_mul(self.stride).saturating_add(col)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    /// A 5x5 layout where every cell is distinguishable by position class.
    fn striped(side: usize) -> Vec<Cell> {
        (0..side * side)
            .map(|i| match (i / side + 2 * (i % side)) % 3 {
                0 => Cell::Empty,
                1 => Cell::GroupA,
                _ => Cell::GroupB,
            })
            .collect()
    }

    fn assert_halo_wraps(lattice: &Lattice) {
        let (side, p) = (lattice.side(), lattice.padding());
        for row in 0..lattice.stride() {
            for col in 0..lattice.stride() {
                let wrapped = Coord::new((row + side - p) % side, (col + side - p) % side);
                assert_eq!(
                    lattice.get_padded(row, col),
                    lattice.get(wrapped),
                    "padded ({row}, {col}) should mirror {wrapped:?}"
                );
            }
        }
    }

    #[test]
    fn halo_mirrors_wrapped_interior() {
        for padding in 1..=3 {
            let lattice = Lattice::from_interior(7, padding, &striped(7)).unwrap();
            assert_halo_wraps(&lattice);
        }
    }

    #[test]
    fn halo_follows_mutation_after_resync() {
        let mut lattice = Lattice::from_interior(5, 2, &vec![Cell::Empty; 25]).unwrap();
        lattice.set(Coord::new(0, 4), Cell::GroupA).unwrap();
        lattice.resync_halo();
        assert_halo_wraps(&lattice);
        // Bottom-left corner of the halo wraps to the top-right interior cell.
        assert_eq!(lattice.get_padded(7, 1), Some(Cell::GroupA));
    }

    #[test]
    fn resync_is_idempotent() {
        let mut lattice = Lattice::from_interior(6, 2, &striped(6)).unwrap();
        lattice.resync_halo();
        let once = lattice.clone();
        lattice.resync_halo();
        assert_eq!(lattice, once);
    }

    #[test]
    fn random_layout_respects_populations() {
        let params = ModelParams::from_pairs(12, (30, 40), (0.5, 0.5), (1, 2));
        let mut rng = SmallRng::seed_from_u64(7);
        let lattice = Lattice::random(&params, &mut rng).unwrap();

        let counts = lattice.counts();
        assert_eq!(counts.group_a, 30);
        assert_eq!(counts.group_b, 40);
        assert_eq!(counts.empty, 144 - 70);
        assert_eq!(counts.total(), 144);
        assert_eq!(lattice.padding(), 2);
        assert_halo_wraps(&lattice);
    }

    #[test]
    fn random_layout_is_seed_deterministic() {
        let params = ModelParams::from_pairs(10, (20, 20), (0.5, 0.5), (1, 1));
        let a = Lattice::random(&params, &mut SmallRng::seed_from_u64(3)).unwrap();
        let b = Lattice::random(&params, &mut SmallRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn random_rejects_invalid_params() {
        let params = ModelParams::from_pairs(3, (5, 5), (0.5, 0.5), (1, 1));
        let result = Lattice::random(&params, &mut SmallRng::seed_from_u64(1));
        assert!(matches!(result, Err(WorldError::Configuration { .. })));
    }

    #[test]
    fn from_interior_checks_length() {
        let result = Lattice::from_interior(4, 1, &[Cell::Empty; 15]);
        assert_eq!(
            result,
            Err(WorldError::LayoutSize {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn crop_discards_halo_coordinates() {
        let lattice = Lattice::from_interior(4, 1, &[Cell::Empty; 16]).unwrap();
        let cropped = lattice.crop_to_interior([(0, 0), (1, 1), (4, 4), (5, 2), (2, 5), (3, 2)]);
        assert_eq!(
            cropped,
            vec![Coord::new(0, 0), Coord::new(3, 3), Coord::new(2, 1)]
        );
    }

    #[test]
    fn window_wraps_across_edges() {
        let mut interior = vec![Cell::Empty; 25];
        interior[0] = Cell::GroupA;
        let lattice = Lattice::from_interior(5, 1, &interior).unwrap();

        let window: Vec<Cell> = lattice.window(Coord::new(4, 4), 1).collect();
        assert_eq!(window.len(), 9);
        // (0, 0) is the south-east neighbour of (4, 4) on the torus.
        assert_eq!(window[8], Cell::GroupA);
        assert_eq!(window.iter().filter(|c| c.is_occupied()).count(), 1);
    }

    #[test]
    fn window_clamps_radius_and_rejects_outside_coords() {
        let lattice = Lattice::from_interior(5, 1, &[Cell::GroupB; 25]).unwrap();
        assert_eq!(lattice.window(Coord::new(2, 2), 3).count(), 9);
        assert_eq!(lattice.window(Coord::new(5, 0), 1).count(), 0);
    }

    #[test]
    fn interior_round_trips_layout() {
        let layout = striped(5);
        let lattice = Lattice::from_interior(5, 2, &layout).unwrap();
        assert_eq!(lattice.interior(), layout);
    }
}
