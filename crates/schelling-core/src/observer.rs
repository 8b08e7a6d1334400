//! Observation hooks for the simulation driver.
//!
//! The driver calls a [`TickObserver`] once after each trial's Init phase
//! and once after every tick. Observers only read the lattice; they cannot
//! influence convergence or statistics.

use schelling_types::GridSnapshot;
use schelling_world::Lattice;

/// Callback invoked at trial start and after each tick.
pub trait TickObserver {
    /// Called once the trial's starting layout is in place.
    fn on_init(&mut self, trial: u32, lattice: &Lattice);

    /// Called after tick number `tick` (1-based) of `trial` completes.
    fn on_tick(&mut self, trial: u32, tick: u64, lattice: &Lattice);
}

/// An observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl TickObserver for NoOpObserver {
    fn on_init(&mut self, _trial: u32, _lattice: &Lattice) {}

    fn on_tick(&mut self, _trial: u32, _tick: u64, _lattice: &Lattice) {}
}

/// Records a copy of the lattice interior after init and every tick.
///
/// Snapshots are append-only and ordered by capture time; each carries its
/// trial and tick so a multi-trial run can be split afterwards.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    snapshots: Vec<GridSnapshot>,
}

impl SnapshotRecorder {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }

    /// All snapshots captured so far.
    pub fn snapshots(&self) -> &[GridSnapshot] {
        &self.snapshots
    }

    /// Consume the recorder, returning its snapshots.
    pub fn into_snapshots(self) -> Vec<GridSnapshot> {
        self.snapshots
    }

    /// Snapshots belonging to one trial, in tick order.
    pub fn trial(&self, trial: u32) -> impl Iterator<Item = &GridSnapshot> {
        self.snapshots.iter().filter(move |s| s.trial == trial)
    }

    /// Number of snapshots captured.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn capture(&mut self, trial: u32, tick: u64, lattice: &Lattice) {
        self.snapshots.push(GridSnapshot {
            trial,
            tick,
            side: lattice.side(),
            cells: lattice.interior(),
        });
    }
}

impl TickObserver for SnapshotRecorder {
    fn on_init(&mut self, trial: u32, lattice: &Lattice) {
        self.capture(trial, 0, lattice);
    }

    fn on_tick(&mut self, trial: u32, tick: u64, lattice: &Lattice) {
        self.capture(trial, tick, lattice);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use schelling_types::Cell;

    use super::*;

    #[test]
    fn recorder_captures_interior_only() {
        let layout = [
            Cell::GroupA,
            Cell::Empty,
            Cell::Empty,
            Cell::GroupB,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::GroupA,
        ];
        let lattice = Lattice::from_interior(3, 1, &layout).unwrap();
        let mut recorder = SnapshotRecorder::new();

        recorder.on_init(0, &lattice);
        recorder.on_tick(0, 1, &lattice);
        recorder.on_init(1, &lattice);

        assert_eq!(recorder.len(), 3);
        let first = recorder.snapshots().first().unwrap();
        assert_eq!(first.side, 3);
        assert_eq!(first.cells, layout.to_vec());
        assert_eq!(first.tick, 0);
        assert_eq!(recorder.trial(0).map(|s| s.tick).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(recorder.trial(1).count(), 1);
    }

    #[test]
    fn no_op_observer_is_inert() {
        let lattice = Lattice::from_interior(3, 1, &[Cell::Empty; 9]).unwrap();
        let mut observer = NoOpObserver;
        observer.on_init(0, &lattice);
        observer.on_tick(0, 1, &lattice);
    }
}
