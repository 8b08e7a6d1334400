//! End-to-end scenarios for the simulation driver.
//!
//! These tests run whole trials through the public API and check the
//! properties that must hold at every tick: conserved populations, a halo
//! that mirrors the wrapped interior, and seed-determined results.

#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::cast_precision_loss
)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use schelling_core::driver::{DriverError, DriverOptions, LayoutPolicy, SimulationDriver};
use schelling_core::observer::{SnapshotRecorder, TickObserver};
use schelling_types::{Cell, Coord, ModelParams};
use schelling_world::{Lattice, WorldError};

/// Observer asserting lattice invariants after init and every tick.
struct InvariantChecker {
    expected_a: usize,
    expected_b: usize,
    checks: u64,
}

impl InvariantChecker {
    fn check(&mut self, lattice: &Lattice) {
        let side = lattice.side();
        let counts = lattice.counts();
        assert_eq!(counts.group_a, self.expected_a);
        assert_eq!(counts.group_b, self.expected_b);
        assert_eq!(counts.total(), side * side);

        let p = lattice.padding();
        for row in 0..lattice.stride() {
            for col in 0..lattice.stride() {
                let wrapped = Coord::new((row + side - p) % side, (col + side - p) % side);
                assert_eq!(lattice.get_padded(row, col), lattice.get(wrapped));
            }
        }
        self.checks += 1;
    }
}

impl TickObserver for InvariantChecker {
    fn on_init(&mut self, _trial: u32, lattice: &Lattice) {
        self.check(lattice);
    }

    fn on_tick(&mut self, _trial: u32, _tick: u64, lattice: &Lattice) {
        self.check(lattice);
    }
}

fn run_recorded(params: &ModelParams, seed: u64, trials: u32) -> (f64, f64, SnapshotRecorder) {
    let mut driver = SimulationDriver::new(params.clone(), StdRng::seed_from_u64(seed)).unwrap();
    let mut recorder = SnapshotRecorder::new();
    let summary = driver.simulate_with(trials, &mut recorder).unwrap();
    (summary.average_ticks, summary.average_satisfaction, recorder)
}

#[test]
fn invariants_hold_every_tick() {
    let params = ModelParams::from_pairs(24, (200, 200), (0.4, 0.4), (1, 2));
    let mut driver = SimulationDriver::new(params, StdRng::seed_from_u64(99)).unwrap();
    let mut checker = InvariantChecker {
        expected_a: 200,
        expected_b: 200,
        checks: 0,
    };

    let summary = driver.simulate_with(2, &mut checker).unwrap();

    let total_ticks: u64 = summary.per_trial.iter().map(|t| t.ticks).sum();
    assert_eq!(checker.checks, total_ticks + 2);
    assert!(driver.is_converged());
}

#[test]
fn seeded_runs_are_reproducible() {
    let params = ModelParams::from_pairs(16, (90, 90), (0.5, 0.3), (1, 1));

    let (ticks_a, sni_a, rec_a) = run_recorded(&params, 2024, 3);
    let (ticks_b, sni_b, rec_b) = run_recorded(&params, 2024, 3);

    assert_eq!(ticks_a, ticks_b);
    assert_eq!(sni_a, sni_b);
    assert_eq!(rec_a.snapshots(), rec_b.snapshots());
}

#[test]
fn snapshots_cover_init_and_every_tick() {
    let params = ModelParams::from_pairs(16, (90, 90), (0.5, 0.5), (1, 1));
    let mut driver = SimulationDriver::new(params, StdRng::seed_from_u64(5)).unwrap();
    let mut recorder = SnapshotRecorder::new();

    let stats = driver.run_trial(0, &mut recorder).unwrap();

    let ticks: Vec<u64> = recorder.trial(0).map(|s| s.tick).collect();
    let expected: Vec<u64> = (0..=stats.ticks).collect();
    assert_eq!(ticks, expected);

    let last = recorder.snapshots().last().unwrap();
    assert_eq!(last.cells, driver.lattice().interior());
    for snapshot in recorder.snapshots() {
        assert_eq!(snapshot.side, 16);
        assert_eq!(snapshot.cells.len(), 256);
        assert_eq!(snapshot.count(Cell::Empty), 256 - 180);
    }
}

#[test]
fn zero_thresholds_never_relocate() {
    let params = ModelParams::from_pairs(4, (2, 2), (0.0, 0.0), (1, 1));
    let (ticks, sni, recorder) = run_recorded(&params, 1, 1);

    assert_eq!(ticks, 0.0);
    assert!((0.0..=1.0).contains(&sni));
    assert_eq!(recorder.len(), 1);
}

#[test]
fn averages_match_per_trial_results() {
    let params = ModelParams::from_pairs(14, (70, 70), (0.4, 0.4), (1, 1));
    let options = DriverOptions {
        layout_policy: LayoutPolicy::Reshuffle,
        soft_tick_cap: None,
    };
    let mut driver =
        SimulationDriver::with_options(params, StdRng::seed_from_u64(12), options).unwrap();

    let summary = driver.simulate(4).unwrap();

    assert_eq!(summary.trials, 4);
    assert_eq!(summary.per_trial.len(), 4);
    let ticks: u64 = summary.per_trial.iter().map(|t| t.ticks).sum();
    let sni: f64 = summary.per_trial.iter().map(|t| t.mean_satisfaction).sum();
    assert!((summary.average_ticks - ticks as f64 / 4.0).abs() < 1e-12);
    assert!((summary.average_satisfaction - sni / 4.0).abs() < 1e-12);
}

#[test]
fn full_lattice_policy() {
    // 50 + 50 fills a 10x10 lattice exactly: accepted at construction.
    let content = ModelParams::from_pairs(10, (50, 50), (0.0, 0.0), (1, 1));
    let mut driver = SimulationDriver::new(content, StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(driver.index().vacancy_count(), 0);
    assert_eq!(driver.simulate(1).unwrap().average_ticks, 0.0);

    // Any unhappy agent then has nowhere to go.
    let demanding = ModelParams::from_pairs(10, (50, 50), (0.9, 0.9), (1, 1));
    let mut driver = SimulationDriver::new(demanding, StdRng::seed_from_u64(3)).unwrap();
    assert!(matches!(
        driver.simulate(1),
        Err(DriverError::World {
            source: WorldError::NoEmptyCells
        })
    ));

    // One agent too many is a configuration error.
    let overfull = ModelParams::from_pairs(10, (51, 50), (0.0, 0.0), (1, 1));
    assert!(matches!(
        SimulationDriver::new(overfull, StdRng::seed_from_u64(3)),
        Err(DriverError::World {
            source: WorldError::Configuration { .. }
        })
    ));
}
