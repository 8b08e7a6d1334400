//! Running a configured simulation and shaping its output.
//!
//! [`run_simulation`] drives every trial from a seeded RNG and returns a
//! [`RunReport`]: the averaged summary plus, when `run.record_snapshots` is
//! set, every captured grid snapshot in capture order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use schelling_core::config::RunConfig;
use schelling_core::driver::SimulationDriver;
use schelling_core::observer::{NoOpObserver, SnapshotRecorder};
use schelling_types::{GridSnapshot, ModelParams, SimulationSummary};
use serde::Serialize;
use tracing::info;

use crate::error::EngineError;

/// Everything the engine prints on stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Averages and per-trial results.
    #[serde(flatten)]
    pub summary: SimulationSummary,

    /// Interior snapshots after init and every tick, tagged with trial and
    /// tick. Absent unless snapshot recording was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<Vec<GridSnapshot>>,
}

/// Build a driver for `model` seeded from `run.seed` and run all trials.
pub fn run_simulation(model: ModelParams, run: &RunConfig) -> Result<RunReport, EngineError> {
    let rng = StdRng::seed_from_u64(run.seed);
    let mut driver = SimulationDriver::with_options(model, rng, run.driver_options())?;

    let params = driver.params();
    let options = driver.options();
    info!(
        side = params.side,
        group_a = params.group_a.population,
        group_b = params.group_b.population,
        threshold_a = params.group_a.threshold,
        threshold_b = params.group_b.threshold,
        radius_a = params.group_a.radius,
        radius_b = params.group_b.radius,
        trials = run.trials,
        seed = run.seed,
        layout_policy = ?options.layout_policy,
        soft_tick_cap = ?options.soft_tick_cap,
        record_snapshots = run.record_snapshots,
        "Run configured"
    );

    if run.record_snapshots {
        let mut recorder = SnapshotRecorder::new();
        let summary = driver.simulate_with(run.trials, &mut recorder)?;
        info!(snapshots = recorder.len(), "Snapshots recorded");
        Ok(RunReport {
            summary,
            snapshots: Some(recorder.into_snapshots()),
        })
    } else {
        let summary = driver.simulate_with(run.trials, &mut NoOpObserver)?;
        Ok(RunReport {
            summary,
            snapshots: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use schelling_types::Cell;

    use super::*;

    fn small_model() -> ModelParams {
        ModelParams::from_pairs(12, (40, 40), (0.4, 0.4), (1, 1))
    }

    fn run_config(trials: u32, record_snapshots: bool) -> RunConfig {
        RunConfig {
            trials,
            seed: 8,
            record_snapshots,
            ..RunConfig::default()
        }
    }

    #[test]
    fn recorded_snapshots_reach_the_report() {
        let report = run_simulation(small_model(), &run_config(2, true)).unwrap();

        let snapshots = report.snapshots.unwrap();
        let ticks: u64 = report.summary.per_trial.iter().map(|t| t.ticks).sum();
        // One snapshot after init plus one per tick, for each trial.
        assert_eq!(snapshots.len() as u64, ticks + 2);
        assert_eq!(snapshots.first().unwrap().tick, 0);
        for snapshot in &snapshots {
            assert_eq!(snapshot.cells.len(), 144);
            assert_eq!(snapshot.count(Cell::GroupA), 40);
        }
    }

    #[test]
    fn snapshots_absent_unless_requested() {
        let report = run_simulation(small_model(), &run_config(1, false)).unwrap();
        assert!(report.snapshots.is_none());

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert!(json.get("snapshots").is_none());
        assert!(json.get("average_ticks").is_some());
        assert!(json.get("per_trial").is_some());
    }

    #[test]
    fn snapshots_serialize_beside_summary() {
        let report = run_simulation(small_model(), &run_config(1, true)).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        let snapshots = json.get("snapshots").unwrap().as_array().unwrap();
        assert_eq!(snapshots.len(), report.snapshots.as_ref().unwrap().len());
        assert_eq!(json.get("trials").unwrap(), 1);
    }

    #[test]
    fn zero_trials_is_a_driver_error() {
        let result = run_simulation(small_model(), &run_config(0, false));
        assert!(matches!(result, Err(EngineError::Driver { .. })));
    }
}
