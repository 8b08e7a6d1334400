//! The simulation driver: ticks, convergence, and trial averaging.
//!
//! Each trial walks a three-state machine:
//!
//! 1. **Init** -- reset the lattice to the trial's starting layout (see
//!    [`LayoutPolicy`]) and rebuild the [`OccupancyIndex`] from it.
//! 2. **Ticking** -- repeat [`SimulationDriver::one_tick`] while any agent is
//!    unhappy.
//! 3. **Converged** -- every agent is happy; record ticks and mean
//!    satisfaction.
//!
//! # Ordering
//!
//! A tick visits agents in id order and relocates each unhappy agent
//! immediately. Later agents in the same pass see the lattice as already
//! modified by earlier moves; nothing is snapshotted at tick start. Agent
//! ids are fixed for the whole trial, so the visiting order never changes.
//!
//! # Liveness
//!
//! Convergence means mean happiness is exactly 1. There is no hard tick
//! ceiling: a configuration that can never satisfy everyone runs forever.
//! [`DriverOptions::soft_tick_cap`] only emits a warning and flags the trial.
//!
//! # Randomness
//!
//! All draws (starting layouts and relocation destinations) come from the
//! RNG handed to the constructor, so a seeded RNG makes a run reproducible.

use rand::Rng;
use schelling_types::{ModelParams, SimulationSummary, TrialStats};
use schelling_world::{Lattice, OccupancyIndex, WorldError, happiness, relocation};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::observer::{NoOpObserver, TickObserver};

/// Errors that can occur while driving a simulation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A world operation failed (invalid parameters or no vacancy).
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// `simulate` was asked to run zero trials.
    #[error("at least one trial is required")]
    NoTrials,
}

/// Where each trial's starting layout comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPolicy {
    /// Every trial restarts from the layout drawn at construction.
    #[default]
    ReuseInitial,
    /// Trial 0 uses the construction layout; every later trial draws a
    /// fresh random layout.
    Reshuffle,
}

/// Tunables that do not change model semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverOptions {
    /// Starting layout of each trial.
    pub layout_policy: LayoutPolicy,
    /// Tick count after which a non-converged trial logs a liveness warning.
    pub soft_tick_cap: Option<u64>,
}

/// Phase of the current trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    /// Layout reset and indices rebuilt; no tick has run.
    Init,
    /// At least one agent was unhappy and ticks are running.
    Ticking,
    /// Every agent is happy.
    Converged,
}

/// Runs Schelling trials to convergence and averages their outcomes.
#[derive(Debug, Clone)]
pub struct SimulationDriver<R> {
    params: ModelParams,
    options: DriverOptions,
    rng: R,
    /// Layout drawn at construction.
    initial: Lattice,
    /// Layout of the trial in progress.
    lattice: Lattice,
    index: OccupancyIndex,
    phase: TrialPhase,
}

impl<R: Rng> SimulationDriver<R> {
    /// Create a driver with default options.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] wrapping
    /// [`WorldError::Configuration`] if `params` are invalid.
    pub fn new(params: ModelParams, rng: R) -> Result<Self, DriverError> {
        Self::with_options(params, rng, DriverOptions::default())
    }

    /// Create a driver, validating `params` and drawing the initial layout.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] wrapping
    /// [`WorldError::Configuration`] if `params` are invalid.
    pub fn with_options(
        params: ModelParams,
        mut rng: R,
        options: DriverOptions,
    ) -> Result<Self, DriverError> {
        let initial = Lattice::random(&params, &mut rng)?;
        let index = OccupancyIndex::from_lattice(&initial);

        info!(
            side = params.side,
            padding = initial.padding(),
            group_a = params.group_a.population,
            group_b = params.group_b.population,
            vacancies = index.vacancy_count(),
            layout_policy = ?options.layout_policy,
            "Simulation driver initialized"
        );

        Ok(Self {
            params,
            options,
            rng,
            lattice: initial.clone(),
            initial,
            index,
            phase: TrialPhase::Init,
        })
    }

    /// Create a driver whose initial layout is `layout` instead of a random
    /// draw. Used to replay a known arrangement.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] wrapping
    /// [`WorldError::Configuration`] if `params` are invalid or `layout`
    /// disagrees with them on side, halo width, or group populations.
    pub fn from_layout(
        params: ModelParams,
        layout: Lattice,
        rng: R,
        options: DriverOptions,
    ) -> Result<Self, DriverError> {
        schelling_world::validate(&params)?;

        if layout.side() != params.side || layout.padding() != params.padding() {
            return Err(WorldError::Configuration {
                reason: format!(
                    "layout is {}x{} with halo {}, parameters require {}x{} with halo {}",
                    layout.side(),
                    layout.side(),
                    layout.padding(),
                    params.side,
                    params.side,
                    params.padding()
                ),
            }
            .into());
        }

        let counts = layout.counts();
        let expected = (
            usize::try_from(params.group_a.population).unwrap_or(usize::MAX),
            usize::try_from(params.group_b.population).unwrap_or(usize::MAX),
        );
        if (counts.group_a, counts.group_b) != expected {
            return Err(WorldError::Configuration {
                reason: format!(
                    "layout holds {} A and {} B agents, parameters require {} and {}",
                    counts.group_a, counts.group_b, expected.0, expected.1
                ),
            }
            .into());
        }

        let index = OccupancyIndex::from_lattice(&layout);
        Ok(Self {
            params,
            options,
            rng,
            lattice: layout.clone(),
            initial: layout,
            index,
            phase: TrialPhase::Init,
        })
    }

    /// Model parameters.
    pub const fn params(&self) -> &ModelParams {
        &self.params
    }

    /// Driver options.
    pub const fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// The lattice of the trial in progress.
    pub const fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// The layout drawn at construction.
    pub const fn initial_layout(&self) -> &Lattice {
        &self.initial
    }

    /// Agent positions and vacancies of the trial in progress.
    pub const fn index(&self) -> &OccupancyIndex {
        &self.index
    }

    /// Phase of the trial in progress.
    pub const fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Init phase: reset the lattice for `trial` and rebuild the indices.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] if a reshuffled layout cannot be drawn.
    pub fn begin_trial(&mut self, trial: u32) -> Result<(), DriverError> {
        self.lattice = match self.options.layout_policy {
            LayoutPolicy::Reshuffle if trial > 0 => Lattice::random(&self.params, &mut self.rng)?,
            _ => self.initial.clone(),
        };
        self.index = OccupancyIndex::from_lattice(&self.lattice);
        self.phase = TrialPhase::Init;
        Ok(())
    }

    /// Run one pass over every agent in id order, relocating each unhappy
    /// agent immediately. Returns the number of relocations.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] wrapping [`WorldError::NoEmptyCells`]
    /// if an unhappy agent has nowhere to go.
    pub fn one_tick(&mut self) -> Result<u64, DriverError> {
        let mut relocations: u64 = 0;

        for agent in 0..self.index.agent_count() {
            let Some(coord) = self.index.position(agent) else {
                continue;
            };
            let Some(group) = self
                .lattice
                .get(coord)
                .and_then(|cell| self.params.for_cell(cell))
            else {
                continue;
            };
            let (threshold, radius) = (group.threshold, group.radius);

            if happiness::is_unhappy(&self.lattice, coord, threshold, radius) {
                relocation::relocate(&mut self.lattice, &mut self.index, agent, &mut self.rng)?;
                relocations = relocations.saturating_add(1);
            }
        }

        Ok(relocations)
    }

    /// Number of agents currently happy with their neighborhood.
    pub fn happy_count(&self) -> usize {
        self.index
            .positions()
            .iter()
            .filter(|&&coord| {
                self.lattice
                    .get(coord)
                    .and_then(|cell| self.params.for_cell(cell))
                    .is_some_and(|group| {
                        !happiness::is_unhappy(&self.lattice, coord, group.threshold, group.radius)
                    })
            })
            .count()
    }

    /// Whether every agent is happy. Vacuously true with no agents.
    pub fn is_converged(&self) -> bool {
        self.happy_count() == self.index.agent_count()
    }

    /// Fraction of agents currently happy; `1.0` with no agents.
    pub fn mean_happiness(&self) -> f64 {
        let agents = self.index.agent_count();
        if agents == 0 {
            return 1.0;
        }
        // Both counts are bounded by the lattice area.
        #[allow(clippy::cast_precision_loss)]
        let mean = self.happy_count() as f64 / agents as f64;
        mean
    }

    /// Mean satisfaction index over all agents; `0.0` with no agents.
    pub fn mean_satisfaction(&self) -> f64 {
        let agents = self.index.agent_count();
        if agents == 0 {
            return 0.0;
        }
        let total: f64 = self
            .index
            .positions()
            .iter()
            .filter_map(|&coord| {
                let group = self.lattice.get(coord).and_then(|c| self.params.for_cell(c))?;
                Some(happiness::satisfaction(&self.lattice, coord, group.radius))
            })
            .sum();
        // The agent count is bounded by the lattice area.
        #[allow(clippy::cast_precision_loss)]
        let mean = total / agents as f64;
        mean
    }

    /// Run trial number `trial` from Init to convergence.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::World`] if a relocation fails.
    pub fn run_trial<O: TickObserver + ?Sized>(
        &mut self,
        trial: u32,
        observer: &mut O,
    ) -> Result<TrialStats, DriverError> {
        self.begin_trial(trial)?;
        observer.on_init(trial, &self.lattice);

        let mut ticks: u64 = 0;
        let mut relocations: u64 = 0;
        let mut soft_cap_exceeded = false;
        let mut converged = self.is_converged();

        while !converged {
            self.phase = TrialPhase::Ticking;
            let moved = self.one_tick()?;
            ticks = ticks.saturating_add(1);
            relocations = relocations.saturating_add(moved);
            observer.on_tick(trial, ticks, &self.lattice);

            converged = self.is_converged();
            debug!(trial, tick = ticks, relocations = moved, converged, "Tick completed");

            if !converged
                && !soft_cap_exceeded
                && self.options.soft_tick_cap.is_some_and(|cap| ticks >= cap)
            {
                soft_cap_exceeded = true;
                warn!(
                    trial,
                    ticks,
                    mean_happiness = self.mean_happiness(),
                    "Trial has not converged within the soft tick cap; continuing"
                );
            }
        }

        self.phase = TrialPhase::Converged;
        let mean_satisfaction = self.mean_satisfaction();
        info!(trial, ticks, relocations, mean_satisfaction, "Trial converged");

        Ok(TrialStats {
            trial,
            ticks,
            mean_satisfaction,
            relocations,
            soft_cap_exceeded,
        })
    }

    /// Run `trials` trials without observation and average the results.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoTrials`] if `trials` is zero, or
    /// [`DriverError::World`] if a relocation fails.
    pub fn simulate(&mut self, trials: u32) -> Result<SimulationSummary, DriverError> {
        self.simulate_with(trials, &mut NoOpObserver)
    }

    /// Run `trials` trials, reporting init and every tick to `observer`,
    /// and average ticks-to-convergence and final mean satisfaction.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoTrials`] if `trials` is zero, or
    /// [`DriverError::World`] if a relocation fails.
    pub fn simulate_with<O: TickObserver + ?Sized>(
        &mut self,
        trials: u32,
        observer: &mut O,
    ) -> Result<SimulationSummary, DriverError> {
        if trials == 0 {
            return Err(DriverError::NoTrials);
        }

        let mut per_trial = Vec::with_capacity(usize::try_from(trials).unwrap_or(0));
        let mut total_ticks: u64 = 0;
        let mut total_satisfaction: f64 = 0.0;

        for trial in 0..trials {
            let stats = self.run_trial(trial, observer)?;
            total_ticks = total_ticks.saturating_add(stats.ticks);
            total_satisfaction += stats.mean_satisfaction;
            per_trial.push(stats);
        }

        let count = f64::from(trials);
        // Tick totals stay far below 2^53.
        #[allow(clippy::cast_precision_loss)]
        let average_ticks = total_ticks as f64 / count;
        let average_satisfaction = total_satisfaction / count;

        info!(trials, average_ticks, average_satisfaction, "Simulation complete");

        Ok(SimulationSummary {
            trials,
            average_ticks,
            average_satisfaction,
            per_trial,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use schelling_types::{Cell, Coord};

    use super::*;
    use crate::observer::SnapshotRecorder;

    fn driver(params: ModelParams, seed: u64) -> SimulationDriver<SmallRng> {
        SimulationDriver::new(params, SmallRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn zero_thresholds_converge_immediately() {
        let params = ModelParams::from_pairs(20, (100, 100), (0.0, 0.0), (1, 1));
        let mut driver = driver(params, 1);

        assert_eq!(driver.one_tick().unwrap(), 0);
        let summary = driver.simulate(1).unwrap();
        assert_eq!(summary.average_ticks, 0.0);
        assert_eq!(driver.phase(), TrialPhase::Converged);
    }

    #[test]
    fn driver_keeps_construction_settings() {
        let params = ModelParams::from_pairs(12, (30, 40), (0.4, 0.6), (1, 2));
        let options = DriverOptions {
            layout_policy: LayoutPolicy::Reshuffle,
            soft_tick_cap: Some(25),
        };
        let driver =
            SimulationDriver::with_options(params.clone(), SmallRng::seed_from_u64(4), options)
                .unwrap();

        assert_eq!(driver.params(), &params);
        assert_eq!(driver.options(), &options);
        assert_eq!(driver.phase(), TrialPhase::Init);
        assert_eq!(driver.lattice().padding(), 2);
    }

    #[test]
    fn small_grid_zero_threshold_scenario() {
        let params = ModelParams::from_pairs(4, (2, 2), (0.0, 0.0), (1, 1));
        let mut driver = driver(params, 3);
        let summary = driver.simulate(1).unwrap();

        assert_eq!(summary.average_ticks, 0.0);
        assert!((0.0..=1.0).contains(&summary.average_satisfaction));
        assert_eq!(driver.lattice(), driver.initial_layout());
    }

    #[test]
    fn moderate_thresholds_converge_and_conserve_counts() {
        let params = ModelParams::from_pairs(20, (150, 150), (0.3, 0.3), (1, 1));
        let mut driver = driver(params, 17);
        let before = driver.initial_layout().counts();

        let stats = driver.run_trial(0, &mut NoOpObserver).unwrap();

        assert_eq!(driver.lattice().counts(), before);
        assert!(driver.is_converged());
        assert_eq!(driver.mean_happiness(), 1.0);
        assert!(stats.mean_satisfaction >= 0.3);
        assert!(!stats.soft_cap_exceeded);
    }

    #[test]
    fn tick_pass_sees_earlier_moves() {
        // 5x5 torus, one vacancy at (3, 3), three A agents, the rest B.
        // B never moves (threshold 0); A needs 0.2.
        //
        //   agent 0: A (0, 0)  neighbours A(0,1)          -> 1/8, unhappy
        //   agent 1: A (0, 1)  neighbours A(0,0), A(1,2)  -> 2/8, happy at tick start
        //   agent 7: A (1, 2)  neighbours A(0,1)          -> 1/8, unhappy
        //
        // Agent 0 takes the only vacancy; agent 1 then sees (0, 0) empty,
        // drops to 1/7 and moves into it; agent 7 then sees (0, 1) empty and
        // moves there. A pass working from a tick-start snapshot would leave
        // agent 1 in place.
        let mut interior = vec![Cell::GroupB; 25];
        interior[0] = Cell::GroupA;
        interior[1] = Cell::GroupA;
        interior[7] = Cell::GroupA;
        interior[3 * 5 + 3] = Cell::Empty;
        let layout = Lattice::from_interior(5, 1, &interior).unwrap();
        let params = ModelParams::from_pairs(5, (3, 21), (0.2, 0.0), (1, 1));

        let mut driver = SimulationDriver::from_layout(
            params,
            layout,
            SmallRng::seed_from_u64(0),
            DriverOptions::default(),
        )
        .unwrap();
        driver.begin_trial(0).unwrap();

        assert_eq!(driver.one_tick().unwrap(), 3);
        assert_eq!(driver.index().position(0), Some(Coord::new(3, 3)));
        assert_eq!(driver.index().position(1), Some(Coord::new(0, 0)));
        assert_eq!(driver.index().position(7), Some(Coord::new(0, 1)));
        assert_eq!(driver.index().vacancies(), &[Coord::new(1, 2)]);
        assert_eq!(driver.lattice().counts().group_a, 3);
    }

    #[test]
    fn from_layout_rejects_mismatched_populations() {
        let layout = Lattice::from_interior(5, 1, &[Cell::GroupA; 25]).unwrap();
        let params = ModelParams::from_pairs(5, (3, 21), (0.2, 0.0), (1, 1));
        let result = SimulationDriver::from_layout(
            params,
            layout,
            SmallRng::seed_from_u64(0),
            DriverOptions::default(),
        );
        assert!(matches!(
            result,
            Err(DriverError::World {
                source: WorldError::Configuration { .. }
            })
        ));
    }

    #[test]
    fn full_lattice_with_unhappy_agent_fails() {
        let params = ModelParams::from_pairs(10, (50, 50), (1.0, 1.0), (1, 1));
        let mut driver = driver(params, 2);
        let result = driver.simulate(1);
        assert!(matches!(
            result,
            Err(DriverError::World {
                source: WorldError::NoEmptyCells
            })
        ));
    }

    #[test]
    fn full_lattice_with_content_agents_converges() {
        let params = ModelParams::from_pairs(10, (50, 50), (0.0, 0.0), (1, 1));
        let mut driver = driver(params, 2);
        let summary = driver.simulate(2).unwrap();
        assert_eq!(summary.average_ticks, 0.0);
    }

    #[test]
    fn overfull_lattice_rejected_at_construction() {
        let params = ModelParams::from_pairs(10, (60, 50), (0.5, 0.5), (1, 1));
        let result = SimulationDriver::new(params, SmallRng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(DriverError::World {
                source: WorldError::Configuration { .. }
            })
        ));
    }

    #[test]
    fn zero_trials_rejected() {
        let params = ModelParams::from_pairs(10, (10, 10), (0.5, 0.5), (1, 1));
        let mut driver = driver(params, 0);
        assert!(matches!(driver.simulate(0), Err(DriverError::NoTrials)));
    }

    #[test]
    fn empty_population_is_vacuously_converged() {
        let params = ModelParams::from_pairs(5, (0, 0), (0.5, 0.5), (1, 1));
        let mut driver = driver(params, 0);
        let summary = driver.simulate(1).unwrap();
        assert_eq!(summary.average_ticks, 0.0);
        assert_eq!(summary.average_satisfaction, 0.0);
        assert_eq!(driver.mean_happiness(), 1.0);
    }

    #[test]
    fn reuse_initial_restarts_every_trial_from_same_layout() {
        let params = ModelParams::from_pairs(12, (50, 50), (0.4, 0.4), (1, 1));
        let mut driver = driver(params, 21);
        let mut recorder = SnapshotRecorder::new();
        let _ = driver.simulate_with(3, &mut recorder).unwrap();

        let starts: Vec<_> = recorder.snapshots().iter().filter(|s| s.tick == 0).collect();
        assert_eq!(starts.len(), 3);
        for start in &starts {
            assert_eq!(start.cells, driver.initial_layout().interior());
        }
    }

    #[test]
    fn reshuffle_draws_new_layouts() {
        let params = ModelParams::from_pairs(12, (50, 50), (0.0, 0.0), (1, 1));
        let options = DriverOptions {
            layout_policy: LayoutPolicy::Reshuffle,
            soft_tick_cap: None,
        };
        let mut driver =
            SimulationDriver::with_options(params, SmallRng::seed_from_u64(4), options).unwrap();
        let mut recorder = SnapshotRecorder::new();
        let _ = driver.simulate_with(2, &mut recorder).unwrap();

        let snapshots = recorder.snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].cells, driver.initial_layout().interior());
        assert_ne!(snapshots[0].cells, snapshots[1].cells);
        assert_eq!(snapshots[1].count(Cell::GroupA), 50);
    }

    #[test]
    fn soft_cap_flags_slow_trials() {
        let params = ModelParams::from_pairs(20, (150, 150), (0.4, 0.4), (1, 1));
        let options = DriverOptions {
            layout_policy: LayoutPolicy::ReuseInitial,
            soft_tick_cap: Some(1),
        };
        let mut driver =
            SimulationDriver::with_options(params, SmallRng::seed_from_u64(9), options).unwrap();
        let stats = driver.run_trial(0, &mut NoOpObserver).unwrap();

        assert_eq!(stats.soft_cap_exceeded, stats.ticks > 1);
        assert!(driver.is_converged());
    }
}
