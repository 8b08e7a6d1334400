//! Simulation driver and orchestration for the Schelling simulation.
//!
//! This crate runs trials to convergence and averages their outcomes:
//! Init (reset the layout and rebuild indices), then repeated ticks until
//! every agent is happy, then statistics.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `schelling-config.yaml` into
//!   strongly-typed structs.
//! - [`driver`] -- [`SimulationDriver`]: ticks, convergence, trial averaging.
//! - [`observer`] -- [`TickObserver`] hook, [`NoOpObserver`], and
//!   [`SnapshotRecorder`].
//!
//! [`SimulationDriver`]: driver::SimulationDriver
//! [`TickObserver`]: observer::TickObserver
//! [`NoOpObserver`]: observer::NoOpObserver
//! [`SnapshotRecorder`]: observer::SnapshotRecorder

pub mod config;
pub mod driver;
pub mod observer;
