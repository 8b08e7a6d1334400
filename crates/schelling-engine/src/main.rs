//! Command-line runner for the Schelling segregation simulation.
//!
//! Loads configuration, seeds the RNG, runs the configured number of
//! trials to convergence, and prints the averaged results (and any recorded
//! snapshots) as JSON on stdout. Progress is reported through `tracing` on
//! stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$SCHELLING_CONFIG` or `schelling-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the driver from a seeded RNG
//! 4. Run all trials, recording snapshots if requested
//! 5. Print the report

mod error;
mod report;

use std::path::{Path, PathBuf};

use schelling_core::config::{LoggingConfig, SimulationConfig};
use schelling_types::SimulationSummary;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::run_simulation;

/// Environment variable naming an alternative config file.
const CONFIG_ENV: &str = "SCHELLING_CONFIG";

/// Config file read from the working directory when `SCHELLING_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "schelling-config.yaml";

/// Where the configuration was taken from.
enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the model
/// parameters are invalid, or a relocation finds no vacancy.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging depends on it, so report the source later.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("schelling-engine starting");
    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "Configuration loaded"),
        ConfigSource::Defaults => info!("Config file not found, using defaults"),
    }

    // 3-4. Build the driver and run every trial.
    let report = run_simulation(config.model, &config.run)?;

    // 5. Report.
    log_summary(&report.summary);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration.
///
/// An explicit `SCHELLING_CONFIG` path must exist. Without it,
/// `schelling-config.yaml` in the working directory is used if present and
/// defaults otherwise.
fn load_config() -> Result<(SimulationConfig, ConfigSource), EngineError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, ConfigSource::File(path)));
    }

    let config_path = Path::new(DEFAULT_CONFIG_PATH);
    if config_path.exists() {
        let config = SimulationConfig::from_file(config_path)?;
        Ok((config, ConfigSource::File(config_path.to_path_buf())))
    } else {
        Ok((SimulationConfig::default(), ConfigSource::Defaults))
    }
}

/// Log per-trial results and the averages.
fn log_summary(summary: &SimulationSummary) {
    for stats in &summary.per_trial {
        if stats.soft_cap_exceeded {
            warn!(
                trial = stats.trial,
                ticks = stats.ticks,
                "Trial converged only after exceeding the soft tick cap"
            );
        }
    }
    info!(
        trials = summary.trials,
        average_ticks = summary.average_ticks,
        average_satisfaction = summary.average_satisfaction,
        "Simulation finished"
    );
}
