//! Configuration loading and typed config structures for the Schelling
//! simulation.
//!
//! The canonical configuration lives in `schelling-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a
//! loader that reads the file. Every field has a default, so an empty file
//! is a valid configuration.

use std::path::Path;

use schelling_types::ModelParams;
use serde::Deserialize;

use crate::driver::{DriverOptions, LayoutPolicy};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Lattice side and per-group parameters.
    #[serde(default)]
    pub model: ModelParams,

    /// Trial count, seed, and driver behavior.
    #[serde(default)]
    pub run: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Number of independent trials to average over.
    #[serde(default = "default_trials")]
    pub trials: u32,

    /// Seed for every random draw of the run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Starting layout of each trial.
    #[serde(default)]
    pub layout_policy: LayoutPolicy,

    /// Ticks after which a non-converged trial logs a liveness warning.
    /// `0` disables the warning.
    #[serde(default)]
    pub soft_tick_cap: u64,

    /// Whether to capture a grid snapshot after init and every tick.
    #[serde(default)]
    pub record_snapshots: bool,
}

impl RunConfig {
    /// Driver options derived from this configuration.
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            layout_policy: self.layout_policy,
            soft_tick_cap: (self.soft_tick_cap > 0).then_some(self.soft_tick_cap),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            seed: default_seed(),
            layout_policy: LayoutPolicy::default(),
            soft_tick_cap: 0,
            record_snapshots: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit structured JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_trials() -> u32 {
    1
}

const fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_owned()
}
