//! Configuration loading and typed config structures for the RMAT organ.
//!
//! The canonical configuration lives in `rmat-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty document is a valid config.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

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

    /// The configuration parsed but describes an unusable organ.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `rmat-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RmatConfig {
    /// Engine construction parameters (dimension, seed).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Opt-in variants of the evolution rules.
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Causal growth parameters.
    #[serde(default)]
    pub growth: GrowthConfig,

    /// Settings for the standalone runner binary.
    #[serde(default)]
    pub run: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RmatConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `RMAT_SEED` overrides `engine.seed`
    /// - `RMAT_TICKS` overrides `run.ticks`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Does not consult the environment.
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

    /// Override selected values with environment variables when set.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RMAT_SEED") {
            match val.parse() {
                Ok(seed) => self.engine.seed = seed,
                Err(e) => warn!(value = %val, error = %e, "Ignoring unparseable RMAT_SEED"),
            }
        }
        if let Ok(val) = std::env::var("RMAT_TICKS") {
            match val.parse() {
                Ok(ticks) => self.run.ticks = ticks,
                Err(e) => warn!(value = %val, error = %e, "Ignoring unparseable RMAT_TICKS"),
            }
        }
    }

    /// Check that the configuration describes a usable organ.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `engine.size` or
    /// `growth.max_parents` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.size == 0 {
            return Err(ConfigError::Invalid {
                reason: "engine.size must be at least 1".to_owned(),
            });
        }
        if self.growth.max_parents == 0 {
            return Err(ConfigError::Invalid {
                reason: "growth.max_parents must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Dimension `N` of the state vector, fixed for the engine's lifetime.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Seed for the growth random source.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            seed: default_seed(),
        }
    }
}

/// How fresh spikes are derived from the previous spikes and the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeRule {
    /// Leaky integration: `clamp01(0.7*s + 0.3*x)`.
    #[default]
    Leaky,
    /// Leaky integration plus self-reinforcement weighted by density:
    /// `clamp01(0.7*s + 0.3*x + 0.2*d*s)`.
    Reinforcing,
}

/// How fresh attention is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionRule {
    /// `clamp(-1, 1, 0.8*a + 0.1*s' + 0.1*(d' - 0.5))`.
    #[default]
    Averaged,
    /// Spike term centered on the mean fresh spike, then the whole vector
    /// normalized by its largest magnitude when that exceeds 1.
    Recursive,
}

/// Integration scheme for the phase-space update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseIntegrator {
    /// Position advances by the old momentum; momentum takes the fresh force.
    #[default]
    SymplecticEuler,
    /// Position advances by the freshly updated momentum.
    SemiImplicit,
}

/// Evolution rule selection. Defaults are the canonical rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EvolutionConfig {
    /// Spike update rule.
    #[serde(default)]
    pub spike_rule: SpikeRule,

    /// Attention update rule.
    #[serde(default)]
    pub attention_rule: AttentionRule,

    /// Phase-space integration scheme.
    #[serde(default)]
    pub integrator: PhaseIntegrator,
}

/// Causal growth parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrowthConfig {
    /// Upper bound on parents drawn for a new event.
    #[serde(default = "default_max_parents")]
    pub max_parents: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            max_parents: default_max_parents(),
        }
    }
}

/// Settings for the standalone runner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    /// Number of ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// External input vectors, cycled across ticks. Empty means no input.
    #[serde(default)]
    pub inputs: Vec<Vec<f64>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            inputs: Vec::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
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
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_size() -> usize {
    4
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_parents() -> usize {
    3
}

const fn default_ticks() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}
