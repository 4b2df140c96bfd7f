//! Runner binary for the RMAT organ.
//!
//! Wires configuration, logging, and one shared engine together, drives
//! the engine for the configured number of ticks, and prints the final
//! state snapshot and causal view as JSON on stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `rmat-config.yaml` (or the path given as the
//!    first argument); defaults apply when the file is absent
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine and wrap it in a shared handle
//! 4. Run the tick loop, cycling through the configured inputs
//! 5. Print the final views

mod error;

use std::path::{Path, PathBuf};

use rmat_core::config::{LoggingConfig, RmatConfig};
use rmat_core::{Engine, EngineHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::RunError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "rmat-config.yaml";

/// Application entry point for the runner.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or any tick fails.
fn main() -> Result<(), RunError> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("rmat-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Build the engine.
    let handle = EngineHandle::new(Engine::new(&config)?);
    info!(
        size = config.engine.size,
        seed = config.engine.seed,
        ticks = config.run.ticks,
        input_patterns = config.run.inputs.len(),
        "Engine ready"
    );

    // 4. Run the tick loop.
    let mut inputs = config.run.inputs.iter().cycle();
    for _ in 0..config.run.ticks {
        let input = inputs.next().map(Vec::as_slice);
        if input.is_some_and(|values| values.len() != config.engine.size) {
            warn!(
                expected = config.engine.size,
                "Input length differs from engine size, padding or truncating"
            );
        }
        let report = handle.tick_with_report(input)?;
        info!(
            tick = report.tick,
            event = report.event,
            parents = ?report.parents,
            fallback = report.fallback,
            "Tick"
        );
    }

    // 5. Print the final views.
    let output = serde_json::json!({
        "state": handle.snapshot()?,
        "causal": handle.causal_view()?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    info!("rmat-engine finished");
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
///
/// Returns the configuration and whether it was read from the file.
fn load_config(path: &Path) -> Result<(RmatConfig, bool), RunError> {
    if path.exists() {
        let config = RmatConfig::from_file(path)?;
        Ok((config, true))
    } else {
        let mut config = RmatConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), RunError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_env_err| EnvFilter::try_new(&logging.level))
        .map_err(|e| RunError::Logging {
            message: format!("invalid log level {:?}: {e}", logging.level),
        })?;

    let result = if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| RunError::Logging {
        message: format!("{e}"),
    })
}
