//! Error types for the runner binary.
//!
//! [`RunError`] wraps every failure mode of startup and the tick loop so
//! `main` can propagate with `?`.

/// Top-level error for the runner binary.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: rmat_core::config::ConfigError,
    },

    /// Engine construction or a tick failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: rmat_core::EngineError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },

    /// Encoding the final views failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
