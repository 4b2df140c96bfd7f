//! State evolution, causal growth, and the tick engine for the RMAT organ.
//!
//! The organ pairs a bounded state vector with a causal set that grows by
//! one event per tick. Each tick first advances the state, then uses the
//! fresh spikes and attention to choose which earlier events the new event
//! descends from.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `rmat-config.yaml` into
//!   strongly-typed structs.
//! - [`state`] -- The [`StateVector`] snapshot type.
//! - [`evolver`] -- Per-tick update rules and their opt-in variants.
//! - [`growth`] -- State-biased parent sampling for new events.
//! - [`engine`] -- [`Engine`]: `snapshot`, `tick`, and `causal_view`.
//! - [`handle`] -- [`EngineHandle`] for sharing one engine across threads.
//!
//! [`StateVector`]: state::StateVector
//! [`Engine`]: engine::Engine
//! [`EngineHandle`]: handle::EngineHandle

pub mod config;
pub mod engine;
pub mod evolver;
pub mod growth;
pub mod handle;
pub mod state;

pub use engine::{CausalView, Engine, EngineError, TickReport};
pub use handle::EngineHandle;
pub use state::StateVector;
