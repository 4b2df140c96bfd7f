//! The tick engine: one evolver, one causal set, one growth sampler.
//!
//! A tick computes the next state, grows the causal set from that state,
//! and only then commits the state. If growth fails, neither the state nor
//! the causal set changes and the tick can be retried.
//!
//! The engine is single-threaded. Hosts that share it between threads wrap
//! it in an [`EngineHandle`](crate::handle::EngineHandle).

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rmat_causal::{CausalError, CausalSet, EventId, order};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, RmatConfig};
use crate::evolver::Evolver;
use crate::growth::CausalGrowth;
use crate::state::StateVector;

/// Errors that can occur while building or ticking an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration is unusable.
    #[error("invalid engine configuration: {source}")]
    InvalidConfig {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The causal set rejected a growth step.
    #[error("causal growth failed: {source}")]
    Causal {
        /// The underlying causal set error.
        #[from]
        source: CausalError,
    },

    /// Another thread panicked while holding the engine lock.
    #[error("engine lock poisoned")]
    LockPoisoned,
}

/// Summary of a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Timestep reached by this tick.
    pub tick: u64,
    /// Event appended by this tick.
    pub event: EventId,
    /// Parents linked to the new event.
    pub parents: Vec<EventId>,
    /// Whether the zero-weight fallback was used.
    pub fallback: bool,
}

/// Read-only view of the causal set with both greedy decompositions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CausalView {
    /// All event ids in creation order.
    pub events: Vec<EventId>,
    /// Direct successors of every event.
    pub relations: BTreeMap<EventId, Vec<EventId>>,
    /// Greedy single-successor chain decomposition.
    pub chains: Vec<Vec<EventId>>,
    /// Greedy antichain slicing.
    pub antichains: Vec<Vec<EventId>>,
}

impl CausalView {
    /// Build a view from the current contents of `set`.
    pub fn of(set: &CausalSet) -> Self {
        Self {
            events: set.events().collect(),
            relations: set.relations(),
            chains: order::decompose_chains(set),
            antichains: order::decompose_antichains(set),
        }
    }
}

/// The RMAT organ: evolving state plus a state-biased causal set.
#[derive(Debug)]
pub struct Engine<R = StdRng> {
    evolver: Evolver,
    causal: CausalSet,
    growth: CausalGrowth,
    rng: R,
}

impl Engine<StdRng> {
    /// Create an engine whose growth randomness is seeded from
    /// `config.engine.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(config: &RmatConfig) -> Result<Self, EngineError> {
        Self::with_rng(config, StdRng::seed_from_u64(config.engine.seed))
    }
}

impl<R: Rng> Engine<R> {
    /// Create an engine that draws growth randomness from `rng`.
    ///
    /// The causal set starts with the genesis event and no relations.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn with_rng(config: &RmatConfig, rng: R) -> Result<Self, EngineError> {
        config.validate()?;

        let mut causal = CausalSet::new();
        causal.add_event();

        info!(
            size = config.engine.size,
            max_parents = config.growth.max_parents,
            spike_rule = ?config.evolution.spike_rule,
            attention_rule = ?config.evolution.attention_rule,
            integrator = ?config.evolution.integrator,
            "RMAT engine initialized"
        );

        Ok(Self {
            evolver: Evolver::new(config.engine.size, config.evolution),
            causal,
            growth: CausalGrowth::new(&config.growth),
            rng,
        })
    }

    /// Return the state dimension `N`.
    pub const fn size(&self) -> usize {
        self.evolver.state().size()
    }

    /// Return a copy of the current state.
    pub fn snapshot(&self) -> StateVector {
        self.evolver.state().clone()
    }

    /// Return the causal set.
    pub const fn causal_set(&self) -> &CausalSet {
        &self.causal
    }

    /// Run one evolve-then-grow cycle and return the new state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Causal`] if growth fails; the engine is left
    /// unchanged in that case.
    pub fn tick(&mut self, external_input: Option<&[f64]>) -> Result<StateVector, EngineError> {
        self.tick_with_report(external_input)?;
        Ok(self.snapshot())
    }

    /// Run one cycle and describe what it appended.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Causal`] if growth fails; the engine is left
    /// unchanged in that case.
    pub fn tick_with_report(
        &mut self,
        external_input: Option<&[f64]>,
    ) -> Result<TickReport, EngineError> {
        let next = self.evolver.evolve(external_input);
        let outcome = self.growth.grow(&next, &mut self.causal, &mut self.rng)?;
        let tick = next.timestep();
        self.evolver.commit(next);

        debug!(
            tick,
            event = outcome.event,
            parent_count = outcome.parents.len(),
            fallback = outcome.fallback,
            "Tick complete"
        );

        Ok(TickReport {
            tick,
            event: outcome.event,
            parents: outcome.parents,
            fallback: outcome.fallback,
        })
    }

    /// Build a fresh [`CausalView`] of the current causal set.
    pub fn causal_view(&self) -> CausalView {
        CausalView::of(&self.causal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::SmallRng;

    use super::*;

    fn config(size: usize) -> RmatConfig {
        let mut config = RmatConfig::default();
        config.engine.size = size;
        config
    }

    #[test]
    fn new_engine_has_genesis_only() {
        let engine = Engine::new(&config(4)).unwrap();
        assert_eq!(engine.size(), 4);
        assert_eq!(engine.snapshot().timestep(), 0);
        assert_eq!(engine.causal_set().len(), 1);
        assert_eq!(engine.causal_set().relation_count(), 0);
    }

    #[test]
    fn zero_size_is_rejected() {
        let result = Engine::new(&config(0));
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn first_tick_links_genesis() {
        let mut engine = Engine::new(&config(4)).unwrap();
        let report = engine.tick_with_report(None).unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.event, 1);
        assert_eq!(report.parents, vec![0]);
        assert_eq!(engine.causal_set().future_of(0), &[1]);
        assert_eq!(engine.causal_set().relation_count(), 1);
    }

    #[test]
    fn tick_returns_committed_state() {
        let mut engine = Engine::new(&config(2)).unwrap();
        let state = engine.tick(Some(&[1.0, 0.0])).unwrap();
        assert_eq!(state, engine.snapshot());
        assert_eq!(state.timestep(), 1);
    }

    #[test]
    fn injected_rng_makes_runs_reproducible() {
        let run = || {
            let mut engine =
                Engine::with_rng(&config(3), SmallRng::seed_from_u64(2024)).unwrap();
            for step in 0..20_u32 {
                let drive = f64::from(step % 3);
                engine.tick(Some(&[drive, 1.0, 0.5])).unwrap();
            }
            engine.causal_view()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn causal_view_lists_every_event() {
        let mut engine = Engine::new(&config(4)).unwrap();
        for _ in 0..5 {
            engine.tick(None).unwrap();
        }
        let view = engine.causal_view();
        assert_eq!(view.events, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(view.relations.len(), 6);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json["relations"]["0"].is_array());
        assert!(json["chains"].is_array());
    }
}
