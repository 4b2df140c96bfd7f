//! Shared, lock-guarded access to one [`Engine`].
//!
//! The engine itself is not synchronized. [`EngineHandle`] serializes every
//! tick and every read behind a single mutex, so one handle can be cloned
//! into each collaborator (request handlers, background drivers) of a
//! process.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use rand::rngs::StdRng;

use crate::engine::{CausalView, Engine, EngineError, TickReport};
use crate::state::StateVector;

/// Cloneable handle to an engine shared between threads.
#[derive(Debug)]
pub struct EngineHandle<R = StdRng> {
    inner: Arc<Mutex<Engine<R>>>,
}

impl<R> Clone for EngineHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Rng> EngineHandle<R> {
    /// Take ownership of `engine` and wrap it for sharing.
    pub fn new(engine: Engine<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Return a copy of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] if a previous holder panicked.
    pub fn snapshot(&self) -> Result<StateVector, EngineError> {
        Ok(self.lock()?.snapshot())
    }

    /// Run one tick and return the new state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] if a previous holder panicked,
    /// or any error from [`Engine::tick`].
    pub fn tick(&self, external_input: Option<&[f64]>) -> Result<StateVector, EngineError> {
        self.lock()?.tick(external_input)
    }

    /// Run one tick and return its report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] if a previous holder panicked,
    /// or any error from [`Engine::tick_with_report`].
    pub fn tick_with_report(
        &self,
        external_input: Option<&[f64]>,
    ) -> Result<TickReport, EngineError> {
        self.lock()?.tick_with_report(external_input)
    }

    /// Build a fresh view of the causal set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LockPoisoned`] if a previous holder panicked.
    pub fn causal_view(&self) -> Result<CausalView, EngineError> {
        Ok(self.lock()?.causal_view())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Engine<R>>, EngineError> {
        self.inner.lock().map_err(|_poisoned| EngineError::LockPoisoned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;

    use crate::config::RmatConfig;

    use super::*;

    #[test]
    fn clones_share_one_engine() {
        let handle = EngineHandle::new(Engine::new(&RmatConfig::default()).unwrap());
        let other = handle.clone();
        other.tick(None).unwrap();
        assert_eq!(handle.snapshot().unwrap().timestep(), 1);
        assert_eq!(handle.causal_view().unwrap().events.len(), 2);
    }

    #[test]
    fn concurrent_ticks_are_serialized() {
        let handle = EngineHandle::new(Engine::new(&RmatConfig::default()).unwrap());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        handle.tick(Some(&[1.0, 0.0, 0.5, 0.25])).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let state = handle.snapshot().unwrap();
        let view = handle.causal_view().unwrap();
        assert_eq!(state.timestep(), 100);
        assert_eq!(view.events.len(), 101);
        for (&from, successors) in &view.relations {
            assert!(successors.iter().all(|&to| to > from));
        }
    }
}
