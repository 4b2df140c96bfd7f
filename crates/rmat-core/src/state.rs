//! The organ's numeric state vector.
//!
//! A [`StateVector`] of dimension `N` holds four per-dimension signals and
//! a tick counter:
//!
//! - `spikes` in `[0, 1]`
//! - `density` in `[0, 1]`, a slow moving average of spikes
//! - `attention` in `[-1, 1]`
//! - `position` and `momentum`, together the phase space (unbounded)
//!
//! Only the [`Evolver`](crate::evolver::Evolver) produces new states. Every
//! other reader receives a clone.

use serde::Serialize;

/// Snapshot of the organ's state at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateVector {
    pub(crate) timestep: u64,
    pub(crate) spikes: Vec<f64>,
    pub(crate) density: Vec<f64>,
    pub(crate) attention: Vec<f64>,
    pub(crate) position: Vec<f64>,
    pub(crate) momentum: Vec<f64>,
}

impl StateVector {
    /// Create the all-zero state of dimension `size` at timestep 0.
    pub fn zeros(size: usize) -> Self {
        Self {
            timestep: 0,
            spikes: vec![0.0; size],
            density: vec![0.0; size],
            attention: vec![0.0; size],
            position: vec![0.0; size],
            momentum: vec![0.0; size],
        }
    }

    /// Return the dimension `N`.
    pub const fn size(&self) -> usize {
        self.spikes.len()
    }

    /// Return the number of completed ticks.
    pub const fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Return the spike signal.
    pub const fn spikes(&self) -> &[f64] {
        self.spikes.as_slice()
    }

    /// Return the density signal.
    pub const fn density(&self) -> &[f64] {
        self.density.as_slice()
    }

    /// Return the attention signal.
    pub const fn attention(&self) -> &[f64] {
        self.attention.as_slice()
    }

    /// Return the phase-space positions.
    pub const fn position(&self) -> &[f64] {
        self.position.as_slice()
    }

    /// Return the phase-space momenta.
    pub const fn momentum(&self) -> &[f64] {
        self.momentum.as_slice()
    }

    /// Return the concatenated phase space: positions followed by momenta.
    pub fn phase_space(&self) -> Vec<f64> {
        self.position
            .iter()
            .chain(&self.momentum)
            .copied()
            .collect()
    }

    /// Return the `(spike, attention)` pair for dimension `index`, if any.
    pub fn signal_at(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.spikes.get(index)?, *self.attention.get(index)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn zeros_has_requested_dimension() {
        let state = StateVector::zeros(3);
        assert_eq!(state.size(), 3);
        assert_eq!(state.timestep(), 0);
        assert_eq!(state.spikes(), &[0.0, 0.0, 0.0]);
        assert_eq!(state.phase_space().len(), 6);
    }

    #[test]
    fn phase_space_puts_positions_first() {
        let mut state = StateVector::zeros(2);
        state.position = vec![1.0, 2.0];
        state.momentum = vec![3.0, 4.0];
        assert_eq!(state.phase_space(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn signal_at_out_of_range_is_none() {
        let state = StateVector::zeros(2);
        assert_eq!(state.signal_at(1), Some((0.0, 0.0)));
        assert!(state.signal_at(2).is_none());
    }

    #[test]
    fn serializes_with_split_phase_space() {
        let state = StateVector::zeros(1);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["timestep"], 0);
        assert_eq!(json["position"], serde_json::json!([0.0]));
        assert_eq!(json["momentum"], serde_json::json!([0.0]));
    }
}
