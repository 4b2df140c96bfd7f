//! Per-tick state evolution.
//!
//! With the canonical rule set, each dimension `i` advances as:
//!
//! ```text
//! s'  = clamp01(0.7*s + 0.3*x)
//! d'  = 0.9*d + 0.1*s'
//! a'  = clamp(-1, 1, 0.8*a + 0.1*s' + 0.1*(d' - 0.5))
//! f   = 0.2*s' + 0.1*a'
//! q'  = q + p
//! p'  = 0.9*p + f
//! ```
//!
//! where `x` is the external input, `q` the position and `p` the momentum.
//! The phase space uses the symplectic-Euler convention: position moves by
//! the *old* momentum while the force comes from the fresh spikes and
//! attention. [`EvolutionConfig`] selects the opt-in variants.
//!
//! Evolution never fails. Input longer than `N` is truncated, shorter input
//! is padded with zeros, and non-finite entries count as zero.

use crate::config::{AttentionRule, EvolutionConfig, PhaseIntegrator, SpikeRule};
use crate::state::StateVector;

/// Owner of the organ's state vector.
#[derive(Debug, Clone)]
pub struct Evolver {
    state: StateVector,
    rules: EvolutionConfig,
}

impl Evolver {
    /// Create an evolver holding the all-zero state of dimension `size`.
    pub fn new(size: usize, rules: EvolutionConfig) -> Self {
        Self {
            state: StateVector::zeros(size),
            rules,
        }
    }

    /// Return the current state.
    pub const fn state(&self) -> &StateVector {
        &self.state
    }

    /// Return the active rule selection.
    pub const fn rules(&self) -> EvolutionConfig {
        self.rules
    }

    /// Advance one tick and return a copy of the new state.
    pub fn step(&mut self, external_input: Option<&[f64]>) -> StateVector {
        let next = self.evolve(external_input);
        self.commit(next.clone());
        next
    }

    /// Compute the state that [`step`](Self::step) would produce, without
    /// committing it.
    pub fn evolve(&self, external_input: Option<&[f64]>) -> StateVector {
        let prev = &self.state;
        let input = normalize_input(external_input, prev.size());

        let spikes: Vec<f64> = prev
            .spikes
            .iter()
            .zip(&prev.density)
            .zip(&input)
            .map(|((&s, &d), &x)| match self.rules.spike_rule {
                SpikeRule::Leaky => clamp01(0.7 * s + 0.3 * x),
                SpikeRule::Reinforcing => clamp01(0.7 * s + 0.3 * x + 0.2 * d * s),
            })
            .collect();

        let density: Vec<f64> = prev
            .density
            .iter()
            .zip(&spikes)
            .map(|(&d, &s)| 0.9 * d + 0.1 * s)
            .collect();

        let attention = match self.rules.attention_rule {
            AttentionRule::Averaged => averaged_attention(&prev.attention, &spikes, &density),
            AttentionRule::Recursive => recursive_attention(&prev.attention, &spikes, &density),
        };

        let (position, momentum) = self.integrate(&spikes, &attention);

        StateVector {
            timestep: prev.timestep.saturating_add(1),
            spikes,
            density,
            attention,
            position,
            momentum,
        }
    }

    /// Replace the held state with one produced by [`evolve`](Self::evolve).
    pub(crate) fn commit(&mut self, next: StateVector) {
        self.state = next;
    }

    fn integrate(&self, spikes: &[f64], attention: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let prev = &self.state;
        prev.position
            .iter()
            .zip(&prev.momentum)
            .zip(spikes.iter().zip(attention))
            .map(|((&q, &p), (&s, &a))| {
                let force = 0.2 * s + 0.1 * a;
                let p_next = 0.9 * p + force;
                let q_next = match self.rules.integrator {
                    PhaseIntegrator::SymplecticEuler => q + p,
                    PhaseIntegrator::SemiImplicit => q + p_next,
                };
                (q_next, p_next)
            })
            .unzip()
    }
}

/// Pad or truncate the input to exactly `size` finite entries.
fn normalize_input(external_input: Option<&[f64]>, size: usize) -> Vec<f64> {
    let given = external_input.unwrap_or_default();
    given
        .iter()
        .map(|&x| if x.is_finite() { x } else { 0.0 })
        .chain(std::iter::repeat(0.0))
        .take(size)
        .collect()
}

const fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn averaged_attention(prev: &[f64], spikes: &[f64], density: &[f64]) -> Vec<f64> {
    prev.iter()
        .zip(spikes.iter().zip(density))
        .map(|(&a, (&s, &d))| (0.8 * a + 0.1 * s + 0.1 * (d - 0.5)).clamp(-1.0, 1.0))
        .collect()
}

fn recursive_attention(prev: &[f64], spikes: &[f64], density: &[f64]) -> Vec<f64> {
    let (sum, count) = spikes
        .iter()
        .fold((0.0_f64, 0.0_f64), |(sum, count), &s| (sum + s, count + 1.0));
    let mean = if count > 0.0 { sum / count } else { 0.0 };

    let raw: Vec<f64> = prev
        .iter()
        .zip(spikes.iter().zip(density))
        .map(|(&a, (&s, &d))| 0.8 * a + 0.1 * (s - mean) + 0.1 * (d - 0.5))
        .collect();

    let peak = raw.iter().fold(0.0_f64, |peak, &v| peak.max(v.abs()));
    let scale = if peak > 1.0 { peak } else { 1.0 };
    raw.into_iter()
        .map(|v| (v / scale).clamp(-1.0, 1.0))
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn canonical(size: usize) -> Evolver {
        Evolver::new(size, EvolutionConfig::default())
    }

    fn assert_bounded(state: &StateVector) {
        for &s in state.spikes() {
            assert!((0.0..=1.0).contains(&s), "spike {s} out of range");
        }
        for &d in state.density() {
            assert!((0.0..=1.0).contains(&d), "density {d} out of range");
        }
        for &a in state.attention() {
            assert!((-1.0..=1.0).contains(&a), "attention {a} out of range");
        }
    }

    #[test]
    fn timestep_advances_by_one() {
        let mut evolver = canonical(4);
        assert_eq!(evolver.state().timestep(), 0);
        for expected in 1..=5 {
            let state = evolver.step(None);
            assert_eq!(state.timestep(), expected);
        }
    }

    #[test]
    fn first_step_without_input_matches_rules() {
        let mut evolver = canonical(2);
        let state = evolver.step(None);
        assert_eq!(state.spikes(), &[0.0, 0.0]);
        assert_eq!(state.density(), &[0.0, 0.0]);
        // 0.1 * (0 - 0.5)
        assert!(close(state.attention()[0], -0.05));
        // position uses old momentum (0); momentum takes force 0.1 * -0.05
        assert_eq!(state.position()[0], 0.0);
        assert!(close(state.momentum()[0], -0.005));
    }

    #[test]
    fn first_step_with_input_matches_rules() {
        let mut evolver = canonical(1);
        let state = evolver.step(Some(&[1.0]));
        assert!(close(state.spikes()[0], 0.3));
        assert!(close(state.density()[0], 0.03));
        let attention = 0.1 * 0.3 + 0.1 * (0.03 - 0.5);
        assert!(close(state.attention()[0], attention));
        assert!(close(state.momentum()[0], 0.2 * 0.3 + 0.1 * attention));

        let momentum = state.momentum()[0];
        let second = evolver.step(None);
        assert!(close(second.position()[0], momentum));
    }

    #[test]
    fn semi_implicit_moves_by_new_momentum() {
        let rules = EvolutionConfig {
            integrator: PhaseIntegrator::SemiImplicit,
            ..EvolutionConfig::default()
        };
        let mut evolver = Evolver::new(1, rules);
        let state = evolver.step(Some(&[1.0]));
        assert!(close(state.position()[0], state.momentum()[0]));
    }

    #[test]
    fn long_input_is_truncated_and_short_input_padded() {
        let mut long = canonical(2);
        let state = long.step(Some(&[1.0, 1.0, 1.0, 1.0]));
        assert_eq!(state.size(), 2);
        assert!(close(state.spikes()[1], 0.3));

        let mut short = canonical(3);
        let state = short.step(Some(&[1.0]));
        assert!(close(state.spikes()[0], 0.3));
        assert_eq!(state.spikes()[1], 0.0);
        assert_eq!(state.spikes()[2], 0.0);
    }

    #[test]
    fn non_finite_input_counts_as_zero() {
        let mut evolver = canonical(3);
        let state = evolver.step(Some(&[f64::NAN, f64::INFINITY, f64::NEG_INFINITY]));
        assert_eq!(state.spikes(), &[0.0, 0.0, 0.0]);
        assert_bounded(&state);
    }

    #[test]
    fn extreme_input_stays_bounded() {
        let inputs: [&[f64]; 4] = [&[1e9, -1e9, 5.0], &[-3.0, 2.0, 0.5], &[], &[1e300, 1e300, 1e300]];
        for rules in [
            EvolutionConfig::default(),
            EvolutionConfig {
                spike_rule: SpikeRule::Reinforcing,
                attention_rule: AttentionRule::Recursive,
                integrator: PhaseIntegrator::SemiImplicit,
            },
        ] {
            let mut evolver = Evolver::new(3, rules);
            for _ in 0..50 {
                for input in inputs {
                    let state = evolver.step(Some(input));
                    assert_bounded(&state);
                }
            }
        }
    }

    #[test]
    fn sustained_input_saturates_spikes() {
        let mut evolver = canonical(1);
        for _ in 0..200 {
            evolver.step(Some(&[10.0]));
        }
        assert_eq!(evolver.state().spikes()[0], 1.0);
        assert!(evolver.state().density()[0] > 0.99);
    }

    #[test]
    fn reinforcing_rule_exceeds_leaky_rule() {
        let rules = EvolutionConfig {
            spike_rule: SpikeRule::Reinforcing,
            ..EvolutionConfig::default()
        };
        let mut leaky = canonical(1);
        let mut reinforcing = Evolver::new(1, rules);
        for _ in 0..5 {
            leaky.step(Some(&[0.5]));
            reinforcing.step(Some(&[0.5]));
        }
        assert!(reinforcing.state().spikes()[0] > leaky.state().spikes()[0]);
    }

    #[test]
    fn recursive_attention_is_centered() {
        // Equal spikes on every dimension cancel out after centering.
        let prev = [0.0, 0.0];
        let spikes = [0.4, 0.4];
        let density = [0.5, 0.5];
        let attention = recursive_attention(&prev, &spikes, &density);
        assert!(close(attention[0], 0.0));
        assert!(close(attention[1], 0.0));
    }

    #[test]
    fn recursive_attention_normalizes_by_peak() {
        let prev = [2.0, -1.0];
        let spikes = [0.0, 0.0];
        let density = [0.5, 0.5];
        let attention = recursive_attention(&prev, &spikes, &density);
        // raw = [1.6, -0.8], peak 1.6
        assert!(close(attention[0], 1.0));
        assert!(close(attention[1], -0.5));
    }

    #[test]
    fn evolve_does_not_commit() {
        let evolver = canonical(2);
        let next = evolver.evolve(Some(&[1.0, 1.0]));
        assert_eq!(next.timestep(), 1);
        assert_eq!(evolver.state().timestep(), 0);
    }
}
