//! State-biased causal growth.
//!
//! Each tick appends one event to the [`CausalSet`] and links it to one or
//! more earlier events. Every earlier event `p` is associated with state
//! dimension `p mod N` and weighted by
//!
//! ```text
//! w(p) = max(0, 0.7*spikes[p mod N] + 0.3*(attention[p mod N] + 1)/2)
//! ```
//!
//! Between 1 and `min(max_parents, e)` parents are drawn by weighted
//! sampling without replacement. If every weight is zero, the new event is
//! linked to its immediate predecessor instead.
//!
//! Parents are chosen before the set is touched; the event and its
//! relations are then committed in one [`CausalSet::append_event`] call.

use rand::Rng;
use rmat_causal::{CausalError, CausalSet, EventId};
use serde::Serialize;
use tracing::debug;

use crate::config::GrowthConfig;
use crate::state::StateVector;

/// Result of growing the set by one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrowthOutcome {
    /// Id of the event that was appended.
    pub event: EventId,
    /// Parents linked to the new event, in draw order.
    pub parents: Vec<EventId>,
    /// Whether the all-zero-weight fallback to the predecessor was used.
    pub fallback: bool,
}

/// The growth sampler.
#[derive(Debug, Clone)]
pub struct CausalGrowth {
    max_parents: usize,
}

impl CausalGrowth {
    /// Create a sampler from the growth configuration.
    ///
    /// A `max_parents` of zero is treated as one.
    pub fn new(config: &GrowthConfig) -> Self {
        Self {
            max_parents: config.max_parents.max(1),
        }
    }

    /// Return the upper bound on parents per event.
    pub const fn max_parents(&self) -> usize {
        self.max_parents
    }

    /// Append one event to `store`, linked to parents chosen from `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CausalError`] only if the store rejects the computed
    /// parents, which cannot happen for parents drawn from `[0, e)`. The
    /// store is unchanged on error.
    pub fn grow<R: Rng>(
        &self,
        state: &StateVector,
        store: &mut CausalSet,
        rng: &mut R,
    ) -> Result<GrowthOutcome, CausalError> {
        let event = store.len();
        let Some(predecessor) = event.checked_sub(1) else {
            store.append_event(&[])?;
            return Ok(GrowthOutcome {
                event,
                parents: Vec::new(),
                fallback: false,
            });
        };

        let weights: Vec<f64> = (0..event).map(|p| parent_weight(state, p)).collect();
        let total: f64 = weights.iter().sum();

        let (parents, fallback) = if total > 0.0 {
            let k = rng.random_range(1..=self.max_parents.min(event));
            (sample_without_replacement(&weights, k, rng), false)
        } else {
            (vec![predecessor], true)
        };

        let appended = store.append_event(&parents)?;
        debug!(
            event = appended,
            parents = ?parents,
            fallback,
            "Causal set grown"
        );
        Ok(GrowthOutcome {
            event: appended,
            parents,
            fallback,
        })
    }
}

/// Weight of event `event` as a parent candidate under `state`.
///
/// Returns zero for a zero-dimensional state.
pub fn parent_weight(state: &StateVector, event: EventId) -> f64 {
    event
        .checked_rem(state.size())
        .and_then(|index| state.signal_at(index))
        .map_or(0.0, |(spike, attention)| {
            (0.7 * spike + 0.3 * (attention + 1.0) / 2.0).max(0.0)
        })
}

/// Draw up to `k` distinct indices from `weights`, weighted, without
/// replacement.
///
/// Each draw takes a uniform value, walks the cumulative distribution of
/// the remaining candidates (renormalized to their current total), and
/// removes the selected candidate. Candidates with zero weight are never
/// drawn; sampling stops early once no positive weight remains.
pub fn sample_without_replacement<R: Rng>(
    weights: &[f64],
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut candidates: Vec<(usize, f64)> = weights
        .iter()
        .map(|&w| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .enumerate()
        .collect();
    let mut chosen = Vec::with_capacity(k.min(candidates.len()));

    while chosen.len() < k {
        let total: f64 = candidates.iter().map(|&(_, w)| w).sum();
        if total <= 0.0 {
            break;
        }
        let target: f64 = rng.random::<f64>();

        let mut cumulative = 0.0;
        let hit = candidates.iter().position(|&(_, w)| {
            cumulative += w / total;
            target < cumulative
        });
        // Rounding can leave the cumulative sum just below 1.0.
        let Some(pos) = hit.or_else(|| candidates.iter().rposition(|&(_, w)| w > 0.0)) else {
            break;
        };

        let (index, _) = candidates.remove(pos);
        chosen.push(index);
    }

    chosen
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn growth() -> CausalGrowth {
        CausalGrowth::new(&GrowthConfig::default())
    }

    fn genesis_store() -> CausalSet {
        let mut store = CausalSet::new();
        store.add_event();
        store
    }

    fn excited_state(size: usize) -> StateVector {
        let mut state = StateVector::zeros(size);
        state.spikes = vec![1.0; size];
        state.attention = vec![1.0; size];
        state
    }

    #[test]
    fn weight_uses_dimension_modulo_size() {
        let mut state = StateVector::zeros(2);
        state.spikes = vec![1.0, 0.0];
        state.attention = vec![0.0, -1.0];
        // dimension 0: 0.7 + 0.3 * 0.5
        assert!((parent_weight(&state, 0) - 0.85).abs() < 1e-12);
        assert!((parent_weight(&state, 2) - 0.85).abs() < 1e-12);
        // dimension 1: 0.0 + 0.3 * 0.0
        assert_eq!(parent_weight(&state, 1), 0.0);
        assert_eq!(parent_weight(&state, 3), 0.0);
    }

    #[test]
    fn weight_of_zero_dimensional_state_is_zero() {
        let state = StateVector::zeros(0);
        assert_eq!(parent_weight(&state, 5), 0.0);
    }

    #[test]
    fn first_grow_on_empty_store_creates_genesis() {
        let mut store = CausalSet::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let outcome = growth()
            .grow(&StateVector::zeros(4), &mut store, &mut rng)
            .unwrap();
        assert_eq!(outcome.event, 0);
        assert!(outcome.parents.is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.relation_count(), 0);
    }

    #[test]
    fn zero_weights_fall_back_to_predecessor() {
        // attention -1 and no spikes zero every weight.
        let mut state = StateVector::zeros(4);
        state.attention = vec![-1.0; 4];
        let mut store = genesis_store();
        store.add_event();
        store.add_event();
        let mut rng = SmallRng::seed_from_u64(7);

        let outcome = growth().grow(&state, &mut store, &mut rng).unwrap();
        assert_eq!(outcome.event, 3);
        assert_eq!(outcome.parents, vec![2]);
        assert!(outcome.fallback);
        assert_eq!(store.past_of(3), vec![2]);
    }

    #[test]
    fn grown_events_have_earlier_distinct_parents() {
        let state = excited_state(4);
        let mut store = genesis_store();
        let mut rng = SmallRng::seed_from_u64(42);
        let sampler = growth();

        for _ in 0..40 {
            let outcome = sampler.grow(&state, &mut store, &mut rng).unwrap();
            assert!(!outcome.parents.is_empty());
            assert!(outcome.parents.len() <= 3);
            assert!(outcome.parents.iter().all(|&p| p < outcome.event));
            let mut unique = outcome.parents.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), outcome.parents.len());
            assert_eq!(store.past_of(outcome.event).len(), outcome.parents.len());
        }
        assert_eq!(store.len(), 41);
    }

    #[test]
    fn second_event_has_single_parent() {
        let state = excited_state(4);
        let mut store = genesis_store();
        let mut rng = SmallRng::seed_from_u64(3);
        let outcome = growth().grow(&state, &mut store, &mut rng).unwrap();
        assert_eq!(outcome.parents, vec![0]);
        assert!(!outcome.fallback);
    }

    #[test]
    fn max_parents_caps_draws() {
        let sampler = CausalGrowth::new(&GrowthConfig { max_parents: 1 });
        let state = excited_state(2);
        let mut store = genesis_store();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..20 {
            let outcome = sampler.grow(&state, &mut store, &mut rng).unwrap();
            assert_eq!(outcome.parents.len(), 1);
        }
    }

    #[test]
    fn same_seed_same_parents() {
        let state = excited_state(3);
        let run = |seed: u64| {
            let mut store = genesis_store();
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..15 {
                growth().grow(&state, &mut store, &mut rng).unwrap();
            }
            store
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn sampling_returns_distinct_valid_indices() {
        let weights = [0.6, 0.3, 0.1];
        for seed in 0..200_u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let picked = sample_without_replacement(&weights, 2, &mut rng);
            assert_eq!(picked.len(), 2);
            assert!(picked.iter().all(|&i| i < 3));
            assert_ne!(picked[0], picked[1]);
        }
    }

    #[test]
    fn sampling_caps_at_candidate_count() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut picked = sample_without_replacement(&[0.2, 0.5], 5, &mut rng);
        picked.sort_unstable();
        assert_eq!(picked, vec![0, 1]);
    }

    #[test]
    fn sampling_skips_zero_weights() {
        for seed in 0..100_u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let picked = sample_without_replacement(&[0.0, 1.0, 0.0], 3, &mut rng);
            assert_eq!(picked, vec![1]);
        }
    }

    #[test]
    fn sampling_favours_heavier_weights() {
        let mut first_counts = [0_u32; 3];
        for seed in 0..2000_u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let picked = sample_without_replacement(&[0.6, 0.3, 0.1], 1, &mut rng);
            first_counts[picked[0]] += 1;
        }
        assert!(first_counts[0] > first_counts[1]);
        assert!(first_counts[1] > first_counts[2]);
    }
}
