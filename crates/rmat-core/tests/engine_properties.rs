//! Integration tests for the tick engine.
//!
//! Each property is checked over many seeded runs, with and without
//! external input, and under every evolution rule variant.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rmat_causal::order;
use rmat_core::config::{AttentionRule, EvolutionConfig, PhaseIntegrator, RmatConfig, SpikeRule};
use rmat_core::{Engine, StateVector};

fn config(size: usize, evolution: EvolutionConfig) -> RmatConfig {
    let mut config = RmatConfig::default();
    config.engine.size = size;
    config.evolution = evolution;
    config
}

fn all_rule_sets() -> Vec<EvolutionConfig> {
    let mut sets = Vec::new();
    for spike_rule in [SpikeRule::Leaky, SpikeRule::Reinforcing] {
        for attention_rule in [AttentionRule::Averaged, AttentionRule::Recursive] {
            for integrator in [PhaseIntegrator::SymplecticEuler, PhaseIntegrator::SemiImplicit] {
                sets.push(EvolutionConfig {
                    spike_rule,
                    attention_rule,
                    integrator,
                });
            }
        }
    }
    sets
}

/// Deterministic input pattern that mixes saturation, negatives, and gaps.
fn input_for(step: u32) -> Option<Vec<f64>> {
    match step % 5 {
        0 => None,
        1 => Some(vec![1.0, 0.2, 3.0, -2.0]),
        2 => Some(vec![0.5]),
        3 => Some(vec![0.0, 0.9, 0.1, 0.7, 5.0, 5.0]),
        _ => Some(vec![-1.0, -1.0]),
    }
}

fn assert_bounded(state: &StateVector) {
    assert!(state.spikes().iter().all(|s| (0.0..=1.0).contains(s)));
    assert!(state.density().iter().all(|d| (0.0..=1.0).contains(d)));
    assert!(state.attention().iter().all(|a| (-1.0..=1.0).contains(a)));
}

#[test]
fn single_tick_without_input_links_genesis_to_event_one() {
    let mut engine = Engine::new(&config(4, EvolutionConfig::default())).unwrap();
    engine.tick(None).unwrap();

    let set = engine.causal_set();
    assert_eq!(set.len(), 2);
    assert_eq!(set.future_of(0), &[1]);
    assert_eq!(set.past_of(1), vec![0]);
    assert_eq!(set.relation_count(), 1);
}

#[test]
fn five_ticks_without_input_yield_six_events() {
    for seed in 0..50_u64 {
        let mut engine =
            Engine::with_rng(&config(4, EvolutionConfig::default()), SmallRng::seed_from_u64(seed))
                .unwrap();
        for _ in 0..5 {
            engine.tick(None).unwrap();
        }
        let set = engine.causal_set();
        assert_eq!(set.events().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
        for event in 1..6 {
            let parents = set.past_of(event);
            assert!(!parents.is_empty());
            assert!(parents.iter().all(|&p| p < event));
        }
    }
}

#[test]
fn state_and_causal_invariants_hold_across_runs() {
    for evolution in all_rule_sets() {
        for seed in 0..8_u64 {
            let mut engine =
                Engine::with_rng(&config(4, evolution), SmallRng::seed_from_u64(seed)).unwrap();
            assert_eq!(engine.snapshot().timestep(), 0);

            for step in 0..60_u32 {
                let before = engine.snapshot().timestep();
                let input = input_for(step);
                let state = engine.tick(input.as_deref()).unwrap();
                assert_eq!(state.timestep(), before + 1);
                assert_bounded(&state);
            }

            let set = engine.causal_set();
            assert_eq!(set.len(), 61);
            assert!(set.past_of(0).is_empty());
            for event in set.events().skip(1) {
                let parents = set.past_of(event);
                assert!(!parents.is_empty(), "event {event} has no parent");
                assert!(parents.len() <= 3);
            }
            for (from, successors) in set.relations() {
                let mut unique = successors.clone();
                unique.sort_unstable();
                unique.dedup();
                assert_eq!(unique.len(), successors.len());
                assert!(successors.iter().all(|&to| to > from));
            }
        }
    }
}

#[test]
fn decompositions_partition_the_event_set() {
    for seed in 0..20_u64 {
        let mut engine =
            Engine::with_rng(&config(3, EvolutionConfig::default()), SmallRng::seed_from_u64(seed))
                .unwrap();
        for step in 0..40_u32 {
            engine.tick(input_for(step).as_deref()).unwrap();
        }

        let view = engine.causal_view();
        let set = engine.causal_set();
        for parts in [&view.chains, &view.antichains] {
            let mut seen: Vec<usize> = parts.iter().flatten().copied().collect();
            seen.sort_unstable();
            assert_eq!(seen, view.events);
        }
        for chain in &view.chains {
            assert!(chain.windows(2).all(|pair| set.future_of(pair[0]) == [pair[1]]));
        }
        for slice in &view.antichains {
            assert!(order::is_antichain(set, slice));
        }
    }
}

#[test]
fn chain_and_antichain_never_both_hold_for_pairs() {
    let mut engine =
        Engine::with_rng(&config(4, EvolutionConfig::default()), SmallRng::seed_from_u64(8))
            .unwrap();
    for step in 0..30_u32 {
        engine.tick(input_for(step).as_deref()).unwrap();
    }
    let set = engine.causal_set();
    for a in set.events() {
        assert!(order::is_chain(set, &[a]) && order::is_antichain(set, &[a]));
        for b in set.events().filter(|&b| b != a) {
            let pair = [a, b];
            assert_ne!(order::is_chain(set, &pair), order::is_antichain(set, &pair));
        }
    }
}

#[test]
fn snapshot_does_not_advance_the_engine() {
    let mut engine = Engine::new(&config(4, EvolutionConfig::default())).unwrap();
    engine.tick(Some(&[1.0, 1.0, 1.0, 1.0])).unwrap();
    let first = engine.snapshot();
    let second = engine.snapshot();
    assert_eq!(first, second);
    assert_eq!(engine.causal_set().len(), 2);
    assert_eq!(first.phase_space().len(), 8);
}
