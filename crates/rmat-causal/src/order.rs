//! Order-theoretic queries over a [`CausalSet`].
//!
//! Everything here is read-only and works on one-hop relations only. Two
//! events linked through an intermediate event are *not* considered
//! related.

use std::collections::BTreeSet;

use crate::{CausalSet, EventId};

/// Return whether every pair in `subset` is directly related.
///
/// Subsets with fewer than two members are vacuously chains.
pub fn is_chain(set: &CausalSet, subset: &[EventId]) -> bool {
    pairs(subset).all(|(a, b)| set.are_related(a, b))
}

/// Return whether no pair in `subset` is directly related.
///
/// Subsets with fewer than two members are vacuously antichains.
pub fn is_antichain(set: &CausalSet, subset: &[EventId]) -> bool {
    pairs(subset).all(|(a, b)| !set.are_related(a, b))
}

/// Partition the set into chains by following single-successor runs.
///
/// Events are scanned in id order. Each unvisited event starts a chain,
/// which is extended while the current event has exactly one successor and
/// that successor has not been visited yet.
pub fn decompose_chains(set: &CausalSet) -> Vec<Vec<EventId>> {
    let mut visited = BTreeSet::new();
    let mut chains = Vec::new();

    for start in set.events() {
        if !visited.insert(start) {
            continue;
        }
        let mut chain = vec![start];
        let mut current = start;
        while let &[next] = set.future_of(current) {
            if !visited.insert(next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chains.push(chain);
    }

    chains
}

/// Partition the set into antichains by repeated greedy slicing.
///
/// Each pass scans the remaining events in id order and admits an event
/// when it is not directly related to anything already admitted in that
/// pass. Slices are returned in the order they were built.
pub fn decompose_antichains(set: &CausalSet) -> Vec<Vec<EventId>> {
    let mut remaining: Vec<EventId> = set.events().collect();
    let mut antichains = Vec::new();

    while !remaining.is_empty() {
        let mut slice: Vec<EventId> = Vec::new();
        remaining.retain(|&event| {
            if slice.iter().all(|&admitted| !set.are_related(event, admitted)) {
                slice.push(event);
                false
            } else {
                true
            }
        });
        antichains.push(slice);
    }

    antichains
}

/// Iterate over all unordered pairs `(subset[i], subset[j])` with `i < j`.
fn pairs(subset: &[EventId]) -> impl Iterator<Item = (EventId, EventId)> + '_ {
    subset
        .iter()
        .enumerate()
        .flat_map(move |(i, &a)| subset.iter().skip(i.saturating_add(1)).map(move |&b| (a, b)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
