//! Append-only causal set store and order analysis for the RMAT organ.
//!
//! A causal set here is a dense sequence of events (ids `0, 1, 2, ...` in
//! creation order) plus one-hop forward relations between them. Creation
//! order is always a valid causal order: every relation `a -> b` satisfies
//! `a < b`.
//!
//! # Architecture
//!
//! - [`causal_set`] -- The [`CausalSet`] store: event appends, idempotent
//!   relation recording, and past/future lookups.
//! - [`order`] -- Read-only chain/antichain tests and the greedy
//!   decompositions used by the causal view.
//!
//! Relations are never transitively closed. A chain is a subset whose
//! members are pairwise *directly* related, and the decompositions are
//! greedy heuristics rather than optimal partitions.
//!
//! # Usage
//!
//! ```
//! use rmat_causal::{CausalSet, order};
//!
//! let mut set = CausalSet::new();
//! let genesis = set.add_event();
//! let next = set.append_event(&[genesis]).ok();
//! assert_eq!(next, Some(1));
//!
//! assert!(order::is_chain(&set, &[0, 1]));
//! assert_eq!(order::decompose_chains(&set), vec![vec![0, 1]]);
//! ```

pub mod causal_set;
pub mod order;

pub use causal_set::CausalSet;

/// Identifier of an event in a [`CausalSet`].
///
/// Ids are assigned densely in creation order, so an id is also the
/// event's position in the set.
pub type EventId = usize;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when mutating a [`CausalSet`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CausalError {
    /// The referenced event has not been created yet.
    #[error("unknown event {event} (set holds {len} events)")]
    UnknownEvent {
        /// The id that was referenced.
        event: EventId,
        /// Number of events in the set at the time of the call.
        len: usize,
    },

    /// A relation must point from an earlier event to a strictly later one.
    #[error("relation {from} -> {to} does not point forward")]
    NotForward {
        /// Source of the rejected relation.
        from: EventId,
        /// Target of the rejected relation.
        to: EventId,
    },
}
