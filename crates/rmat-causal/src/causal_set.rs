//! The causal set store: an append-only sequence of events with one-hop
//! forward relations.
//!
//! # Design
//!
//! - **Append-only**: events are never removed and ids are never reused.
//! - **Forward-only**: the only adjacency kept is event -> direct
//!   successors. [`CausalSet::past_of`] scans every event.
//! - **Idempotent**: recording an existing relation again changes nothing.

use std::collections::BTreeMap;

use crate::{CausalError, EventId};

/// Append-only causal set.
///
/// `successors[id]` holds the events that `id` directly precedes, in the
/// order the relations were recorded. Every successor id is strictly
/// greater than `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CausalSet {
    /// Direct successors per event, indexed by event id.
    successors: Vec<Vec<EventId>>,
}

impl CausalSet {
    /// Create an empty causal set (no genesis event).
    pub const fn new() -> Self {
        Self {
            successors: Vec::new(),
        }
    }

    /// Return the number of events in the set.
    pub const fn len(&self) -> usize {
        self.successors.len()
    }

    /// Return whether the set has no events.
    pub const fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Return whether `event` has been created.
    pub const fn contains(&self, event: EventId) -> bool {
        event < self.successors.len()
    }

    /// Iterate over all event ids in creation order.
    pub const fn events(&self) -> std::ops::Range<EventId> {
        0..self.successors.len()
    }

    /// Append a new event with no relations and return its id.
    pub fn add_event(&mut self) -> EventId {
        let id = self.successors.len();
        self.successors.push(Vec::new());
        id
    }

    /// Record the relation `from -> to`.
    ///
    /// Returns `true` if the relation was newly recorded and `false` if it
    /// already existed.
    ///
    /// # Errors
    ///
    /// Returns [`CausalError::UnknownEvent`] if `to` does not exist yet, or
    /// [`CausalError::NotForward`] if `from >= to`.
    pub fn add_relation(&mut self, from: EventId, to: EventId) -> Result<bool, CausalError> {
        let len = self.len();
        if !self.contains(to) {
            return Err(CausalError::UnknownEvent { event: to, len });
        }
        if from >= to {
            return Err(CausalError::NotForward { from, to });
        }
        let successors = self
            .successors
            .get_mut(from)
            .ok_or(CausalError::UnknownEvent { event: from, len })?;
        if successors.contains(&to) {
            return Ok(false);
        }
        successors.push(to);
        Ok(true)
    }

    /// Append a new event together with its parent relations.
    ///
    /// All parents are validated before anything is written, so on error
    /// the set is left exactly as it was. Duplicate parents are recorded
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`CausalError::NotForward`] if any parent is not an existing
    /// event (every existing event is earlier than the one being appended).
    pub fn append_event(&mut self, parents: &[EventId]) -> Result<EventId, CausalError> {
        let id = self.len();
        if let Some(&bad) = parents.iter().find(|&&parent| parent >= id) {
            return Err(CausalError::NotForward { from: bad, to: id });
        }

        self.successors.push(Vec::new());
        for &parent in parents {
            if let Some(successors) = self
                .successors
                .get_mut(parent)
                .filter(|successors| !successors.contains(&id))
            {
                successors.push(id);
            }
        }
        Ok(id)
    }

    /// Return the direct successors of `event`, in insertion order.
    ///
    /// Unknown events have no successors.
    pub fn future_of(&self, event: EventId) -> &[EventId] {
        self.successors.get(event).map_or(&[], Vec::as_slice)
    }

    /// Return every event that directly precedes `event`, in id order.
    ///
    /// This scans the whole set; there is no reverse index.
    pub fn past_of(&self, event: EventId) -> Vec<EventId> {
        self.successors
            .iter()
            .enumerate()
            .filter(|(_, successors)| successors.contains(&event))
            .map(|(id, _)| id)
            .collect()
    }

    /// Return whether `a` and `b` are directly related in either direction.
    pub fn are_related(&self, a: EventId, b: EventId) -> bool {
        self.future_of(a).contains(&b) || self.future_of(b).contains(&a)
    }

    /// Return the total number of recorded relations.
    pub fn relation_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    /// Copy the forward relations into an ordered map.
    ///
    /// Every event has an entry, including events with no successors.
    pub fn relations(&self) -> BTreeMap<EventId, Vec<EventId>> {
        self.successors
            .iter()
            .enumerate()
            .map(|(id, successors)| (id, successors.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn set_with_events(count: usize) -> CausalSet {
        let mut set = CausalSet::new();
        for _ in 0..count {
            set.add_event();
        }
        set
    }

    #[test]
    fn events_are_dense_and_sequential() {
        let mut set = CausalSet::new();
        assert!(set.is_empty());
        assert_eq!(set.add_event(), 0);
        assert_eq!(set.add_event(), 1);
        assert_eq!(set.add_event(), 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.events().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn add_relation_is_idempotent() {
        let mut set = set_with_events(2);
        assert!(set.add_relation(0, 1).unwrap());
        assert!(!set.add_relation(0, 1).unwrap());
        assert_eq!(set.future_of(0), &[1]);
        assert_eq!(set.relation_count(), 1);
    }

    #[test]
    fn backward_and_self_relations_are_rejected() {
        let mut set = set_with_events(3);
        assert_eq!(
            set.add_relation(2, 1),
            Err(CausalError::NotForward { from: 2, to: 1 })
        );
        assert_eq!(
            set.add_relation(1, 1),
            Err(CausalError::NotForward { from: 1, to: 1 })
        );
        assert_eq!(set.relation_count(), 0);
    }

    #[test]
    fn relation_to_unknown_event_is_rejected() {
        let mut set = set_with_events(2);
        assert_eq!(
            set.add_relation(0, 5),
            Err(CausalError::UnknownEvent { event: 5, len: 2 })
        );
    }

    #[test]
    fn future_of_keeps_insertion_order() {
        let mut set = set_with_events(4);
        set.add_relation(0, 3).unwrap();
        set.add_relation(0, 1).unwrap();
        set.add_relation(0, 2).unwrap();
        assert_eq!(set.future_of(0), &[3, 1, 2]);
        assert!(set.future_of(42).is_empty());
    }

    #[test]
    fn past_of_scans_forward_relations() {
        let mut set = set_with_events(4);
        set.add_relation(2, 3).unwrap();
        set.add_relation(0, 3).unwrap();
        set.add_relation(1, 2).unwrap();
        assert_eq!(set.past_of(3), vec![0, 2]);
        assert_eq!(set.past_of(2), vec![1]);
        assert!(set.past_of(0).is_empty());
    }

    #[test]
    fn append_event_records_parents_once() {
        let mut set = set_with_events(3);
        let id = set.append_event(&[2, 0, 2]).unwrap();
        assert_eq!(id, 3);
        assert_eq!(set.past_of(3), vec![0, 2]);
        assert_eq!(set.relation_count(), 2);
    }

    #[test]
    fn failed_append_leaves_set_untouched() {
        let mut set = set_with_events(2);
        set.add_relation(0, 1).unwrap();
        let before = set.clone();

        let result = set.append_event(&[0, 2]);
        assert_eq!(result, Err(CausalError::NotForward { from: 2, to: 2 }));
        assert_eq!(set, before);
    }

    #[test]
    fn are_related_checks_both_directions() {
        let mut set = set_with_events(3);
        set.add_relation(0, 2).unwrap();
        assert!(set.are_related(0, 2));
        assert!(set.are_related(2, 0));
        assert!(!set.are_related(0, 1));
    }

    #[test]
    fn relations_map_lists_every_event() {
        let mut set = set_with_events(3);
        set.add_relation(0, 1).unwrap();
        let relations = set.relations();
        assert_eq!(relations.len(), 3);
        assert_eq!(relations.get(&0), Some(&vec![1]));
        assert_eq!(relations.get(&2), Some(&Vec::new()));
    }

    #[test]
    fn relations_serialize_with_string_keys() {
        let mut set = set_with_events(2);
        set.add_relation(0, 1).unwrap();
        let json = serde_json::to_string(&set.relations()).unwrap();
        assert_eq!(json, r#"{"0":[1],"1":[]}"#);
    }
}
