//! Time-ordered vote storage.

use accord_types::TimePoint;
use std::collections::BTreeMap;

/// An ordered-by-time multiset of observed votes.
///
/// Duplicate times and duplicate `(validator, object)` pairs are permitted;
/// idempotence is the tally's job. Events sharing a time keep their
/// insertion order. The log is only ever grown by [`VoteLog::insert`];
/// nothing trims it implicitly. Callers prune explicitly when they know a
/// cutoff is safe.
#[derive(Clone, Debug)]
pub struct VoteLog<O, V, T> {
    entries: BTreeMap<T, Vec<(V, O)>>,
    len: usize,
}

impl<O, V, T> Default for VoteLog<O, V, T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<O, V, T: TimePoint> VoteLog<O, V, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observed vote. Cheap; no validation, no deduplication.
    pub fn insert(&mut self, object: O, time: T, validator: V) {
        self.entries.entry(time).or_default().push((validator, object));
        self.len += 1;
    }

    /// Number of recorded votes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Events with `begin <= time <= end`, oldest first; same-time events in
    /// insertion order. Empty when `begin > end`.
    pub fn range(&self, begin: T, end: T) -> impl Iterator<Item = (T, &V, &O)> + '_ {
        let events = if begin <= end {
            Some(self.entries.range(begin..=end))
        } else {
            None
        };
        events
            .into_iter()
            .flatten()
            .flat_map(|(time, votes)| votes.iter().map(move |(v, o)| (*time, v, o)))
    }

    /// Drop every event observed before `cutoff`; returns how many were
    /// dropped.
    pub fn prune(&mut self, cutoff: T) -> usize {
        let kept = self.entries.split_off(&cutoff);
        let dropped: usize = self.entries.values().map(Vec::len).sum();
        self.entries = kept;
        self.len -= dropped;
        dropped
    }
}
