//! Rolling weighted tally over the active vote set.
//!
//! A [`Tally`] holds the votes currently inside the sliding window as a
//! weighted mapping from object to summed support. It is driven externally:
//! the scanner calls [`Tally::rise`] when a vote enters the window and
//! [`Tally::fall`] when it expires. Each validator owns at most one open
//! slot; a second vote for a different object while the first is still open
//! is equivocation and is reported through the fault callback without
//! touching the totals.

use accord_types::{Object, TimePoint, ValidatorId, ValidatorSet, Weight};
use std::collections::{BTreeSet, HashMap};

/// The single open vote a validator holds inside the window.
///
/// `since == T::default()` means the slot is closed.
#[derive(Clone, Debug, Default)]
struct Slot<O, T, W> {
    object: O,
    since: T,
    weight: W,
}

/// Incremental weighted ranking over the active `(validator → object)`
/// assignments.
///
/// Totals keep entries whose weight has returned to zero; observers rely on
/// seeing the "just emptied" edge. The rank index mirrors the totals map
/// entry-for-entry, ordered by weight, so `max` is a single lookup.
#[derive(Clone, Debug)]
pub struct Tally<O, V, T, W> {
    active: HashMap<V, Slot<O, T, W>>,
    totals: HashMap<O, W>,
    rank: BTreeSet<(W, O)>,
    total: W,
}

impl<O, V, T, W: Default> Default for Tally<O, V, T, W> {
    fn default() -> Self {
        Self {
            active: HashMap::new(),
            totals: HashMap::new(),
            rank: BTreeSet::new(),
            total: W::default(),
        }
    }
}

impl<O, V, T, W> Tally<O, V, T, W>
where
    O: Object,
    V: ValidatorId,
    T: TimePoint,
    W: Weight,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an active vote for `validator` on `object` at `time`.
    ///
    /// - No open slot: the slot opens with the validator's registered weight
    ///   and the totals shift up.
    /// - Open slot on the same object: the open time refreshes; weights are
    ///   untouched, so repeated votes are idempotent.
    /// - Open slot on a different object: the tally is left as-is and
    ///   `fault` is invoked with the validator. The original vote stays
    ///   authoritative until it expires.
    pub fn rise<S, F>(&mut self, time: T, validator: V, object: O, validators: &S, fault: &mut F)
    where
        S: ValidatorSet<Id = V, Weight = W>,
        F: FnMut(&V),
    {
        let slot = self.active.entry(validator.clone()).or_default();
        if slot.since != T::default() {
            if slot.object == object {
                slot.since = time;
            } else {
                fault(&validator);
            }
            return;
        }
        let weight = validators.weight(&validator);
        *slot = Slot {
            object: object.clone(),
            since: time,
            weight,
        };
        self.shift(weight, object, |total, w| total + w);
    }

    /// Close the active vote for `validator`, but only if its open slot
    /// matches both `time` and `object`.
    ///
    /// A mismatched fall is a no-op. That covers the expiry the scanner
    /// schedules for a rise that was rejected as a fault: the rejected vote
    /// never entered the totals, so its expiry must not leave them either.
    pub fn fall(&mut self, time: T, validator: &V, object: &O) {
        let Some(slot) = self.active.get_mut(validator) else {
            return;
        };
        if slot.since != time || slot.object != *object {
            return;
        }
        let weight = slot.weight;
        slot.since = T::default();
        self.shift(weight, object.clone(), |total, w| total - w);
    }

    /// The heaviest object and its weight; `(zero, default)` when nothing is
    /// ranked. Ties resolve to the greatest object in the object's own
    /// ordering.
    pub fn max(&self) -> (W, O) {
        match self.rank.iter().next_back() {
            Some((weight, object)) => (*weight, object.clone()),
            None => (W::default(), O::default()),
        }
    }

    /// Sum of all active weights.
    pub fn total(&self) -> W {
        self.total
    }

    /// Per-object totals, including entries that have drained back to zero.
    pub fn totals(&self) -> &HashMap<O, W> {
        &self.totals
    }

    /// True when no validator holds an open slot.
    pub fn is_empty(&self) -> bool {
        self.active.values().all(|slot| slot.since == T::default())
    }

    pub fn reset(&mut self) {
        self.active.clear();
        self.totals.clear();
        self.rank.clear();
        self.total = W::default();
    }

    /// Move `object`'s total by `weight` under `op`, keeping the rank index
    /// and the grand total in step.
    fn shift(&mut self, weight: W, object: O, op: impl Fn(W, W) -> W) {
        let entry = self.totals.entry(object.clone()).or_default();
        let old = *entry;
        let new = op(old, weight);
        self.rank.remove(&(old, object.clone()));
        self.rank.insert((new, object));
        *entry = new;
        self.total = op(self.total, weight);
        debug_assert_eq!(self.totals.len(), self.rank.len());
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.rank.len(), self.totals.len());
        for (weight, object) in &self.rank {
            assert_eq!(self.totals.get(object), Some(weight));
        }
        let sum = self
            .totals
            .values()
            .fold(W::default(), |acc, &w| acc + w);
        assert_eq!(sum, self.total);
    }
}
