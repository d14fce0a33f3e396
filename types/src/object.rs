//! Marker for values under agreement.

use std::hash::Hash;

/// A candidate value being voted on: a block identifier, a proposal hash,
/// any cloneable, hashable, totally ordered value.
///
/// The `Default` value stands in for "no object"; it is what an empty
/// tally's `max` reports.
pub trait Object: Clone + Eq + Hash + Ord + Default {}

impl<T: Clone + Eq + Hash + Ord + Default> Object for T {}
