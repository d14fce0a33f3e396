//! Ordered sweep over a vote log.
//!
//! [`sweep`] replays the log across `[begin, end]`, feeding the tally in
//! time order. Two cursors advance left to right over the same event range:
//! `upper` applies rises, `lower` applies the matching window expirations at
//! `time + window`. Neither stream is materialised. After each batch of
//! simultaneous events the edge callback fires with the instant and the
//! tally, so the number of callbacks is bounded by the number of distinct
//! event times, not the number of votes.
//!
//! Faults are reported from the rise path only; an expiry can never
//! equivocate.

use crate::log::VoteLog;
use crate::tally::Tally;
use accord_types::{Object, TimePoint, ValidatorId, ValidatorSet, Weight};

/// Sweep `log` across `[begin, end]`, driving `tally` and emitting `edge`
/// at every distinct event boundary.
///
/// The tally carries whatever state the caller wants to start from,
/// usually fresh.
pub fn sweep<O, V, T, W, S, E, F>(
    log: &VoteLog<O, V, T>,
    tally: &mut Tally<O, V, T, W>,
    window: T::Span,
    begin: T,
    end: T,
    validators: &S,
    edge: &mut E,
    fault: &mut F,
) where
    O: Object,
    V: ValidatorId,
    T: TimePoint,
    W: Weight,
    S: ValidatorSet<Id = V, Weight = W>,
    E: FnMut(T, &Tally<O, V, T, W>),
    F: FnMut(&V),
{
    let mut upper = log.range(begin, end).peekable();
    let mut lower = log.range(begin, end).peekable();

    while let Some((time, validator, object)) = upper.next() {
        // Expirations due at or before this rise come first.
        while let Some((fell, validator, object)) =
            lower.next_if(|&(opened, _, _)| opened.advance(window) <= time)
        {
            tally.fall(fell, validator, object);
            if lower.peek().map_or(true, |&(next, _, _)| next != fell) {
                edge(fell.advance(window), &*tally);
            }
        }
        tally.rise(time, validator.clone(), object.clone(), validators, fault);
        if upper.peek().map_or(true, |&(next, _, _)| next != time) {
            edge(time, &*tally);
        }
    }

    // Drain expirations that land strictly inside the interval's tail.
    while let Some((fell, validator, object)) =
        lower.next_if(|&(opened, _, _)| opened.advance(window) < end)
    {
        tally.fall(fell, validator, object);
        if lower.peek().map_or(true, |&(next, _, _)| next != fell) {
            edge(fell.advance(window), &*tally);
        }
    }
}
