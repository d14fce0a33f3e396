//! Timeline contracts and the default millisecond timestamp.
//!
//! The voting core never reads a wall clock on its own: every sweep takes
//! explicit `[begin, end]` instants and `vote` takes an explicit `now`.
//! [`Clock`] exists for the one convenience entry point that samples time on
//! the caller's behalf, and so tests can substitute a deterministic source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point on a totally ordered timeline.
///
/// The `Default` value is the epoch; the core also uses it as the "never"
/// sentinel (a tally slot whose open time is the default holds no vote, a
/// node whose mark time is the default has never been marked).
pub trait TimePoint: Copy + Ord + Default + fmt::Debug {
    /// The difference between two points on this timeline.
    type Span: Copy + Ord + Default + Add<Output = Self::Span> + fmt::Debug;

    /// The latest representable point.
    const MAX: Self;

    /// This point moved `span` later.
    fn advance(self, span: Self::Span) -> Self;

    /// This point moved `span` earlier, saturating at the epoch.
    fn rewind(self, span: Self::Span) -> Self;

    /// Span elapsed from `earlier` to `self`, saturating at zero.
    fn since(self, earlier: Self) -> Self::Span;
}

/// Milliseconds since the Unix epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// The current system time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl TimePoint for Timestamp {
    type Span = u64;

    const MAX: Self = Self(u64::MAX);

    fn advance(self, span: u64) -> Self {
        Self(self.0.saturating_add(span))
    }

    fn rewind(self, span: u64) -> Self {
        Self(self.0.saturating_sub(span))
    }

    fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    /// Raw millisecond count, no unit suffix. Keeps CSV edge dumps
    /// machine-readable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pluggable source of the current instant.
pub trait Clock {
    type Instant: TimePoint;

    fn now(&self) -> Self::Instant;
}

/// Wall-clock time as a [`Timestamp`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = Timestamp;

    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
