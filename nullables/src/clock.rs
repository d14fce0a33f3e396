//! Nullable clocks — deterministic time for testing.

use accord_types::{Clock, Timestamp};
use std::cell::Cell;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_millis: u64) -> Self {
        Self {
            current: Cell::new(initial_millis),
        }
    }

    /// Advance time by a number of milliseconds.
    pub fn advance(&self, millis: u64) {
        self.current.set(self.current.get() + millis);
    }

    /// Set the time to a specific value.
    pub fn set(&self, millis: u64) {
        self.current.set(millis);
    }
}

impl Clock for NullClock {
    type Instant = Timestamp;

    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.current.get())
    }
}

/// A clock that steps forward by a fixed amount on every `now()` call.
///
/// Handy when a test needs a stream of distinct, reproducible instants
/// without threading a counter through.
pub struct SteppingClock {
    current: Cell<u64>,
    step: u64,
}

impl SteppingClock {
    pub fn new(initial_millis: u64, step: u64) -> Self {
        Self {
            current: Cell::new(initial_millis),
            step,
        }
    }
}

impl Clock for SteppingClock {
    type Instant = Timestamp;

    fn now(&self) -> Timestamp {
        let now = self.current.get();
        self.current.set(now + self.step);
        Timestamp::from_millis(now)
    }
}
