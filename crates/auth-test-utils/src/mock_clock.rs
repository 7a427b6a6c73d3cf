//! Controllable clock for expiry and cache tests.
//!
//! # Example
//!
//! ```rust,ignore
//! let clock = Arc::new(MockClock::new());
//! let provider = SecurityContextProvider::new(gateway, cache, clock.clone(), principal);
//!
//! clock.advance_secs(3600);
//! assert_eq!(clock.read_count(), 2);
//! ```

use crate::test_ids::TEST_INSTANT_UNIX;
use chrono::{DateTime, TimeDelta, Utc};
use common::clock::Clock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Clock that only moves when told to, and counts how often it is read.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
    reads: AtomicUsize,
}

impl MockClock {
    /// Clock pinned to [`TEST_INSTANT_UNIX`].
    #[must_use]
    pub fn new() -> Self {
        Self::at(DateTime::from_timestamp(TEST_INSTANT_UNIX, 0).unwrap_or_default())
    }

    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            reads: AtomicUsize::new(0),
        }
    }

    /// Current value without counting a read.
    pub fn peek(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    pub fn advance_secs(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    /// Number of `now_utc` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.peek()
    }
}
