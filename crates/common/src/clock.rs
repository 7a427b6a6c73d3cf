//! Injectable time source and kind-flagged timestamps.
//!
//! Every expiry decision in the security crates reads "now" through a
//! [`Clock`] so tests can pin or advance time deterministically.
//!
//! Timestamps that arrive from outside (token claims, gateway responses,
//! caller input) may carry local wall-clock time rather than UTC. They are
//! represented as a [`TaggedDateTime`]: a naive date-time plus an explicit
//! [`DateTimeKind`] flag. [`TaggedDateTime::to_utc`] applies the normalization
//! rule verbatim:
//!
//! - `Utc`: the value is already UTC, returned unchanged
//! - `Local` / `Unspecified`: the value is host-local wall time, converted to UTC
//!
//! The flag is trusted as given. A wrongly flagged value is normalized
//! according to its flag, nothing more.
//!
//! # Example
//!
//! ```rust
//! use common::clock::{Clock, SystemClock, TaggedDateTime};
//!
//! let clock = SystemClock;
//! let now = clock.now_utc();
//! let tagged = TaggedDateTime::utc(now);
//! assert_eq!(tagged.to_utc(), now);
//! ```

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use std::fmt;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// How a [`TaggedDateTime`] value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    /// The value is UTC.
    Utc,
    /// The value is wall-clock time in the host's local time zone.
    Local,
    /// No zone information. Normalized the same way as `Local`.
    Unspecified,
}

/// A date-time carrying an explicit kind flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaggedDateTime {
    value: NaiveDateTime,
    kind: DateTimeKind,
}

impl TaggedDateTime {
    /// Create a timestamp from a naive value and its kind.
    #[must_use]
    pub fn new(value: NaiveDateTime, kind: DateTimeKind) -> Self {
        Self { value, kind }
    }

    /// Create a UTC-flagged timestamp.
    #[must_use]
    pub fn utc(instant: DateTime<Utc>) -> Self {
        Self::new(instant.naive_utc(), DateTimeKind::Utc)
    }

    /// Create a local-flagged timestamp from host-local wall time.
    #[must_use]
    pub fn local(value: NaiveDateTime) -> Self {
        Self::new(value, DateTimeKind::Local)
    }

    /// Create a UTC-flagged timestamp from Unix epoch seconds.
    ///
    /// Returns `None` when the value is outside the representable range.
    #[must_use]
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::utc)
    }

    /// The raw, un-normalized value.
    #[must_use]
    pub fn value(&self) -> NaiveDateTime {
        self.value
    }

    /// The kind flag.
    #[must_use]
    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// Normalize to a UTC instant.
    ///
    /// UTC-flagged values are returned as-is; everything else is converted
    /// from host-local time.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self.kind {
            DateTimeKind::Utc => self.value.and_utc(),
            DateTimeKind::Local | DateTimeKind::Unspecified => local_to_utc(self.value),
        }
    }
}

impl From<DateTime<Utc>> for TaggedDateTime {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::utc(instant)
    }
}

impl fmt::Display for TaggedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.value, self.kind)
    }
}

fn local_to_utc(value: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&value) {
        LocalResult::Single(local) => local.with_timezone(&Utc),
        // Repeated wall-clock hour at a DST fall-back: take the first occurrence
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Skipped wall-clock hour at a DST spring-forward: apply the offset in
        // effect at that UTC reading
        LocalResult::None => {
            let offset = Local.offset_from_utc_datetime(&value);
            (value - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}
