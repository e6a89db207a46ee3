//! Staleness tracking for the scheduled check cycle.
//!
//! [`StalenessTracker`] holds the timestamp of the most recent "scheduled
//! check starting" event and exposes it as elapsed milliseconds. Writers
//! (event handlers) and the reader (the gauge sampler) run on different
//! threads; the held timestamp is an atomically swappable cell, not a
//! lock, since every operation is a whole-value replace or read.

use arc_swap::ArcSwap;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// A source of the current wall-clock time.
///
/// Passed explicitly at construction so time-dependent arithmetic can be
/// tested with a [`ManualClock`].
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock for deterministic tests.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, TimeDelta};
/// use rudder_telemetry::staleness::{Clock, ManualClock};
///
/// let start = DateTime::from_timestamp_millis(1_000).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(TimeDelta::milliseconds(1_500));
/// assert_eq!(clock.now(), DateTime::from_timestamp_millis(2_500).unwrap());
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a manual clock reading `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Set the clock to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Tracks when the last scheduled check cycle began.
///
/// Safe under concurrent writers and a concurrent reader: the cell is
/// swapped whole, so no torn value is ever observable. The last store in
/// the cell's total order wins.
pub struct StalenessTracker {
    last_check: ArcSwap<DateTime<Utc>>,
}

impl StalenessTracker {
    /// Create a tracker initialized to `now` (the construction timestamp
    /// stands in until the first check starts).
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_check: ArcSwap::from_pointee(now),
        }
    }

    /// Record that a scheduled check cycle began at `now`.
    pub fn record_check_started(&self, now: DateTime<Utc>) {
        self.last_check.store(Arc::new(now));
    }

    /// Milliseconds elapsed between the held timestamp and `now`,
    /// clamped to zero.
    ///
    /// Pure read: never mutates, never fails. A sampler whose clock reads
    /// behind a concurrent writer's timestamp gets 0, not a negative age.
    #[must_use]
    pub fn sample(&self, now: DateTime<Utc>) -> f64 {
        let held = **self.last_check.load();
        now.signed_duration_since(held).num_milliseconds().max(0) as f64
    }
}

impl std::fmt::Debug for StalenessTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StalenessTracker")
            .field("last_check", &**self.last_check.load())
            .finish()
    }
}
