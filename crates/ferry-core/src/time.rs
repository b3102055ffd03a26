//! Time abstractions
//!
//! The routing core never reads the system clock directly. Everything
//! time-dependent (expiry, contact suppression, origination stamps) goes
//! through the [`Clock`] trait so tests can drive a [`ManualClock`]
//! deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Nanosecond-resolution timestamp, counted from the Unix epoch.
///
/// This is the unit carried on the wire in data headers, so it is a
/// plain `u64` of nanoseconds rather than a richer calendar type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The zero timestamp.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create a timestamp from raw nanoseconds.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// Raw nanoseconds since the epoch.
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Saturating addition of a duration.
    pub fn saturating_add(&self, d: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(d.as_nanos() as u64))
    }

    /// Elapsed time since an earlier timestamp, zero if `earlier` is later.
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, d: Duration) -> Timestamp {
        self.saturating_add(d)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.0 / 1_000_000_000;
        let sub = self.0 % 1_000_000_000;
        write!(f, "{}.{:09}s", secs, sub)
    }
}

/// Clock abstraction for testability.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> Timestamp;
}

/// Real clock backed by system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Timestamp::from_nanos(elapsed.as_nanos() as u64)
    }
}

/// Manually driven clock for tests.
///
/// Cloning yields a handle to the same underlying time source, so a test
/// can hold one handle and hand another to the component under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given time.
    pub fn starting_at(at: Timestamp) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(at.as_nanos())),
        }
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, at: Timestamp) {
        self.nanos.store(at.as_nanos(), Ordering::SeqCst);
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, d: Duration) {
        self.nanos.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::from_secs(10);
        let later = t + Duration::from_secs(5);
        assert_eq!(later, Timestamp::from_secs(15));
        assert_eq!(later.saturating_since(t), Duration::from_secs(5));
        assert_eq!(t.saturating_since(later), Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Timestamp::ZERO);

        clock.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), Timestamp::from_secs(3));

        let handle = clock.clone();
        handle.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Timestamp::from_secs(4));
    }

    #[test]
    fn test_system_clock_is_nonzero() {
        let clock = SystemClock;
        assert!(clock.now() > Timestamp::ZERO);
    }

    #[test]
    fn test_timestamp_display() {
        let t = Timestamp::from_nanos(1_500_000_000);
        assert_eq!(t.to_string(), "1.500000000s");
    }
}
