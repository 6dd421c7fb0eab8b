//! Time source used by the throttle.
//!
//! All throttle decisions are made against UTC wall-clock timestamps taken
//! from a [`Clock`]. Production gates use [`SystemClock`]; tests drive a
//! [`ManualClock`] so that sync and async call sequences can be verified
//! against simulated time.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A source of "now" in UTC
pub trait Clock: fmt::Debug + Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests.
///
/// Clones share the same underlying time, so a clone can be handed to a
/// gate while the test keeps advancing the original. Starts at the Unix
/// epoch by default.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use throttle_gate::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now() - start, chrono::Duration::seconds(5));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + by;
    }

    /// Jump the clock to an absolute instant
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_starts_at_epoch() {
        let clock = ManualClock::default();
        assert_eq!(clock.now(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::default();
        let other = clock.clone();
        clock.advance(Duration::from_secs(42));
        assert_eq!(other.now(), clock.now());
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
