use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::throttle::HostStats;

/// Mutable throttle bookkeeping for one (gate, host) pair.
///
/// The timestamp lives behind a [`tokio::sync::Mutex`]: its `try_lock` is
/// non-blocking from both sync and async contexts, and its guard may be
/// held across the awaited callable, which serializes overlapping calls to
/// the same host. The counters sit outside the lock so stats reads never
/// contend with a call in flight.
#[derive(Debug, Default)]
pub(crate) struct HostState {
    /// Lock plus last-success timestamp; the lock is held while the
    /// wrapped callable runs.
    pub(crate) lock: Arc<Mutex<ThrottleState>>,

    /// Number of calls whose body actually ran
    pub(crate) executed: AtomicU64,

    /// Number of calls skipped, either too soon or lock contention
    pub(crate) throttled: AtomicU64,
}

impl HostState {
    /// Snapshot of this host's counters
    pub(crate) fn stats(&self) -> HostStats {
        HostStats {
            executed: self.executed.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
        }
    }
}

/// State guarded by the per-host lock
#[derive(Debug, Default)]
pub(crate) struct ThrottleState {
    /// UTC time of the last execution that was allowed to run; `None`
    /// before the first call. Advanced only on non-panicking completion
    /// of the callable.
    pub(crate) last_success: Option<DateTime<Utc>>,
}

/// Decide whether a call may execute.
///
/// Shared by the sync and async paths. Forced calls and first calls always
/// run; otherwise strictly more than `interval` must have elapsed since the
/// last success. A zero interval always runs, even at the exact same
/// timestamp (where the strict comparison alone would skip).
pub(crate) fn should_run(
    last_success: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval: Duration,
    force: bool,
) -> bool {
    if force {
        return true;
    }
    let Some(last) = last_success else {
        return true;
    };
    if interval.is_zero() {
        return true;
    }
    // A clock that moved backwards counts as nothing elapsed.
    let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
    elapsed > interval
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + chrono::Duration::seconds(secs)
    }

    #[test]
    fn test_first_call_runs() {
        assert!(should_run(None, at(0), Duration::from_secs(4), false));
    }

    #[test]
    fn test_forced_call_runs() {
        assert!(should_run(
            Some(at(0)),
            at(0),
            Duration::from_secs(4),
            true
        ));
    }

    #[test]
    fn test_within_interval_skips() {
        assert!(!should_run(
            Some(at(0)),
            at(3),
            Duration::from_secs(4),
            false
        ));
    }

    #[test]
    fn test_exactly_at_interval_skips() {
        // Strict greater-than, not greater-or-equal.
        assert!(!should_run(
            Some(at(0)),
            at(4),
            Duration::from_secs(4),
            false
        ));
    }

    #[test]
    fn test_past_interval_runs() {
        assert!(should_run(
            Some(at(0)),
            at(5),
            Duration::from_secs(4),
            false
        ));
    }

    #[test]
    fn test_zero_interval_always_runs() {
        assert!(should_run(Some(at(0)), at(0), Duration::ZERO, false));
    }

    #[test]
    fn test_backwards_clock_skips() {
        assert!(!should_run(
            Some(at(10)),
            at(5),
            Duration::from_secs(4),
            false
        ));
    }
}
