use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

use crate::clock::{Clock, SystemClock};
use crate::throttle::state::{HostState, ThrottleState, should_run};
use crate::throttle::{HostKey, HostStats, ThrottleConfig, ThrottleInterval};
use crate::Result;

/// A reusable rate-limit policy over a set of independent hosts.
///
/// The gate limits how often a wrapped callable's body actually executes:
/// per host, at most one execution within `min_interval`, with calls that
/// arrive too soon (or while another call for the same host is in flight)
/// returning `None` instead of running. Skipped calls are never queued or
/// retried; the caller's own scheduler is expected to poll again later.
///
/// Forced calls bypass the normal interval. If the gate was built with a
/// forced interval, they are instead gated by a nested inner tier with its
/// own, independent per-host timers.
///
/// Host state is kept in an explicit side table keyed by [`HostKey`];
/// entries are created lazily on first use and live until [`forget`] is
/// called.
///
/// [`forget`]: ThrottleGate::forget
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use throttle_gate::{HostKey, ThrottleGate};
///
/// let gate = ThrottleGate::new(Duration::from_secs(30));
/// let host = HostKey::from("living-room-sensor");
///
/// // First call runs, immediate second call is throttled.
/// assert_eq!(gate.call(&host, false, || 21 * 2), Some(42));
/// assert_eq!(gate.call(&host, false, || 21 * 2), None);
/// ```
#[derive(Debug)]
pub struct ThrottleGate {
    /// Minimum time between two successful executions for one host
    interval: ThrottleInterval,

    /// Gate applied to forced calls in place of unconditional execution
    forced: Option<Box<ThrottleGate>>,

    /// Per-host throttle state, created on demand
    hosts: DashMap<HostKey, Arc<HostState>>,

    /// Source of UTC "now"
    clock: Arc<dyn Clock>,
}

impl ThrottleGate {
    /// Create a gate with the given minimum interval between executions.
    ///
    /// Forced calls bypass the interval entirely.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            interval: min_interval.into(),
            forced: None,
            hosts: DashMap::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a gate with a normal interval and a faster tier for forced
    /// calls.
    ///
    /// Forced calls are then rate-limited against `forced_min_interval`
    /// on timers independent from the normal ones.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::ForcedIntervalNotShorter`] if
    /// `forced_min_interval` is not strictly shorter than `min_interval`.
    pub fn with_forced_interval(
        min_interval: Duration,
        forced_min_interval: Duration,
    ) -> Result<Self> {
        Self::from_config(&ThrottleConfig::with_forced_interval(
            min_interval,
            forced_min_interval,
        ))
    }

    /// Build a gate from deserialized settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::ForcedIntervalNotShorter`] if the config
    /// does not validate.
    pub fn from_config(config: &ThrottleConfig) -> Result<Self> {
        config.validate()?;
        let mut gate = Self::new(config.interval.as_duration());
        gate.forced = config
            .forced_interval
            .map(|forced| Box::new(Self::new(forced.as_duration())));
        Ok(gate)
    }

    /// Replace the time source, e.g. with a
    /// [`ManualClock`](crate::ManualClock) in tests.
    ///
    /// Applies to the forced tier as well.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.forced = self
            .forced
            .take()
            .map(|forced| Box::new(forced.with_clock(Arc::clone(&clock))));
        self.clock = clock;
        self
    }

    /// The minimum interval between normal executions
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.interval.as_duration()
    }

    /// The minimum interval between forced executions, if configured
    #[must_use]
    pub fn forced_min_interval(&self) -> Option<Duration> {
        self.forced.as_deref().map(ThrottleGate::min_interval)
    }

    /// Run `f` for `host` unless throttled.
    ///
    /// Returns `Some` with `f`'s result when the body executed, `None`
    /// when the call was skipped. A `force` call bypasses the normal
    /// interval; with a forced tier configured it is gated by that tier
    /// instead.
    ///
    /// The per-host lock is held while `f` runs, so an overlapping call
    /// for the same host is skipped rather than run concurrently. If `f`
    /// panics, the panic propagates, the lock is released, and the last
    /// success timestamp is not advanced. A callable that reports failure
    /// through its return value still counts as an execution.
    pub fn call<T, F>(&self, host: &HostKey, force: bool, f: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let (state, guard) = self.try_acquire(host)?;
        if force {
            if let Some(forced) = &self.forced {
                // Keep the outer guard held so normal and forced calls to
                // one host never run concurrently.
                let (forced_state, forced_guard) = forced.try_acquire(host)?;
                return forced.execute(&forced_state, forced_guard, false, f);
            }
        }
        self.execute(&state, guard, force, f)
    }

    /// Async counterpart of [`call`](ThrottleGate::call).
    ///
    /// `f` is awaited while the per-host lock is held; the gate itself
    /// never blocks the event loop, since the lock is try-acquired. If the
    /// returned future is dropped mid-flight, the lock is released and the
    /// last success timestamp is not advanced.
    pub async fn call_async<T, F, Fut>(&self, host: &HostKey, force: bool, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let (state, guard) = self.try_acquire(host)?;
        if force {
            if let Some(forced) = &self.forced {
                // Outer guard stays held across the forced tier.
                let (forced_state, forced_guard) = forced.try_acquire(host)?;
                return forced
                    .execute_async(&forced_state, forced_guard, false, f)
                    .await;
            }
        }
        self.execute_async(&state, guard, force, f).await
    }

    /// Call counters for one host, summed over the normal and forced tiers
    #[must_use]
    pub fn host_stats(&self, host: &HostKey) -> HostStats {
        let mut stats = self
            .hosts
            .get(host)
            .map(|state| state.stats())
            .unwrap_or_default();
        if let Some(forced) = &self.forced {
            stats.merge(forced.host_stats(host));
        }
        stats
    }

    /// Call counters for every host this gate has seen
    #[must_use]
    pub fn all_host_stats(&self) -> HashMap<HostKey, HostStats> {
        let mut all: HashMap<HostKey, HostStats> = self
            .hosts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect();
        if let Some(forced) = &self.forced {
            for (host, stats) in forced.all_host_stats() {
                all.entry(host).or_default().merge(stats);
            }
        }
        all
    }

    /// Number of hosts with live throttle state
    #[must_use]
    pub fn active_host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Drop all throttle state for a host.
    ///
    /// The cleanup hook for integrations that retire an owner; the next
    /// call for the same key starts from a clean never-called state.
    /// Returns whether any state existed.
    pub fn forget(&self, host: &HostKey) -> bool {
        let removed = self.hosts.remove(host).is_some();
        let removed_forced = self
            .forced
            .as_ref()
            .is_some_and(|forced| forced.forget(host));
        removed || removed_forced
    }

    /// Get or lazily create the state for a host and try to take its lock.
    ///
    /// Returns `None` on contention, which counts as a throttled call.
    fn try_acquire(
        &self,
        host: &HostKey,
    ) -> Option<(Arc<HostState>, OwnedMutexGuard<ThrottleState>)> {
        let state = self.host_state(host);
        match state.lock.clone().try_lock_owned() {
            Ok(guard) => Some((state, guard)),
            Err(_) => {
                state.throttled.fetch_add(1, Ordering::Relaxed);
                log::trace!("update for host `{host}` skipped, another call is in flight");
                None
            }
        }
    }

    fn host_state(&self, host: &HostKey) -> Arc<HostState> {
        if let Some(state) = self.hosts.get(host) {
            return Arc::clone(&state);
        }
        Arc::clone(&self.hosts.entry(host.clone()).or_default())
    }

    fn execute<T, F>(
        &self,
        state: &HostState,
        mut guard: OwnedMutexGuard<ThrottleState>,
        force: bool,
        f: F,
    ) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let now = self.clock.now();
        if !should_run(guard.last_success, now, self.interval.as_duration(), force) {
            state.throttled.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "update skipped, last success at {:?} is within {}",
                guard.last_success,
                self.interval
            );
            return None;
        }
        let result = f();
        // Timestamp taken after the callable returned; a panic above never
        // reaches this line, so a failed update retries next interval.
        guard.last_success = Some(self.clock.now());
        state.executed.fetch_add(1, Ordering::Relaxed);
        Some(result)
    }

    async fn execute_async<T, F, Fut>(
        &self,
        state: &HostState,
        mut guard: OwnedMutexGuard<ThrottleState>,
        force: bool,
        f: F,
    ) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let now = self.clock.now();
        if !should_run(guard.last_success, now, self.interval.as_duration(), force) {
            state.throttled.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "update skipped, last success at {:?} is within {}",
                guard.last_success,
                self.interval
            );
            return None;
        }
        let result = f().await;
        guard.last_success = Some(self.clock.now());
        state.executed.fetch_add(1, Ordering::Relaxed);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use pretty_assertions::assert_eq;

    fn test_gate(min_interval: Duration) -> (ThrottleGate, ManualClock) {
        let clock = ManualClock::default();
        let gate = ThrottleGate::new(min_interval).with_clock(Arc::new(clock.clone()));
        (gate, clock)
    }

    #[test]
    fn test_first_call_executes() {
        let (gate, _clock) = test_gate(Duration::from_secs(4));
        let host = HostKey::from("sensor");
        assert_eq!(gate.call(&host, false, || "data"), Some("data"));
    }

    #[test]
    fn test_second_call_within_interval_is_skipped() {
        let (gate, clock) = test_gate(Duration::from_secs(4));
        let host = HostKey::from("sensor");
        assert_eq!(gate.call(&host, false, || 1), Some(1));
        clock.advance(Duration::from_secs(3));
        assert_eq!(gate.call(&host, false, || 1), None);
    }

    #[test]
    fn test_call_after_interval_executes() {
        let (gate, clock) = test_gate(Duration::from_secs(4));
        let host = HostKey::from("sensor");
        assert_eq!(gate.call(&host, false, || 1), Some(1));
        clock.advance(Duration::from_secs(5));
        assert_eq!(gate.call(&host, false, || 2), Some(2));
    }

    #[test]
    fn test_zero_interval_never_throttles() {
        let (gate, _clock) = test_gate(Duration::ZERO);
        let host = HostKey::from("sensor");
        assert_eq!(gate.call(&host, false, || 1), Some(1));
        assert_eq!(gate.call(&host, false, || 2), Some(2));
    }

    #[test]
    fn test_hosts_are_independent() {
        let (gate, _clock) = test_gate(Duration::from_secs(4));
        let first = HostKey::from("one");
        let second = HostKey::from("two");
        assert_eq!(gate.call(&first, false, || 1), Some(1));
        assert_eq!(gate.call(&first, false, || 1), None);
        assert_eq!(gate.call(&second, false, || 2), Some(2));
    }

    #[test]
    fn test_forced_interval_must_be_shorter() {
        let result =
            ThrottleGate::with_forced_interval(Duration::from_secs(2), Duration::from_secs(4));
        assert!(result.is_err());
    }

    #[test]
    fn test_intervals_are_reported() {
        let gate =
            ThrottleGate::with_forced_interval(Duration::from_secs(4), Duration::from_secs(2))
                .unwrap();
        assert_eq!(gate.min_interval(), Duration::from_secs(4));
        assert_eq!(gate.forced_min_interval(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_forget_resets_host() {
        let (gate, _clock) = test_gate(Duration::from_secs(4));
        let host = HostKey::from("sensor");
        assert_eq!(gate.call(&host, false, || 1), Some(1));
        assert_eq!(gate.call(&host, false, || 1), None);
        assert!(gate.forget(&host));
        // Clean never-called state again.
        assert_eq!(gate.call(&host, false, || 2), Some(2));
        assert!(!gate.forget(&HostKey::from("unknown")));
    }

    #[test]
    fn test_host_stats_count_outcomes() {
        let (gate, clock) = test_gate(Duration::from_secs(4));
        let host = HostKey::from("sensor");
        gate.call(&host, false, || ());
        gate.call(&host, false, || ());
        clock.advance(Duration::from_secs(5));
        gate.call(&host, false, || ());
        let stats = gate.host_stats(&host);
        assert_eq!(
            stats,
            HostStats {
                executed: 2,
                throttled: 1,
            }
        );
        assert_eq!(gate.active_host_count(), 1);
        assert_eq!(gate.all_host_stats().get(&host), Some(&stats));
    }

    #[tokio::test]
    async fn test_async_call_executes_and_throttles() {
        let (gate, clock) = test_gate(Duration::from_secs(4));
        let host = HostKey::from("sensor");
        assert_eq!(gate.call_async(&host, false, || async { 1 }).await, Some(1));
        assert_eq!(gate.call_async(&host, false, || async { 1 }).await, None);
        clock.advance(Duration::from_secs(5));
        assert_eq!(gate.call_async(&host, false, || async { 2 }).await, Some(2));
    }
}
