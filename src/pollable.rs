//! The update contract that polling integrations implement.
//!
//! An update is one cycle of "talk to the device or service, refresh the
//! internal state", triggered by an external scheduler. The throttle never
//! interprets what an update does; it only decides whether the cycle runs.
//! Integrations must tolerate the skipped (`None`) path without failing,
//! since most poll cycles inside the cooldown are skipped by design.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::throttle::{HostKey, ThrottleConfig, ThrottleGate};

/// One synchronous update cycle.
///
/// Implementations perform I/O and mutate their own state as a side
/// effect. The returned success indicator is passed through to the caller
/// and largely ignored by convention.
pub trait Pollable {
    /// Refresh state; returns whether the update succeeded
    fn poll_update(&mut self) -> bool;
}

/// One asynchronous update cycle; see [`Pollable`]
#[async_trait]
pub trait AsyncPollable {
    /// Refresh state; returns whether the update succeeded
    async fn poll_update(&mut self) -> bool;
}

/// A pollable bound to a gate and a host key.
///
/// This is the construction-time idiom: an integration wraps its update
/// implementation with an interval that is often only known at runtime
/// (per-device configuration), then hands `update`/`force_update` to its
/// scheduler.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use throttle_gate::{Pollable, ThrottledPoller};
///
/// struct Tracker {
///     packages: u32,
/// }
///
/// impl Pollable for Tracker {
///     fn poll_update(&mut self) -> bool {
///         self.packages += 1; // stands in for network I/O
///         true
///     }
/// }
///
/// let mut poller = ThrottledPoller::new(Duration::from_secs(30), Tracker { packages: 0 });
/// assert_eq!(poller.update(), Some(true));
/// assert_eq!(poller.update(), None); // inside the cooldown
/// assert_eq!(poller.get_ref().packages, 1);
/// ```
pub struct ThrottledPoller<P> {
    gate: Arc<ThrottleGate>,
    host: HostKey,
    inner: P,
}

impl<P> ThrottledPoller<P> {
    /// Throttle `inner` with a private gate; the poller is its own host.
    pub fn new(min_interval: Duration, inner: P) -> Self {
        Self::with_gate(
            Arc::new(ThrottleGate::new(min_interval)),
            HostKey::unique(),
            inner,
        )
    }

    /// Throttle `inner` with a private gate built from deserialized
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn from_config(config: &ThrottleConfig, inner: P) -> Result<Self> {
        Ok(Self::with_gate(
            Arc::new(ThrottleGate::from_config(config)?),
            HostKey::unique(),
            inner,
        ))
    }

    /// Throttle `inner` against a shared gate under an explicit host key
    pub fn with_gate(gate: Arc<ThrottleGate>, host: HostKey, inner: P) -> Self {
        Self { gate, host, inner }
    }

    /// Borrow the wrapped pollable
    #[must_use]
    pub fn get_ref(&self) -> &P {
        &self.inner
    }

    /// Mutably borrow the wrapped pollable, bypassing the throttle
    pub fn get_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    /// Unwrap the pollable, discarding the throttle state
    #[must_use]
    pub fn into_inner(self) -> P {
        self.inner
    }

    /// The host key this poller throttles under
    #[must_use]
    pub fn host(&self) -> &HostKey {
        &self.host
    }
}

impl<P: Pollable> ThrottledPoller<P> {
    /// Run one update cycle unless throttled
    pub fn update(&mut self) -> Option<bool> {
        let inner = &mut self.inner;
        self.gate.call(&self.host, false, || inner.poll_update())
    }

    /// Run one update cycle with the `no_throttle` override
    pub fn force_update(&mut self) -> Option<bool> {
        let inner = &mut self.inner;
        self.gate.call(&self.host, true, || inner.poll_update())
    }
}

impl<P: AsyncPollable + Send> ThrottledPoller<P> {
    /// Run one async update cycle unless throttled
    pub async fn update_async(&mut self) -> Option<bool> {
        let inner = &mut self.inner;
        self.gate
            .call_async(&self.host, false, || inner.poll_update())
            .await
    }

    /// Run one async update cycle with the `no_throttle` override
    pub async fn force_update_async(&mut self) -> Option<bool> {
        let inner = &mut self.inner;
        self.gate
            .call_async(&self.host, true, || inner.poll_update())
            .await
    }
}

impl<P: fmt::Debug> fmt::Debug for ThrottledPoller<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledPoller")
            .field("gate", &self.gate)
            .field("host", &self.host)
            .field("inner", &self.inner)
            .finish()
    }
}
