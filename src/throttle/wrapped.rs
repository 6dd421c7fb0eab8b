use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::throttle::{HostKey, ThrottleConfig, ThrottleGate};

/// A synchronous callable bound to a gate and a host key.
///
/// The decorator form of the throttle: the wrapper owns the callable and
/// the timer, so plain update functions can be throttled without managing
/// a gate and key at every call site. Built with [`Throttled::new`] the
/// wrapper is its own host (fresh anonymous key, private gate); built with
/// [`Throttled::with_gate`] it shares a gate, which is how integrations
/// attach a per-instance interval chosen at construction time.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use throttle_gate::Throttled;
///
/// let mut calls = 0;
/// let mut update = Throttled::new(Duration::from_secs(30), move || {
///     calls += 1;
///     calls
/// });
///
/// assert_eq!(update.call(), Some(1));
/// assert_eq!(update.call(), None);
/// assert_eq!(update.call_forced(), Some(2));
/// ```
pub struct Throttled<F> {
    gate: Arc<ThrottleGate>,
    host: HostKey,
    f: F,
}

impl<F> Throttled<F> {
    /// Wrap `f` with a private gate; the wrapper stands in as host.
    pub fn new(min_interval: Duration, f: F) -> Self {
        Self::with_gate(Arc::new(ThrottleGate::new(min_interval)), HostKey::unique(), f)
    }

    /// Wrap `f` with a private gate built from deserialized settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn from_config(config: &ThrottleConfig, f: F) -> Result<Self> {
        Ok(Self::with_gate(
            Arc::new(ThrottleGate::from_config(config)?),
            HostKey::unique(),
            f,
        ))
    }

    /// Wrap `f` against a shared gate under an explicit host key
    pub fn with_gate(gate: Arc<ThrottleGate>, host: HostKey, f: F) -> Self {
        Self { gate, host, f }
    }

    /// Run the callable unless throttled
    pub fn call<T>(&mut self) -> Option<T>
    where
        F: FnMut() -> T,
    {
        let f = &mut self.f;
        self.gate.call(&self.host, false, || f())
    }

    /// Run the callable with the `no_throttle` override
    pub fn call_forced<T>(&mut self) -> Option<T>
    where
        F: FnMut() -> T,
    {
        let f = &mut self.f;
        self.gate.call(&self.host, true, || f())
    }

    /// The host key this wrapper throttles under
    #[must_use]
    pub fn host(&self) -> &HostKey {
        &self.host
    }

    /// The gate backing this wrapper
    #[must_use]
    pub fn gate(&self) -> &ThrottleGate {
        &self.gate
    }
}

impl<F> fmt::Debug for Throttled<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("gate", &self.gate)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Async counterpart of [`Throttled`], for coroutine-style update
/// callables. Same calling convention, awaited body, same skip semantics.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use throttle_gate::ThrottledAsync;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut update = ThrottledAsync::new(Duration::from_secs(30), || async { "fresh" });
///
/// assert_eq!(update.call().await, Some("fresh"));
/// assert_eq!(update.call().await, None);
/// # }
/// ```
pub struct ThrottledAsync<F> {
    gate: Arc<ThrottleGate>,
    host: HostKey,
    f: F,
}

impl<F> ThrottledAsync<F> {
    /// Wrap `f` with a private gate; the wrapper stands in as host.
    pub fn new(min_interval: Duration, f: F) -> Self {
        Self::with_gate(Arc::new(ThrottleGate::new(min_interval)), HostKey::unique(), f)
    }

    /// Wrap `f` with a private gate built from deserialized settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn from_config(config: &ThrottleConfig, f: F) -> Result<Self> {
        Ok(Self::with_gate(
            Arc::new(ThrottleGate::from_config(config)?),
            HostKey::unique(),
            f,
        ))
    }

    /// Wrap `f` against a shared gate under an explicit host key
    pub fn with_gate(gate: Arc<ThrottleGate>, host: HostKey, f: F) -> Self {
        Self { gate, host, f }
    }

    /// Run and await the callable unless throttled
    pub async fn call<T, Fut>(&mut self) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
    {
        let f = &mut self.f;
        self.gate.call_async(&self.host, false, || f()).await
    }

    /// Run and await the callable with the `no_throttle` override
    pub async fn call_forced<T, Fut>(&mut self) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
    {
        let f = &mut self.f;
        self.gate.call_async(&self.host, true, || f()).await
    }

    /// The host key this wrapper throttles under
    #[must_use]
    pub fn host(&self) -> &HostKey {
        &self.host
    }

    /// The gate backing this wrapper
    #[must_use]
    pub fn gate(&self) -> &ThrottleGate {
        &self.gate
    }
}

impl<F> fmt::Debug for ThrottledAsync<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledAsync")
            .field("gate", &self.gate)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
