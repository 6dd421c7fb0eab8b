use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::ErrorKind;

/// Default minimum interval between two update executions.
///
/// Matches the conventional polling cadence of integrations that do not
/// pick their own value.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Minimum time that must elapse between two executions through a gate.
///
/// Parses from humantime strings (`"30s"`, `"2min"`, ...) and serializes
/// back to them, so integrations can read per-device cooldowns from
/// configuration files.
///
/// A zero interval is permitted and means "always execute".
///
/// # Examples
///
/// ```
/// use throttle_gate::ThrottleInterval;
/// use std::time::Duration;
///
/// let interval: ThrottleInterval = "4s".parse().unwrap();
/// assert_eq!(interval.as_duration(), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThrottleInterval(#[serde(with = "humantime_serde")] Duration);

impl ThrottleInterval {
    /// Create an interval from a plain duration
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// The interval as a [`Duration`]
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Whether this interval disables throttling entirely
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for ThrottleInterval {
    type Err = ErrorKind;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let duration = input
            .parse::<humantime::Duration>()
            .map_err(|e| ErrorKind::InvalidInterval(input.to_string(), e))?;
        Ok(Self(duration.into()))
    }
}

impl From<Duration> for ThrottleInterval {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<ThrottleInterval> for Duration {
    fn from(interval: ThrottleInterval) -> Self {
        interval.0
    }
}

impl Default for ThrottleInterval {
    /// The default interval is 30 seconds.
    fn default() -> Self {
        Self(DEFAULT_INTERVAL)
    }
}

impl fmt::Display for ThrottleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::Duration::from(self.0))
    }
}
