use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::throttle::ThrottleInterval;
use crate::{ErrorKind, Result};

/// Throttle settings as integrations read them from configuration.
///
/// # Examples
///
/// ```
/// use throttle_gate::ThrottleConfig;
/// use std::time::Duration;
///
/// let config: ThrottleConfig = toml::from_str(
///     r#"
///     interval = "4s"
///     forced_interval = "2s"
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.interval.as_duration(), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    /// Minimum interval between normal update executions
    #[serde(default)]
    pub interval: ThrottleInterval,

    /// Shorter minimum interval applied only to forced calls. When absent,
    /// forced calls bypass the throttle entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_interval: Option<ThrottleInterval>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval: ThrottleInterval::default(),
            forced_interval: None,
        }
    }
}

impl ThrottleConfig {
    /// Config with only a normal interval
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.into(),
            forced_interval: None,
        }
    }

    /// Config with a normal interval and a faster forced tier
    #[must_use]
    pub fn with_forced_interval(interval: Duration, forced: Duration) -> Self {
        Self {
            interval: interval.into(),
            forced_interval: Some(forced.into()),
        }
    }

    /// Check that the forced tier, if present, is strictly shorter than the
    /// normal interval.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ForcedIntervalNotShorter`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if let Some(forced) = self.forced_interval {
            if forced >= self.interval {
                return Err(ErrorKind::ForcedIntervalNotShorter {
                    forced: forced.as_duration(),
                    interval: self.interval.as_duration(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_full_config() {
        let config: ThrottleConfig = toml::from_str(
            r#"
            interval = "4s"
            forced_interval = "2s"
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            ThrottleConfig::with_forced_interval(
                Duration::from_secs(4),
                Duration::from_secs(2)
            )
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ThrottleConfig = toml::from_str("").unwrap();
        assert_eq!(config, ThrottleConfig::default());
        assert_eq!(config.interval.as_duration(), Duration::from_secs(30));
        assert_eq!(config.forced_interval, None);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = toml::from_str::<ThrottleConfig>("cooldown = \"4s\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_shorter_forced_tier() {
        let config =
            ThrottleConfig::with_forced_interval(Duration::from_secs(4), Duration::from_secs(2));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_equal_forced_tier() {
        let config =
            ThrottleConfig::with_forced_interval(Duration::from_secs(4), Duration::from_secs(4));
        assert_eq!(
            config.validate(),
            Err(ErrorKind::ForcedIntervalNotShorter {
                forced: Duration::from_secs(4),
                interval: Duration::from_secs(4),
            })
        );
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config =
            ThrottleConfig::with_forced_interval(Duration::from_secs(90), Duration::from_secs(10));
        let encoded = toml::to_string(&config).unwrap();
        let decoded: ThrottleConfig = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
