use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of the owner of one independent throttle timer.
///
/// Every distinct key gets its own cooldown state inside a gate: a sensor
/// instance, a device, an account, whatever the integration considers one
/// "host". Keys are explicit; the gate never tries to infer ownership from
/// the callable it runs.
///
/// # Examples
///
/// ```
/// use throttle_gate::HostKey;
///
/// let key = HostKey::from("bedroom-thermostat");
/// assert_eq!(key.as_str(), "bedroom-thermostat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostKey(String);

impl HostKey {
    /// Create a key from any string-like value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Allocate a fresh key that no other call site uses.
    ///
    /// Used by wrappers around bare functions, where the wrapper itself
    /// stands in as the host. Keys are of the form `anonymous-N` and are
    /// unique within the process.
    #[must_use]
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(format!("anonymous-{n}"))
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the key as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for HostKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_display() {
        let key = HostKey::from("weather.home");
        assert_eq!(format!("{key}"), "weather.home");
    }

    #[test]
    fn test_host_key_hash_equality() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(HostKey::from("router"), "value");
        assert_eq!(map.get(&HostKey::new("router")), Some(&"value"));
    }

    #[test]
    fn test_unique_keys_differ() {
        assert_ne!(HostKey::unique(), HostKey::unique());
    }
}
