use serde::Serialize;

/// Call counters for one host within a gate.
///
/// `executed` counts calls whose body ran; `throttled` counts skips, both
/// "too soon" and lock-contention ones (the gate does not distinguish).
/// For gates with a forced tier, the reported stats are the sum over both
/// tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    /// Calls that actually ran the wrapped callable
    pub executed: u64,

    /// Calls that returned the throttled sentinel
    pub throttled: u64,
}

impl HostStats {
    /// Total number of calls seen for this host
    #[must_use]
    pub const fn total_calls(&self) -> u64 {
        self.executed + self.throttled
    }

    /// Fold another tier's counters into this one
    pub(crate) fn merge(&mut self, other: Self) {
        self.executed += other.executed;
        self.throttled += other.throttled;
    }
}
