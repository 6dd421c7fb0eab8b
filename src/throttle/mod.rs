//! Per-host update throttling.
//!
//! This module provides the call gate that rate-limits how often polling
//! update callables actually run, on independent timers per host.
//!
//! # Architecture
//!
//! - [`HostKey`]: explicit, opaque identity of one throttle timer's owner
//! - [`ThrottleGate`]: the gate itself; per-host lazy state, non-blocking
//!   try-lock, forced override with an optional faster tier
//! - [`ThrottleInterval`] / [`ThrottleConfig`]: durations as integrations
//!   parse them from configuration
//! - [`Throttled`] / [`ThrottledAsync`]: decorator-style wrappers binding
//!   a callable to a gate and key
//! - [`HostStats`]: per-host executed/throttled counters

mod config;
mod gate;
mod interval;
mod key;
mod state;
mod stats;
mod wrapped;

pub use config::ThrottleConfig;
pub use gate::ThrottleGate;
pub use interval::ThrottleInterval;
pub use key::HostKey;
pub use stats::HostStats;
pub use wrapped::{Throttled, ThrottledAsync};
