//! `throttle_gate` rate-limits the update calls of polling integrations.
//! "Hello world" example:
//! ```
//! use std::time::Duration;
//! use throttle_gate::{HostKey, ThrottleGate};
//!
//! let gate = ThrottleGate::new(Duration::from_secs(30));
//! let host = HostKey::from("garden-sensor");
//!
//! // The first call through the gate runs; repeats inside the cooldown
//! // are skipped and return `None` instead.
//! assert_eq!(gate.call(&host, false, || "23.4 °C"), Some("23.4 °C"));
//! assert_eq!(gate.call(&host, false, || "23.4 °C"), None);
//! ```
//!
//! A skipped call is a silent no-op by design: integrations are polled on
//! a fixed outer cadence, and the gate only decides which of those polls
//! actually hit the network. There is no queueing and no retry; calls that
//! arrive too soon, or while another call for the same host is in flight,
//! return the sentinel immediately.
//!
//! Forced calls (`force = true`) bypass the normal cooldown. A gate built
//! with [`ThrottleGate::with_forced_interval`] instead limits them against
//! a second, shorter interval with its own independent timers.

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

mod clock;
mod error;
mod pollable;
mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, Result};
pub use pollable::{AsyncPollable, Pollable, ThrottledPoller};
pub use throttle::{
    HostKey, HostStats, ThrottleConfig, ThrottleGate, ThrottleInterval, Throttled, ThrottledAsync,
};
