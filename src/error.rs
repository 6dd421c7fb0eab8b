use humantime_serde::re::humantime::DurationError;
use std::time::Duration;
use thiserror::Error;

/// Possible errors when configuring a throttle
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The given string cannot be parsed as an interval
    #[error("Cannot parse `{0}` as an interval: {1}")]
    InvalidInterval(String, DurationError),

    /// The forced (no-throttle) interval must be strictly shorter than the
    /// normal interval, otherwise the forced tier would never fire earlier
    /// than a normal call.
    #[error(
        "Forced interval ({forced:?}) must be strictly shorter than the normal interval ({interval:?})"
    )]
    ForcedIntervalNotShorter {
        /// The configured forced interval
        forced: Duration,
        /// The configured normal interval
        interval: Duration,
    },
}

/// The crate-wide return type
pub type Result<T> = std::result::Result<T, ErrorKind>;
