//! Error taxonomy for one collection run.
//!
//! Only [`ConfigError`] is fatal. Every other error is scoped to a single
//! sensor (or a single degraded lookup) and is logged by the collector
//! rather than propagated.

use thiserror::Error;

/// Startup configuration problems. Aborts the run before any sensor work.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("{0} must be set in .env or environment")]
    Missing(&'static str),

    /// A variable is present but unusable.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Failure to obtain a reading from one device.
#[derive(Error, Debug)]
pub enum ReadFailure {
    #[error("device request timed out")]
    Timeout,

    #[error("device is offline: {0}")]
    Offline(String),

    #[error("device API transport error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("device API rejected request ({code}): {msg}")]
    Api { code: String, msg: String },

    #[error("malformed device response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ReadFailure {
    fn from(e: reqwest::Error) -> Self {
        // ---
        if e.is_timeout() {
            ReadFailure::Timeout
        } else if e.is_decode() {
            ReadFailure::Malformed(e.to_string())
        } else {
            ReadFailure::Http(e)
        }
    }
}

/// Telemetry log or configuration table access failure.
#[derive(Error, Debug)]
pub enum StoreFailure {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be interpreted.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

/// Failure to deliver a notification. Never affects persisted state.
#[derive(Error, Debug)]
pub enum NotifyFailure {
    #[error("notification request timed out")]
    Timeout,

    #[error("notification transport error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("notification rejected with HTTP {0}")]
    Rejected(u16),
}

impl From<reqwest::Error> for NotifyFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyFailure::Timeout
        } else {
            NotifyFailure::Http(e)
        }
    }
}
