//! Error types for onboard-tracker
//!
//! Business rejections (already completed, unknown person, visitor count
//! before arrival) are outcomes, not errors; see [`crate::guard`]. This
//! enum covers what a caller cannot act on by re-reading the outcome.

use thiserror::Error;

/// Main error type for the tracker
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before touching the store (unknown checkpoint, bad width,
    /// empty attributor, negative visitor count)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The record store could not serve the request; not retried here
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Startup configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type using the tracker Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

impl From<onboard_common::Error> for Error {
    fn from(err: onboard_common::Error) -> Self {
        match err {
            onboard_common::Error::Database(e) => Error::StoreUnavailable(e.to_string()),
            onboard_common::Error::Io(e) => Error::StoreUnavailable(e.to_string()),
            onboard_common::Error::Config(msg) => Error::Config(msg),
        }
    }
}
