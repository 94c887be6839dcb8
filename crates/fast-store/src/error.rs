//! Fast-store error types.

use thiserror::Error;

/// Errors that can occur talking to the fast store.
#[derive(Debug, Error)]
pub enum FastStoreError {
    /// Redis connection or command error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored counter value was not a valid integer.
    #[error("counter at '{key}' holds a non-numeric value")]
    NonNumericCounter { key: String },
}

/// Convenience type alias for fast-store results.
pub type Result<T> = std::result::Result<T, FastStoreError>;
