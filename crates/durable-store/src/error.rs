//! Durable-store error types.

use common::ItemId;
use thiserror::Error;

/// Errors that can occur during durable-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Store is temporarily unreachable. Surfaced to the fulfillment
    /// stage as a transient error, which must not be acknowledged.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for durable-store results.
pub type Result<T> = std::result::Result<T, StoreError>;
