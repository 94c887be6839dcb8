//! Reservation error types.
//!
//! Rejections are not errors: `reserve` reports `BLACKLIST`,
//! `OUT_OF_STOCK`, and `SYSTEM_BUSY` as [`ReservationOutcome::Rejected`]
//! values. This enum covers infrastructure failures only.
//!
//! [`ReservationOutcome::Rejected`]: crate::service::ReservationOutcome

use thiserror::Error;

/// Errors that can occur during reservation operations.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Fast-store error.
    #[error("fast store error: {0}")]
    FastStore(#[from] fast_store::FastStoreError),

    /// Durable-store error (catalog operations).
    #[error("durable store error: {0}")]
    Store(#[from] durable_store::StoreError),

    /// Intent channel error.
    #[error("channel error: {0}")]
    Channel(#[from] channel::ChannelError),

    /// Cached item payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for reservation results.
pub type Result<T> = std::result::Result<T, ReservationError>;
