//! Shared types for the flash-sale core.
//!
//! Newtype identifiers keep item ids, buyer ids, and reservation tokens
//! from being mixed up across crate boundaries, and [`RejectReason`]
//! carries the user-visible rejection codes end-to-end.

pub mod types;

pub use types::{BuyerId, ItemId, ParseTokenError, RejectReason, ReservationToken};
