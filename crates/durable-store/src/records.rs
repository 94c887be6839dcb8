//! Row types for the durable schema.

use chrono::{DateTime, Utc};
use common::{BuyerId, ItemId, ReservationToken};
use serde::{Deserialize, Serialize};

/// A sale item. The `stock` column here is authoritative; the fast
/// store holds a cached copy of it for the hot path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub stock: i64,
}

/// A committed order. Immutable once created; at most one exists per
/// reservation token regardless of how often the intent was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: i64,
    pub item_id: ItemId,
    pub buyer_id: BuyerId,
    pub token: ReservationToken,
    pub created_at: DateTime<Utc>,
}

/// A recorded rejection or error. Write-once, never read on the hot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub buyer_id: BuyerId,
    pub item_id: ItemId,
    pub reason: String,
    pub origin_address: String,
    pub failed_at: DateTime<Utc>,
}
