//! The durable-store traits.

use async_trait::async_trait;
use common::{BuyerId, ItemId, ReservationToken};

use crate::error::Result;
use crate::records::{FailureRecord, Item, OrderRecord};

/// Outcome of the transactional durable commit for one intent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Stock was decremented and the order row was inserted.
    Created,
    /// An order with this token already exists: the message is a
    /// redelivery. The transaction was rolled back so stock is not
    /// decremented a second time.
    DuplicateToken,
    /// The durable count was already zero. Only reachable when the fast
    /// and durable stores have drifted.
    StockExhausted,
}

/// Transactional store holding authoritative stock and order records.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Inserts a new catalog item and returns it with its assigned id.
    async fn insert_item(&self, name: &str, price: i64, stock: i64) -> Result<Item>;

    /// Fetches an item by id.
    async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>>;

    /// Returns the authoritative stock count for an item.
    async fn stock(&self, item_id: ItemId) -> Result<Option<i64>>;

    /// Within one transaction: decrement stock iff positive, then
    /// insert the order keyed by its unique token. The insert executes
    /// inside the transaction so a uniqueness violation surfaces
    /// synchronously instead of being buffered.
    async fn commit_order(
        &self,
        item_id: ItemId,
        buyer_id: BuyerId,
        token: ReservationToken,
    ) -> Result<CommitOutcome>;

    /// Looks up the order created for a token, if any.
    async fn order_for_token(&self, token: ReservationToken) -> Result<Option<OrderRecord>>;

    /// Number of orders recorded for an item.
    async fn order_count(&self, item_id: ItemId) -> Result<i64>;
}

/// Best-effort log of rejected and erroring attempts.
#[async_trait]
pub trait FailureLogStore: Send + Sync {
    /// Appends one failure record.
    async fn record(&self, failure: &FailureRecord) -> Result<()>;

    /// Total number of recorded failures.
    async fn failure_count(&self) -> Result<i64>;
}
