use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{BuyerId, ItemId, ReservationToken};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::records::{FailureRecord, Item, OrderRecord};
use crate::store::{CommitOutcome, DurableStore, FailureLogStore};

#[derive(Debug, Default)]
struct State {
    items: HashMap<i64, Item>,
    orders: Vec<OrderRecord>,
    failures: Vec<FailureRecord>,
    next_item_id: i64,
    next_order_id: i64,
    fail_on_commit: bool,
}

/// In-memory durable store for testing.
///
/// Mirrors the PostgreSQL implementation's contract, including the
/// commit outcome ordering: an exhausted count is reported before a
/// duplicate token is detected, matching the transaction's statement
/// order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `commit_order` calls fail with a transient error,
    /// simulating infrastructure failure mid-transaction.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        self.state.write().await.fail_on_commit = fail;
    }

    /// Total number of orders across all items.
    pub async fn total_orders(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns all recorded failures. Test helper.
    pub async fn failures(&self) -> Vec<FailureRecord> {
        self.state.read().await.failures.clone()
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn insert_item(&self, name: &str, price: i64, stock: i64) -> Result<Item> {
        let mut state = self.state.write().await;
        state.next_item_id += 1;
        let item = Item {
            id: ItemId::new(state.next_item_id),
            name: name.to_string(),
            price,
            stock,
        };
        let next_item_id = state.next_item_id;
        state.items.insert(next_item_id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        let state = self.state.read().await;
        Ok(state.items.get(&item_id.as_i64()).cloned())
    }

    async fn stock(&self, item_id: ItemId) -> Result<Option<i64>> {
        let state = self.state.read().await;
        Ok(state.items.get(&item_id.as_i64()).map(|item| item.stock))
    }

    async fn commit_order(
        &self,
        item_id: ItemId,
        buyer_id: BuyerId,
        token: ReservationToken,
    ) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;

        if state.fail_on_commit {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        let stock = state
            .items
            .get(&item_id.as_i64())
            .map(|item| item.stock)
            .unwrap_or(0);
        if stock <= 0 {
            return Ok(CommitOutcome::StockExhausted);
        }

        if state.orders.iter().any(|order| order.token == token) {
            return Ok(CommitOutcome::DuplicateToken);
        }

        if let Some(item) = state.items.get_mut(&item_id.as_i64()) {
            item.stock -= 1;
        }
        state.next_order_id += 1;
        let order = OrderRecord {
            id: state.next_order_id,
            item_id,
            buyer_id,
            token,
            created_at: Utc::now(),
        };
        state.orders.push(order);

        Ok(CommitOutcome::Created)
    }

    async fn order_for_token(&self, token: ReservationToken) -> Result<Option<OrderRecord>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|order| order.token == token)
            .cloned())
    }

    async fn order_count(&self, item_id: ItemId) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|order| order.item_id == item_id)
            .count() as i64)
    }
}

#[async_trait]
impl FailureLogStore for InMemoryStore {
    async fn record(&self, failure: &FailureRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_commit {
            return Err(StoreError::Unavailable("injected record failure".into()));
        }
        state.failures.push(failure.clone());
        Ok(())
    }

    async fn failure_count(&self) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.failures.len() as i64)
    }
}
