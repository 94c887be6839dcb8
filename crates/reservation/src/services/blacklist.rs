//! Blacklist gate trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::BuyerId;
use tokio::sync::RwLock;

/// Pre-check gate consulted before the stock counter is touched.
///
/// Backed by a replicated map in production, so `contains` runs at
/// local-memory speed on every node. A single lookup, no side effects;
/// entries are inserted out-of-band and read-only on the hot path.
#[async_trait]
pub trait BlacklistGate: Send + Sync {
    /// Returns true if the buyer is blacklisted.
    async fn contains(&self, buyer_id: BuyerId) -> bool;
}

/// In-memory blacklist over a shared map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlacklist {
    entries: Arc<RwLock<HashMap<BuyerId, String>>>,
}

impl InMemoryBlacklist {
    /// Creates an empty blacklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a buyer with a reason. Out-of-band administration, not part
    /// of the hot path.
    pub async fn add(&self, buyer_id: BuyerId, reason: impl Into<String>) {
        self.entries.write().await.insert(buyer_id, reason.into());
        tracing::info!(%buyer_id, "buyer added to blacklist");
    }

    /// Removes a buyer.
    pub async fn remove(&self, buyer_id: BuyerId) {
        self.entries.write().await.remove(&buyer_id);
    }

    /// Number of blacklisted buyers.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True if no buyer is blacklisted.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl BlacklistGate for InMemoryBlacklist {
    async fn contains(&self, buyer_id: BuyerId) -> bool {
        self.entries.read().await.contains_key(&buyer_id)
    }
}
