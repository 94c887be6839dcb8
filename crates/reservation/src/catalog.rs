//! Catalog entry and cache-aside item lookup.

use common::ItemId;
use durable_store::{DurableStore, Item};
use fast_store::{FastStore, ITEM_CACHE_TTL, item_key, stock_key};

use crate::error::Result;

/// Item catalog over the durable store with a fast-store cache.
///
/// Creating an item pre-warms its stock counter so the hot path never
/// needs the durable store. Lookups are cache-aside with a bounded
/// expiry, so a stale cached row disappears within the TTL of a
/// durable update.
pub struct ItemCatalog<F, D>
where
    F: FastStore,
    D: DurableStore,
{
    fast: F,
    store: D,
}

impl<F, D> ItemCatalog<F, D>
where
    F: FastStore,
    D: DurableStore,
{
    /// Creates a new catalog.
    pub fn new(fast: F, store: D) -> Self {
        Self { fast, store }
    }

    /// Inserts a catalog item and seeds its fast-store stock counter.
    #[tracing::instrument(skip(self))]
    pub async fn create_item(&self, name: &str, price: i64, stock: i64) -> Result<Item> {
        let item = self.store.insert_item(name, price, stock).await?;
        self.fast
            .set_count(&stock_key(item.id), item.stock)
            .await?;

        tracing::info!(item_id = %item.id, stock = item.stock, "item created, stock pre-warmed");
        Ok(item)
    }

    /// Fetches an item, preferring the fast-store cache.
    pub async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        let key = item_key(item_id);

        if let Some(json) = self.fast.get_value(&key).await? {
            tracing::debug!(%item_id, "item cache hit");
            return Ok(Some(serde_json::from_str(&json)?));
        }

        tracing::debug!(%item_id, "item cache miss");
        let Some(item) = self.store.get_item(item_id).await? else {
            return Ok(None);
        };

        self.fast
            .set_value(&key, serde_json::to_string(&item)?, Some(ITEM_CACHE_TTL))
            .await?;
        Ok(Some(item))
    }
}
