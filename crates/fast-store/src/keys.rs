//! Key layout for the fast store.

use std::time::Duration;

use common::ItemId;

/// Expiry for cached item rows, bounding staleness after a durable update.
pub const ITEM_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Key of the hot-path stock counter for an item.
pub fn stock_key(item_id: ItemId) -> String {
    format!("stock:{item_id}")
}

/// Key of the serialized item cache entry.
pub fn item_key(item_id: ItemId) -> String {
    format!("item:{item_id}")
}
