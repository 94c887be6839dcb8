//! Fast store: the in-memory key-value service backing the hot path.
//!
//! Two concerns live behind the [`FastStore`] trait:
//!
//! - the stock counter at `stock:<itemId>`, whose single atomic
//!   check-and-decrement is the only synchronization point on the
//!   primary reservation path, and
//! - the item cache at `item:<itemId>`, a serialized copy of the
//!   durable row with a bounded expiry so staleness after a durable
//!   update is limited.
//!
//! The fast store is a cache, not the source of truth; the durable
//! store's count is authoritative and the two are reconciled by the
//! fulfillment stage.

pub mod error;
pub mod keys;
pub mod memory;
pub mod redis;
pub mod store;

pub use error::{FastStoreError, Result};
pub use keys::{ITEM_CACHE_TTL, item_key, stock_key};
pub use memory::InMemoryFastStore;
pub use self::redis::RedisFastStore;
pub use store::FastStore;
