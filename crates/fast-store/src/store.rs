//! The fast-store trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Low-latency key-value service used for the hot-path stock counter
/// and the item cache.
///
/// `decrement_if_positive` is the primitive the whole primary
/// reservation path hangs on: it must be atomic with respect to
/// concurrent callers, so that two buyers can never both observe a
/// positive count before either decrements.
#[async_trait]
pub trait FastStore: Send + Sync {
    /// Atomically decrements the counter at `key` by 1 iff its current
    /// value is > 0. Returns `true` if the decrement was applied.
    ///
    /// A missing key is treated as zero stock.
    async fn decrement_if_positive(&self, key: &str) -> Result<bool>;

    /// Plain read of a counter. Used only inside the distributed-lock
    /// fallback path, where the lock provides the serialization.
    async fn get_count(&self, key: &str) -> Result<Option<i64>>;

    /// Plain write of a counter. Also used to pre-warm stock at
    /// catalog-entry time.
    async fn set_count(&self, key: &str, value: i64) -> Result<()>;

    /// Reads a cached serialized value.
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Writes a serialized value, optionally with a bounded expiry.
    async fn set_value(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;
}
