use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{FastStoreError, Result};
use crate::store::FastStore;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory fast store.
///
/// Values live in a single map guarded by one `RwLock`; the
/// check-and-decrement holds the write lock for its whole
/// read-compare-write, which is what makes it atomic. Expiry is lazy:
/// an expired entry reads as absent.
#[derive(Clone, Default)]
pub struct InMemoryFastStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryFastStore {
    /// Creates a new empty fast store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every entry. Test helper.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

fn parse_count(key: &str, raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| FastStoreError::NonNumericCounter {
            key: key.to_string(),
        })
}

#[async_trait]
impl FastStore for InMemoryFastStore {
    async fn decrement_if_positive(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;

        let current = match entries.get(key) {
            Some(entry) if !entry.is_expired() => parse_count(key, &entry.value)?,
            _ => 0,
        };

        if current > 0 {
            entries.insert(
                key.to_string(),
                Entry {
                    value: (current - 1).to_string(),
                    expires_at: None,
                },
            );
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn get_count(&self, key: &str) -> Result<Option<i64>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => parse_count(key, &entry.value).map(Some),
            _ => Ok(None),
        }
    }

    async fn set_count(&self, key: &str, value: i64) -> Result<()> {
        self.set_value(key, value.to_string(), None).await
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn set_value(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }
}
