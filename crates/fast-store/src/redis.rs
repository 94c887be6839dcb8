//! Redis-backed fast store.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Script};

use crate::error::Result;
use crate::store::FastStore;

/// Server-side check-and-decrement. Running it as one script makes the
/// read-compare-write atomic with respect to every other client.
const DECREMENT_SCRIPT: &str = r#"
local stock = tonumber(redis.call('GET', KEYS[1]))
if stock and stock > 0 then
    redis.call('DECRBY', KEYS[1], 1)
    return 1
end
return 0
"#;

/// Redis-backed fast store.
///
/// Counters are plain string integers; the check-and-decrement runs as
/// a Lua script so concurrent buyers contend on the Redis server, not
/// in application code.
#[derive(Clone)]
pub struct RedisFastStore {
    client: redis::Client,
    decrement: Script,
}

impl RedisFastStore {
    /// Creates a fast store talking to the given Redis URL
    /// (e.g. `redis://localhost:6379`).
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
            decrement: Script::new(DECREMENT_SCRIPT),
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl FastStore for RedisFastStore {
    async fn decrement_if_positive(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let applied: i64 = self.decrement.key(key).invoke_async(&mut conn).await?;
        Ok(applied == 1)
    }

    async fn get_count(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_count(&self, key: &str, value: i64) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, value, secs).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }
}
