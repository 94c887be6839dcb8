//! The failure-topic consumer.

use async_trait::async_trait;
use channel::{Disposition, FailureEvent, MessageHandler};
use chrono::Utc;
use durable_store::{FailureLogStore, FailureRecord};

/// Drains the failure topic into the failure log.
///
/// Entirely best-effort: every message is acknowledged whether or not
/// it could be parsed or written, matching the sink's fire-and-forget
/// contract. Nothing on the hot path ever waits for this consumer.
pub struct FailureLogConsumer<S>
where
    S: FailureLogStore,
{
    store: S,
}

impl<S> FailureLogConsumer<S>
where
    S: FailureLogStore,
{
    /// Creates a consumer writing to the given failure log.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> MessageHandler for FailureLogConsumer<S>
where
    S: FailureLogStore,
{
    async fn handle(&self, payload: &str) -> Disposition {
        let event: FailureEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, payload, "unparseable failure event, dropping");
                return Disposition::Drop;
            }
        };

        let record = FailureRecord {
            buyer_id: event.buyer_id,
            item_id: event.item_id,
            reason: event.reason.as_str().to_string(),
            origin_address: event.origin_address,
            failed_at: Utc::now(),
        };

        if let Err(e) = self.store.record(&record).await {
            tracing::warn!(error = %e, "failed to persist failure event");
        }

        Disposition::Commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BuyerId, ItemId, RejectReason};
    use durable_store::InMemoryStore;

    fn payload() -> String {
        serde_json::to_string(&FailureEvent {
            buyer_id: BuyerId::new(9),
            item_id: ItemId::new(42),
            reason: RejectReason::SystemBusy,
            origin_address: "10.1.2.3".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn event_is_recorded_with_its_reason_code() {
        let store = InMemoryStore::new();
        let consumer = FailureLogConsumer::new(store.clone());

        assert_eq!(consumer.handle(&payload()).await, Disposition::Commit);

        let failures = store.failures().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, "SYSTEM_BUSY");
        assert_eq!(failures[0].origin_address, "10.1.2.3");
    }

    #[tokio::test]
    async fn unparseable_event_is_dropped() {
        let store = InMemoryStore::new();
        let consumer = FailureLogConsumer::new(store.clone());

        assert_eq!(consumer.handle("{not json").await, Disposition::Drop);
        assert_eq!(store.failure_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_swallowed_and_acked() {
        let store = InMemoryStore::new();
        store.set_fail_on_commit(true).await;
        let consumer = FailureLogConsumer::new(store.clone());

        assert_eq!(consumer.handle(&payload()).await, Disposition::Commit);
    }
}
