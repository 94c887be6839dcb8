//! The order-intent channel seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::message::OrderIntent;
use crate::topic::InMemoryTopic;

/// Publisher side of the order-intent channel.
///
/// Implementations must deliver at-least-once, in partition order
/// keyed by item; no ordering is guaranteed across items.
#[async_trait]
pub trait OrderIntentChannel: Send + Sync {
    /// Publishes one admitted reservation for fulfillment.
    async fn publish(&self, intent: &OrderIntent) -> Result<()>;
}

/// In-memory intent channel, partitioned by item id.
#[derive(Clone)]
pub struct InMemoryIntentChannel {
    topic: Arc<InMemoryTopic>,
}

impl InMemoryIntentChannel {
    /// Wraps a topic as the intent channel.
    pub fn new(topic: Arc<InMemoryTopic>) -> Self {
        Self { topic }
    }

    /// The underlying topic, for wiring consumers.
    pub fn topic(&self) -> &Arc<InMemoryTopic> {
        &self.topic
    }
}

#[async_trait]
impl OrderIntentChannel for InMemoryIntentChannel {
    async fn publish(&self, intent: &OrderIntent) -> Result<()> {
        tracing::debug!(
            buyer_id = %intent.buyer_id,
            item_id = %intent.item_id,
            token = %intent.token,
            "publishing order intent"
        );
        self.topic
            .publish(intent.item_id.as_i64(), intent.encode())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BuyerId, ItemId, ReservationToken};

    #[tokio::test]
    async fn intents_for_one_item_share_a_partition() {
        let topic = InMemoryTopic::new(4);
        let channel = InMemoryIntentChannel::new(Arc::clone(&topic));

        let item = ItemId::new(42);
        for buyer in 0..3 {
            channel
                .publish(&OrderIntent::new(
                    BuyerId::new(buyer),
                    item,
                    ReservationToken::new(),
                ))
                .await
                .unwrap();
        }

        assert_eq!(topic.depth(topic.partition_for(42)).await, 3);
    }
}
