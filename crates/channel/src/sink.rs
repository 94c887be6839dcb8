//! Best-effort failure recording, decoupled from the hot path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::message::FailureEvent;
use crate::topic::InMemoryTopic;

/// Fire-and-forget recorder of rejected and erroring attempts.
///
/// `record` never fails: serialization or transport problems are
/// logged and swallowed, so the sink can never fail the buyer-facing
/// request that is reporting the rejection.
#[async_trait]
pub trait FailureSink: Send + Sync {
    /// Records one failure event, best-effort.
    async fn record(&self, event: FailureEvent);
}

/// Failure sink publishing JSON-framed events to a failure topic.
#[derive(Clone)]
pub struct ChannelFailureSink {
    topic: Arc<InMemoryTopic>,
}

impl ChannelFailureSink {
    /// Wraps a topic as the failure sink.
    pub fn new(topic: Arc<InMemoryTopic>) -> Self {
        Self { topic }
    }
}

#[async_trait]
impl FailureSink for ChannelFailureSink {
    async fn record(&self, event: FailureEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, ?event, "failed to serialize failure event");
                return;
            }
        };

        if let Err(e) = self.topic.publish(event.buyer_id.as_i64(), payload).await {
            tracing::warn!(error = %e, ?event, "failed to publish failure event");
        }
    }
}

/// Failure sink collecting events in memory, for tests.
#[derive(Clone, Default)]
pub struct RecordingFailureSink {
    events: Arc<RwLock<Vec<FailureEvent>>>,
}

impl RecordingFailureSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    pub async fn events(&self) -> Vec<FailureEvent> {
        self.events.read().await.clone()
    }

    /// Number of recorded events.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl FailureSink for RecordingFailureSink {
    async fn record(&self, event: FailureEvent) {
        self.events.write().await.push(event);
    }
}
