//! Per-partition consumer workers.

use std::sync::Arc;

use channel::{InMemoryTopic, MessageHandler};
use tokio::task::JoinHandle;

/// A pool of independent consumer workers, one per topic partition.
///
/// Workers on different partitions process different items
/// concurrently, while each item's messages stay on one partition and
/// therefore commit in order. Every worker runs until the topic is
/// closed and its partition drained.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns one worker per partition of `topic`, all sharing `handler`.
    pub fn spawn<H>(topic: Arc<InMemoryTopic>, handler: Arc<H>) -> Self
    where
        H: MessageHandler + 'static,
    {
        let handles = (0..topic.partition_count())
            .map(|partition| {
                let topic = Arc::clone(&topic);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    tracing::debug!(partition, "fulfillment worker started");
                    topic.run_partition(partition, handler.as_ref()).await;
                    tracing::debug!(partition, "fulfillment worker stopped");
                })
            })
            .collect();

        Self { handles }
    }

    /// Waits for every worker to finish. Workers finish only after the
    /// topic is closed and drained.
    pub async fn join(self) {
        for handle in self.handles {
            // A worker task has no panic path of its own; a panic here
            // means a handler panicked and the test should fail loudly.
            handle.await.expect("fulfillment worker panicked");
        }
    }
}
