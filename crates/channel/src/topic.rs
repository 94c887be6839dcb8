//! In-memory partitioned topic with acknowledgment-gated retention.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::error::{ChannelError, Result};

/// What the consumer wants done with the message it just handled.
///
/// This is the explicit result type replacing a broker's
/// acknowledgment-callback object: business logic returns a value and
/// the topic adapter interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handled successfully; acknowledge and remove the message.
    Commit,
    /// Transient failure; leave the message for redelivery.
    Redeliver,
    /// Poison message; acknowledge and discard it.
    Drop,
}

/// Consumer-side message handler.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes one raw payload and decides its disposition.
    async fn handle(&self, payload: &str) -> Disposition;
}

struct Partition {
    queue: Mutex<VecDeque<String>>,
    notify: Notify,
}

/// In-memory topic with fixed partitions.
///
/// Messages are routed by key (`key mod partitions`) and each partition
/// is a FIFO queue. A message stays at the head of its partition until
/// a handler returns [`Disposition::Commit`] or [`Disposition::Drop`],
/// which gives at-least-once delivery with per-partition ordering —
/// the same contract a Kafka-style broker provides with manual offset
/// commits.
pub struct InMemoryTopic {
    partitions: Vec<Partition>,
    closed: AtomicBool,
    redelivery_delay: Duration,
}

impl InMemoryTopic {
    /// Creates a topic with the given number of partitions.
    pub fn new(partitions: usize) -> Arc<Self> {
        assert!(partitions > 0, "a topic needs at least one partition");
        Arc::new(Self {
            partitions: (0..partitions)
                .map(|_| Partition {
                    queue: Mutex::new(VecDeque::new()),
                    notify: Notify::new(),
                })
                .collect(),
            closed: AtomicBool::new(false),
            redelivery_delay: Duration::from_millis(50),
        })
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// The partition a key routes to.
    pub fn partition_for(&self, key: i64) -> usize {
        key.rem_euclid(self.partitions.len() as i64) as usize
    }

    /// Appends a message to the partition its key routes to.
    pub async fn publish(&self, key: i64, payload: String) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }

        let partition = &self.partitions[self.partition_for(key)];
        partition.queue.lock().await.push_back(payload);
        partition.notify.notify_waiters();
        Ok(())
    }

    /// Closes the topic: publishes fail, and partition workers return
    /// once their queue drains.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for partition in &self.partitions {
            partition.notify.notify_waiters();
        }
    }

    /// Number of unacknowledged messages in one partition.
    pub async fn depth(&self, partition: usize) -> usize {
        self.partitions[partition].queue.lock().await.len()
    }

    /// Total unacknowledged messages across all partitions.
    pub async fn total_depth(&self) -> usize {
        let mut total = 0;
        for index in 0..self.partitions.len() {
            total += self.depth(index).await;
        }
        total
    }

    /// Delivers the message at the head of a partition to `handler`,
    /// applying the returned disposition. Returns `None` if the
    /// partition is empty. The message is removed only on
    /// [`Disposition::Commit`] or [`Disposition::Drop`].
    pub async fn deliver_next(
        &self,
        partition: usize,
        handler: &dyn MessageHandler,
    ) -> Option<Disposition> {
        let queue = &self.partitions[partition].queue;

        // The head stays in place while the handler runs; a crash here
        // means redelivery, never loss.
        let payload = queue.lock().await.front().cloned()?;
        let disposition = handler.handle(&payload).await;

        match disposition {
            Disposition::Commit | Disposition::Drop => {
                queue.lock().await.pop_front();
            }
            Disposition::Redeliver => {}
        }

        Some(disposition)
    }

    /// Runs a consumer loop over one partition until the topic is
    /// closed and the partition is drained.
    pub async fn run_partition(&self, partition: usize, handler: &dyn MessageHandler) {
        loop {
            // Register for wakeups before checking the queue so a
            // publish racing with the empty check is not missed.
            let notified = self.partitions[partition].notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.deliver_next(partition, handler).await {
                Some(Disposition::Redeliver) => {
                    tokio::time::sleep(self.redelivery_delay).await;
                }
                Some(_) => {}
                None => {
                    if self.closed.load(Ordering::SeqCst) {
                        return;
                    }
                    notified.await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler {
        handled: AtomicUsize,
        disposition: Disposition,
    }

    impl CountingHandler {
        fn new(disposition: Disposition) -> Self {
            Self {
                handled: AtomicUsize::new(0),
                disposition,
            }
        }
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, _payload: &str) -> Disposition {
            self.handled.fetch_add(1, Ordering::SeqCst);
            self.disposition
        }
    }

    #[tokio::test]
    async fn commit_removes_the_message() {
        let topic = InMemoryTopic::new(1);
        topic.publish(1, "a".to_string()).await.unwrap();

        let handler = CountingHandler::new(Disposition::Commit);
        assert_eq!(
            topic.deliver_next(0, &handler).await,
            Some(Disposition::Commit)
        );
        assert_eq!(topic.depth(0).await, 0);
    }

    #[tokio::test]
    async fn redeliver_retains_the_message_in_order() {
        let topic = InMemoryTopic::new(1);
        topic.publish(1, "first".to_string()).await.unwrap();
        topic.publish(1, "second".to_string()).await.unwrap();

        let failing = CountingHandler::new(Disposition::Redeliver);
        topic.deliver_next(0, &failing).await;
        topic.deliver_next(0, &failing).await;
        assert_eq!(topic.depth(0).await, 2);

        // The head is still "first": ordering survives redelivery.
        struct AssertFirst;
        #[async_trait]
        impl MessageHandler for AssertFirst {
            async fn handle(&self, payload: &str) -> Disposition {
                assert_eq!(payload, "first");
                Disposition::Commit
            }
        }
        topic.deliver_next(0, &AssertFirst).await;
        assert_eq!(topic.depth(0).await, 1);
    }

    #[tokio::test]
    async fn drop_discards_poison_without_blocking() {
        let topic = InMemoryTopic::new(1);
        topic.publish(1, "poison".to_string()).await.unwrap();
        topic.publish(1, "good".to_string()).await.unwrap();

        let dropper = CountingHandler::new(Disposition::Drop);
        topic.deliver_next(0, &dropper).await;
        assert_eq!(topic.depth(0).await, 1);
    }

    #[tokio::test]
    async fn keys_route_to_stable_partitions() {
        let topic = InMemoryTopic::new(4);
        assert_eq!(topic.partition_for(42), topic.partition_for(42));
        topic.publish(42, "x".to_string()).await.unwrap();
        topic.publish(42, "y".to_string()).await.unwrap();
        assert_eq!(topic.depth(topic.partition_for(42)).await, 2);
    }

    #[tokio::test]
    async fn publish_after_close_fails() {
        let topic = InMemoryTopic::new(1);
        topic.close();
        let result = topic.publish(1, "late".to_string()).await;
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn run_partition_drains_then_exits_after_close() {
        let topic = InMemoryTopic::new(1);
        for i in 0..5 {
            topic.publish(1, format!("m{i}")).await.unwrap();
        }
        topic.close();

        let handler = CountingHandler::new(Disposition::Commit);
        topic.run_partition(0, &handler).await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 5);
        assert_eq!(topic.depth(0).await, 0);
    }

    #[tokio::test]
    async fn run_partition_wakes_on_late_publish() {
        let topic = InMemoryTopic::new(1);
        let handler = Arc::new(CountingHandler::new(Disposition::Commit));

        let worker = {
            let topic = Arc::clone(&topic);
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { topic.run_partition(0, handler.as_ref()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        topic.publish(7, "late".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        topic.close();

        worker.await.unwrap();
        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
    }
}
