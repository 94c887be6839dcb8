//! The order-intent consumer.

use async_trait::async_trait;
use channel::{Disposition, MessageHandler, OrderIntent};
use durable_store::{CommitOutcome, DurableStore};

/// Consumes intent messages and performs the authoritative commit.
///
/// Acknowledgment policy per message:
/// - malformed payloads are acknowledged and dropped, so a poison
///   message can never block the partition;
/// - a duplicate token is acknowledged as success — that is the
///   designed idempotency outcome, not an error;
/// - exhausted durable stock means the fast and durable stores have
///   drifted; the attempt is resolved either way, so the message is
///   acknowledged rather than redelivered forever;
/// - an infrastructure error is not acknowledged; channel redelivery
///   (to this or another worker) is the sole retry mechanism.
pub struct OrderConsumer<D>
where
    D: DurableStore,
{
    store: D,
}

impl<D> OrderConsumer<D>
where
    D: DurableStore,
{
    /// Creates a consumer committing to the given durable store.
    pub fn new(store: D) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<D> MessageHandler for OrderConsumer<D>
where
    D: DurableStore,
{
    async fn handle(&self, payload: &str) -> Disposition {
        let intent: OrderIntent = match payload.parse() {
            Ok(intent) => intent,
            Err(e) => {
                tracing::error!(error = %e, payload, "malformed intent, dropping");
                metrics::counter!("intents_malformed").increment(1);
                return Disposition::Drop;
            }
        };

        match self
            .store
            .commit_order(intent.item_id, intent.buyer_id, intent.token)
            .await
        {
            Ok(CommitOutcome::Created) => {
                metrics::counter!("orders_committed").increment(1);
                tracing::info!(token = %intent.token, item_id = %intent.item_id, "order committed");
                Disposition::Commit
            }
            Ok(CommitOutcome::DuplicateToken) => {
                metrics::counter!("intents_duplicate").increment(1);
                tracing::warn!(token = %intent.token, "duplicate delivery, order already exists");
                Disposition::Commit
            }
            Ok(CommitOutcome::StockExhausted) => {
                metrics::counter!("stock_drift_detected").increment(1);
                tracing::warn!(
                    item_id = %intent.item_id,
                    token = %intent.token,
                    "durable stock exhausted after fast-store admission"
                );
                Disposition::Commit
            }
            Err(e) => {
                tracing::error!(error = %e, token = %intent.token, "commit failed, leaving for redelivery");
                Disposition::Redeliver
            }
        }
    }
}
