//! The reservation orchestrator.

use std::time::Duration;

use channel::{FailureEvent, FailureSink, OrderIntent, OrderIntentChannel};
use common::{BuyerId, ItemId, RejectReason, ReservationToken};
use fast_store::{FastStore, stock_key};

use crate::error::Result;
use crate::services::blacklist::BlacklistGate;
use crate::services::lock::DistributedLock;

/// Default bounded wait for the fallback lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of one reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// The buyer won a unit; the token identifies this purchase through
    /// to the durable commit.
    Admitted { token: ReservationToken },
    /// The buyer was turned away. Rejections are final for this
    /// attempt; the buyer may retry manually.
    Rejected(RejectReason),
}

impl ReservationOutcome {
    /// True if the attempt was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// The minted token, if admitted.
    pub fn token(&self) -> Option<ReservationToken> {
        match self {
            Self::Admitted { token } => Some(*token),
            Self::Rejected(_) => None,
        }
    }
}

/// Decides admit or reject for each purchase attempt.
///
/// All collaborators are constructor-passed seams: the fast store, the
/// blacklist gate, the distributed lock, the intent channel, and the
/// failure sink. No application-level lock is held across the primary
/// path — the fast store's atomic command is its sole synchronization
/// point.
pub struct ReservationService<F, B, L, C, K>
where
    F: FastStore,
    B: BlacklistGate,
    L: DistributedLock,
    C: OrderIntentChannel,
    K: FailureSink + Clone + 'static,
{
    fast: F,
    blacklist: B,
    lock: L,
    intents: C,
    failures: K,
    lock_timeout: Duration,
    origin_address: String,
}

impl<F, B, L, C, K> ReservationService<F, B, L, C, K>
where
    F: FastStore,
    B: BlacklistGate,
    L: DistributedLock,
    C: OrderIntentChannel,
    K: FailureSink + Clone + 'static,
{
    /// Creates a new reservation service with the default lock timeout.
    pub fn new(fast: F, blacklist: B, lock: L, intents: C, failures: K) -> Self {
        Self {
            fast,
            blacklist,
            lock,
            intents,
            failures,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            origin_address: "127.0.0.1".to_string(),
        }
    }

    /// Sets the bounded wait for the fallback lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets the origin address reported in failure events.
    pub fn with_origin_address(mut self, origin: impl Into<String>) -> Self {
        self.origin_address = origin.into();
        self
    }

    /// Primary reservation path.
    ///
    /// One atomic fast-store check-and-decrement decides the outcome,
    /// which is what prevents the read-then-write race where two buyers
    /// both observe a positive count before either decrements. The
    /// blacklist is consulted first and a hit never touches the counter.
    #[tracing::instrument(skip(self), fields(path = "atomic"))]
    pub async fn reserve(
        &self,
        item_id: ItemId,
        buyer_id: BuyerId,
    ) -> Result<ReservationOutcome> {
        metrics::counter!("reservations_total").increment(1);

        if self.blacklist.contains(buyer_id).await {
            tracing::warn!(%buyer_id, "buyer is blacklisted, rejecting");
            return Ok(self.reject(item_id, buyer_id, RejectReason::Blacklist));
        }

        if !self.fast.decrement_if_positive(&stock_key(item_id)).await? {
            return Ok(self.reject(item_id, buyer_id, RejectReason::OutOfStock));
        }

        self.admit(item_id, buyer_id).await
    }

    /// Fallback reservation path, serializing all attempts for an item
    /// through the distributed lock.
    ///
    /// Preferred when strong consistency on the cached count matters
    /// more than raw throughput. Inside the critical section the count
    /// is read, decremented, and written back as plain operations; the
    /// guard releases the lock on every exit path, including errors.
    #[tracing::instrument(skip(self), fields(path = "lock"))]
    pub async fn reserve_serialized(
        &self,
        item_id: ItemId,
        buyer_id: BuyerId,
    ) -> Result<ReservationOutcome> {
        metrics::counter!("reservations_total").increment(1);

        if self.blacklist.contains(buyer_id).await {
            tracing::warn!(%buyer_id, "buyer is blacklisted, rejecting");
            return Ok(self.reject(item_id, buyer_id, RejectReason::Blacklist));
        }

        let resource = format!("/lock/item/{item_id}");
        let Some(_guard) = self.lock.acquire(&resource, self.lock_timeout).await else {
            tracing::warn!(%item_id, "lock acquisition timed out");
            return Ok(self.reject(item_id, buyer_id, RejectReason::SystemBusy));
        };

        let key = stock_key(item_id);
        let stock = self.fast.get_count(&key).await?.unwrap_or(0);
        if stock > 0 {
            self.fast.set_count(&key, stock - 1).await?;
            tracing::info!(%item_id, remaining = stock - 1, "stock decremented under lock");
            self.admit(item_id, buyer_id).await
        } else {
            Ok(self.reject(item_id, buyer_id, RejectReason::OutOfStock))
        }
    }

    /// Mints the token and publishes the intent for an admitted buyer.
    async fn admit(&self, item_id: ItemId, buyer_id: BuyerId) -> Result<ReservationOutcome> {
        let token = ReservationToken::new();
        self.intents
            .publish(&OrderIntent::new(buyer_id, item_id, token))
            .await?;

        metrics::counter!("reservations_admitted").increment(1);
        tracing::info!(%token, "reservation admitted");
        Ok(ReservationOutcome::Admitted { token })
    }

    /// Hands the rejection to the failure sink without blocking on it.
    fn reject(
        &self,
        item_id: ItemId,
        buyer_id: BuyerId,
        reason: RejectReason,
    ) -> ReservationOutcome {
        metrics::counter!("reservations_rejected", "reason" => reason.as_str()).increment(1);

        let event = FailureEvent {
            buyer_id,
            item_id,
            reason,
            origin_address: self.origin_address.clone(),
        };
        let sink = self.failures.clone();
        tokio::spawn(async move {
            sink.record(event).await;
        });

        ReservationOutcome::Rejected(reason)
    }
}
