//! Distributed lock trait and in-process ticket implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

/// Coordination-service-backed mutex with a bounded acquisition wait.
///
/// Semantics follow the ephemeral-sequential recipe: a waiter takes an
/// ordered ticket and holds the lock when its ticket is the lowest
/// outstanding one, so fairness follows ticket order. Release is the
/// guard's `Drop`, which makes it idempotent and safe on every exit
/// path; when acquisition failed there is no guard and nothing to
/// release. Session loss while holding must release the lock — that is
/// the coordination backend's ephemeral behavior, not something this
/// seam polls for.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// The held-lock witness; dropping it releases the lock.
    type Guard: Send;

    /// Tries to acquire the lock for `resource`, waiting at most
    /// `timeout`. Returns `None` on timeout.
    async fn acquire(&self, resource: &str, timeout: Duration) -> Option<Self::Guard>;
}

#[derive(Debug, Default)]
struct ResourceState {
    next_ticket: u64,
    now_serving: u64,
    abandoned: HashSet<u64>,
}

#[derive(Default)]
struct Shared {
    resources: Mutex<HashMap<String, ResourceState>>,
    released: Notify,
}

impl Shared {
    fn release(&self, resource: &str) {
        let mut resources = self.resources.lock().unwrap();
        if let Some(state) = resources.get_mut(resource) {
            state.now_serving += 1;
            // Skip tickets whose waiters gave up.
            while state.abandoned.remove(&state.now_serving) {
                state.now_serving += 1;
            }
            if state.now_serving == state.next_ticket {
                resources.remove(resource);
            }
        }
        self.released.notify_waiters();
    }
}

/// In-process ticket lock implementing [`DistributedLock`].
///
/// One instance coordinates all tasks in a process; each resource key
/// has its own ticket sequence, so locks on different items never
/// contend with each other.
#[derive(Clone, Default)]
pub struct TicketLock {
    shared: Arc<Shared>,
}

impl TicketLock {
    /// Creates a new ticket lock.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Witness that a [`TicketLock`] is held; dropping it releases.
pub struct TicketGuard {
    shared: Arc<Shared>,
    resource: String,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        self.shared.release(&self.resource);
    }
}

#[async_trait]
impl DistributedLock for TicketLock {
    type Guard = TicketGuard;

    async fn acquire(&self, resource: &str, timeout: Duration) -> Option<TicketGuard> {
        let ticket = {
            let mut resources = self.shared.resources.lock().unwrap();
            let state = resources.entry(resource.to_string()).or_default();
            let ticket = state.next_ticket;
            state.next_ticket += 1;
            ticket
        };

        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register for release wakeups before checking, so a
            // release racing with the check is not missed.
            let released = self.shared.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            {
                let resources = self.shared.resources.lock().unwrap();
                if resources
                    .get(resource)
                    .is_some_and(|state| state.now_serving == ticket)
                {
                    return Some(TicketGuard {
                        shared: Arc::clone(&self.shared),
                        resource: resource.to_string(),
                    });
                }
            }

            if tokio::time::timeout_at(deadline, released).await.is_err() {
                let mut resources = self.shared.resources.lock().unwrap();
                let Some(state) = resources.get_mut(resource) else {
                    return None;
                };

                // The lock may have been granted between the last check
                // and the timeout firing.
                if state.now_serving == ticket {
                    drop(resources);
                    return Some(TicketGuard {
                        shared: Arc::clone(&self.shared),
                        resource: resource.to_string(),
                    });
                }

                state.abandoned.insert(ticket);
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn uncontended_acquire_succeeds() {
        let lock = TicketLock::new();
        let guard = lock.acquire("/lock/item/1", TIMEOUT).await;
        assert!(guard.is_some());
    }

    #[tokio::test]
    async fn guard_drop_releases_for_the_next_waiter() {
        let lock = TicketLock::new();

        let guard = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();
        drop(guard);

        let again = lock.acquire("/lock/item/1", TIMEOUT).await;
        assert!(again.is_some());
    }

    #[tokio::test]
    async fn second_waiter_times_out_while_held() {
        let lock = TicketLock::new();

        let _held = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();
        let loser = lock
            .acquire("/lock/item/1", Duration::from_millis(30))
            .await;
        assert!(loser.is_none());
    }

    #[tokio::test]
    async fn abandoned_ticket_is_skipped_on_release() {
        let lock = TicketLock::new();

        let held = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();
        // This waiter abandons its ticket.
        assert!(
            lock.acquire("/lock/item/1", Duration::from_millis(30))
                .await
                .is_none()
        );
        drop(held);

        // A fresh waiter must not be stuck behind the abandoned ticket.
        let next = lock.acquire("/lock/item/1", TIMEOUT).await;
        assert!(next.is_some());
    }

    #[tokio::test]
    async fn different_resources_do_not_contend() {
        let lock = TicketLock::new();

        let _a = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();
        let b = lock
            .acquire("/lock/item/2", Duration::from_millis(30))
            .await;
        assert!(b.is_some());
    }

    #[tokio::test]
    async fn critical_sections_are_mutually_exclusive() {
        let lock = TicketLock::new();
        let in_section = Arc::new(AtomicI64::new(0));
        let max_seen = Arc::new(AtomicI64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = lock.clone();
            let in_section = Arc::clone(&in_section);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _guard = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();
                let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn waiters_are_served_in_ticket_order() {
        let lock = TicketLock::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..3 {
            let lock = lock.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _guard = lock.acquire("/lock/item/1", TIMEOUT).await.unwrap();
                order.lock().unwrap().push(n);
            }));
            // Give each waiter time to take its ticket before the next.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
