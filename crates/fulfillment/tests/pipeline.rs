//! End-to-end pipeline tests over the in-memory implementations:
//! reservation service → intent topic → order consumer → durable store,
//! with the failure sink feeding the failure-log consumer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use channel::{
    ChannelFailureSink, Disposition, InMemoryIntentChannel, InMemoryTopic, MessageHandler,
};
use common::{BuyerId, RejectReason};
use durable_store::{DurableStore, FailureLogStore, InMemoryStore};
use fast_store::{FastStore, InMemoryFastStore, stock_key};
use fulfillment::{FailureLogConsumer, OrderConsumer, WorkerPool};
use reservation::{
    InMemoryBlacklist, ItemCatalog, ReservationOutcome, ReservationService, TicketLock,
};

struct Pipeline {
    service: Arc<
        ReservationService<
            InMemoryFastStore,
            InMemoryBlacklist,
            TicketLock,
            InMemoryIntentChannel,
            ChannelFailureSink,
        >,
    >,
    fast: InMemoryFastStore,
    store: InMemoryStore,
    intent_topic: Arc<InMemoryTopic>,
    failure_topic: Arc<InMemoryTopic>,
}

fn pipeline(partitions: usize) -> Pipeline {
    let fast = InMemoryFastStore::new();
    let store = InMemoryStore::new();
    let intent_topic = InMemoryTopic::new(partitions);
    let failure_topic = InMemoryTopic::new(1);

    let service = Arc::new(ReservationService::new(
        fast.clone(),
        InMemoryBlacklist::new(),
        TicketLock::new(),
        InMemoryIntentChannel::new(Arc::clone(&intent_topic)),
        ChannelFailureSink::new(Arc::clone(&failure_topic)),
    ));

    Pipeline {
        service,
        fast,
        store,
        intent_topic,
        failure_topic,
    }
}

async fn wait_until<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Reads the head payload of a partition without acknowledging it.
struct Peek(tokio::sync::Mutex<Option<String>>);

#[async_trait]
impl MessageHandler for Peek {
    async fn handle(&self, payload: &str) -> Disposition {
        *self.0.lock().await = Some(payload.to_string());
        Disposition::Redeliver
    }
}

#[tokio::test]
async fn last_unit_one_winner_and_redelivery_commits_once() {
    let p = pipeline(1);
    let catalog = ItemCatalog::new(p.fast.clone(), p.store.clone());
    let item = catalog
        .create_item("Limited print", 49900, 1)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for buyer in 0..2 {
        let service = Arc::clone(&p.service);
        handles.push(tokio::spawn(async move {
            service.reserve(item.id, BuyerId::new(buyer)).await.unwrap()
        }));
    }

    let mut admitted = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ReservationOutcome::Admitted { .. } => admitted += 1,
            ReservationOutcome::Rejected(RejectReason::OutOfStock) => out_of_stock += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(
        p.fast.get_count(&stock_key(item.id)).await.unwrap(),
        Some(0)
    );

    // Grab the winning intent's payload, then hand it to the consumer
    // twice, as a broker would after a lost acknowledgment.
    let peek = Peek(tokio::sync::Mutex::new(None));
    p.intent_topic.deliver_next(0, &peek).await;
    let payload = peek.0.lock().await.clone().unwrap();

    let consumer = OrderConsumer::new(p.store.clone());
    assert_eq!(consumer.handle(&payload).await, Disposition::Commit);
    assert_eq!(consumer.handle(&payload).await, Disposition::Commit);

    assert_eq!(p.store.order_count(item.id).await.unwrap(), 1);
    assert_eq!(p.store.stock(item.id).await.unwrap(), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_drains_to_exact_orders_and_failure_log() {
    let p = pipeline(4);
    let catalog = ItemCatalog::new(p.fast.clone(), p.store.clone());
    let item = catalog.create_item("Drop sneaker", 18900, 5).await.unwrap();

    let order_pool = WorkerPool::spawn(
        Arc::clone(&p.intent_topic),
        Arc::new(OrderConsumer::new(p.store.clone())),
    );
    let failure_pool = WorkerPool::spawn(
        Arc::clone(&p.failure_topic),
        Arc::new(FailureLogConsumer::new(p.store.clone())),
    );

    let mut handles = Vec::new();
    for buyer in 0..25 {
        let service = Arc::clone(&p.service);
        handles.push(tokio::spawn(async move {
            service.reserve(item.id, BuyerId::new(buyer)).await.unwrap()
        }));
    }
    let admitted = {
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_admitted() {
                admitted += 1;
            }
        }
        admitted
    };
    assert_eq!(admitted, 5);

    // Rejections are recorded off the hot path; wait for the sink and
    // consumer to catch up before closing anything.
    wait_until("5 orders committed", || async {
        p.store.order_count(item.id).await.unwrap() == 5
    })
    .await;
    wait_until("20 failures logged", || async {
        p.store.failure_count().await.unwrap() == 20
    })
    .await;

    p.intent_topic.close();
    p.failure_topic.close();
    order_pool.join().await;
    failure_pool.join().await;

    assert_eq!(p.store.stock(item.id).await.unwrap(), Some(0));
    assert_eq!(
        p.fast.get_count(&stock_key(item.id)).await.unwrap(),
        Some(0)
    );
    let failures = p.store.failures().await;
    assert_eq!(failures.len(), 20);
    assert!(failures.iter().all(|f| f.reason == "OUT_OF_STOCK"));
}

#[tokio::test]
async fn transient_commit_failure_is_redelivered_until_it_lands() {
    let p = pipeline(1);
    let catalog = ItemCatalog::new(p.fast.clone(), p.store.clone());
    let item = catalog.create_item("Widget", 1000, 1).await.unwrap();

    let outcome = p.service.reserve(item.id, BuyerId::new(7)).await.unwrap();
    assert!(outcome.is_admitted());

    // The store is down when the worker first sees the intent.
    p.store.set_fail_on_commit(true).await;
    let pool = WorkerPool::spawn(
        Arc::clone(&p.intent_topic),
        Arc::new(OrderConsumer::new(p.store.clone())),
    );
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(p.store.order_count(item.id).await.unwrap(), 0);

    p.store.set_fail_on_commit(false).await;
    wait_until("the redelivered intent to commit", || async {
        p.store.order_count(item.id).await.unwrap() == 1
    })
    .await;

    p.intent_topic.close();
    pool.join().await;

    assert_eq!(p.store.order_count(item.id).await.unwrap(), 1);
    assert_eq!(p.store.stock(item.id).await.unwrap(), Some(0));
}
