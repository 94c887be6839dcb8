//! Flash-sale simulation entry point.
//!
//! Wires the in-memory stack end to end — reservation service, intent
//! topic, order consumer, failure topic, failure-log consumer — runs a
//! concurrent buyer burst against one sale item, drains the pipeline,
//! and prints the tally plus the Prometheus metrics snapshot.

mod config;

use std::sync::Arc;
use std::time::Duration;

use channel::{ChannelFailureSink, InMemoryIntentChannel, InMemoryTopic};
use common::{BuyerId, ReservationToken};
use durable_store::{DurableStore, FailureLogStore, InMemoryStore};
use fast_store::{FastStore, InMemoryFastStore, stock_key};
use fulfillment::{FailureLogConsumer, OrderConsumer, WorkerPool};
use reservation::{InMemoryBlacklist, ItemCatalog, ReservationService, TicketLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let config = Config::from_env();
    tracing::info!(?config, "starting flash-sale simulation");

    // 3. Wire the in-memory stack
    let fast = InMemoryFastStore::new();
    let store = InMemoryStore::new();
    let blacklist = InMemoryBlacklist::new();
    let intent_topic = InMemoryTopic::new(config.partitions);
    let failure_topic = InMemoryTopic::new(1);

    let service = Arc::new(ReservationService::new(
        fast.clone(),
        blacklist.clone(),
        TicketLock::new(),
        InMemoryIntentChannel::new(Arc::clone(&intent_topic)),
        ChannelFailureSink::new(Arc::clone(&failure_topic)),
    ));

    // 4. Seed the sale item (durable row + pre-warmed fast counter)
    let catalog = ItemCatalog::new(fast.clone(), store.clone());
    let item = catalog
        .create_item("Limited sneaker drop", 18900, config.stock)
        .await
        .expect("failed to seed sale item");

    // One scripted client for the blacklist gate to turn away.
    blacklist.add(BuyerId::new(0), "scripted client").await;

    // 5. Start one worker per partition on each topic
    let order_pool = WorkerPool::spawn(
        Arc::clone(&intent_topic),
        Arc::new(OrderConsumer::new(store.clone())),
    );
    let failure_pool = WorkerPool::spawn(
        Arc::clone(&failure_topic),
        Arc::new(FailureLogConsumer::new(store.clone())),
    );

    // 6. Fire the buyer burst
    let mut handles = Vec::new();
    for buyer in 0..config.buyers {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.reserve(item.id, BuyerId::new(buyer)).await
        }));
    }

    let mut admitted: Vec<ReservationToken> = Vec::new();
    let mut rejected = 0u64;
    for handle in handles {
        match handle.await.expect("buyer task panicked") {
            Ok(outcome) => match outcome.token() {
                Some(token) => admitted.push(token),
                None => rejected += 1,
            },
            Err(e) => tracing::error!(error = %e, "reservation attempt errored"),
        }
    }
    tracing::info!(
        admitted = admitted.len(),
        rejected,
        "burst complete, draining pipeline"
    );

    // 7. Graceful drain: wait for the consumers to catch up, then close
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        let orders = store.order_count(item.id).await.unwrap_or(0);
        let failures = store.failure_count().await.unwrap_or(0);
        if orders as usize == admitted.len() && failures as u64 == rejected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    intent_topic.close();
    failure_topic.close();
    order_pool.join().await;
    failure_pool.join().await;

    // 8. Final tally
    let orders = store.order_count(item.id).await.expect("order count");
    let failures = store.failure_count().await.expect("failure count");
    let durable_stock = store.stock(item.id).await.expect("durable stock");
    let fast_stock = fast.get_count(&stock_key(item.id)).await.expect("fast stock");
    tracing::info!(
        orders,
        failures,
        ?durable_stock,
        ?fast_stock,
        "sale finished"
    );

    println!("{}", metrics_handle.render());
}
