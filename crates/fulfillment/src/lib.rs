//! Order fulfillment: turning admitted reservations into durable orders.
//!
//! [`OrderConsumer`] drives each intent message through
//! `Received → Parsed → (Committed | DuplicateDetected | Malformed |
//! TransientError)`. The durable check-and-decrement and the order
//! insert happen in one transaction, the unique reservation token makes
//! redelivery idempotent, and the returned [`Disposition`] is the only
//! acknowledgment mechanism — there is no local retry loop.
//!
//! [`Disposition`]: channel::Disposition

pub mod consumer;
pub mod failure_log;
pub mod worker;

pub use consumer::OrderConsumer;
pub use failure_log::FailureLogConsumer;
pub use worker::WorkerPool;
