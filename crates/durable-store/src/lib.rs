//! Durable store: the transactional source of truth.
//!
//! The fast store admits buyers; this crate is where an admission
//! becomes real. [`DurableStore::commit_order`] performs the
//! authoritative check-and-decrement and the order insert as one ACID
//! transaction, and the unique constraint on the reservation token is
//! the idempotency mechanism that makes channel redelivery safe.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{FailureRecord, Item, OrderRecord};
pub use store::{CommitOutcome, DurableStore, FailureLogStore};
