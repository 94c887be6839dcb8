//! Stock reservation: deciding admit or reject under contention.
//!
//! [`ReservationService`] offers two paths to the same decision:
//!
//! 1. the primary path, where one atomic fast-store check-and-decrement
//!    is the only synchronization point, and
//! 2. a fallback path that serializes all reservations for an item
//!    through a distributed lock, trading throughput for strong
//!    consistency on the cached count.
//!
//! Both paths consult the blacklist gate first and hand every rejection
//! to the failure sink without blocking on it.

pub mod catalog;
pub mod error;
pub mod service;
pub mod services;

pub use catalog::ItemCatalog;
pub use error::{ReservationError, Result};
pub use service::{ReservationOutcome, ReservationService};
pub use services::{
    BlacklistGate, DistributedLock, InMemoryBlacklist, TicketGuard, TicketLock,
};
