//! Collaborator seams consulted by the reservation paths.

pub mod blacklist;
pub mod lock;

pub use blacklist::{BlacklistGate, InMemoryBlacklist};
pub use lock::{DistributedLock, TicketGuard, TicketLock};
