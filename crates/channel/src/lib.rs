//! Message channel connecting the reservation stage to fulfillment.
//!
//! Delivery semantics are at-least-once with manual acknowledgment:
//! a message is retained at the head of its partition until the
//! consumer's handler returns [`Disposition::Commit`] or
//! [`Disposition::Drop`]; [`Disposition::Redeliver`] leaves it in place
//! for another attempt. Messages are partitioned by item key, so
//! commits for one item are ordered while different items proceed
//! concurrently. Consumers must be idempotent — the reservation token
//! is the correlation id that makes redelivery detectable downstream.

pub mod error;
pub mod intents;
pub mod message;
pub mod sink;
pub mod topic;

pub use error::{ChannelError, Result};
pub use intents::{InMemoryIntentChannel, OrderIntentChannel};
pub use message::{FailureEvent, MalformedIntent, OrderIntent};
pub use sink::{ChannelFailureSink, FailureSink, RecordingFailureSink};
pub use topic::{Disposition, InMemoryTopic, MessageHandler};
