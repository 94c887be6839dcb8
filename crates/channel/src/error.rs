//! Channel error types.

use thiserror::Error;

/// Errors that can occur publishing to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The topic has been closed and accepts no new messages.
    #[error("channel is closed")]
    Closed,
}

/// Convenience type alias for channel results.
pub type Result<T> = std::result::Result<T, ChannelError>;
