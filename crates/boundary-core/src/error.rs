//! Shared error type across boundary crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, BoundaryError>;

/// Unified error type used by core and broker.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// Malformed frame, skeleton, or value. Fatal to one exchange only.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Wire class tag with no known envelope variant.
    #[error("unknown envelope tag: {0}")]
    UnknownTag(String),
    /// A channel id is already registered.
    #[error("channel already registered: {0}")]
    ChannelExists(String),
    /// A bounded wait elapsed without a message.
    #[error("timed out waiting for message")]
    Timeout,
    /// The router task is no longer running.
    #[error("boundary stopped")]
    Stopped,
    /// Configuration rejected at load or validation time.
    #[error("config error: {0}")]
    Config(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl BoundaryError {
    /// Shorthand for a protocol-level failure.
    pub fn protocol(msg: impl Into<String>) -> Self {
        BoundaryError::Protocol(msg.into())
    }
}
