//! Error types for the network layer.

use crate::registration::RegistrationState;
use thiserror::Error;

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors that can occur talking to the monitoring server.
#[derive(Debug, Error)]
pub enum NetError {
    /// Socket-level failure (resolve, connect, read, write).
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// The attempt did not finish within its timeout.
    #[error("operation timed out")]
    Timeout,

    /// The server answered but refused the message.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// Malformed frame or unexpected reply.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A registration state change that the state machine does not allow.
    #[error("invalid registration transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: RegistrationState,
        to: RegistrationState,
    },
}
