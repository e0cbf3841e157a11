//! Error types for the control core.

use crate::call::CallState;
use thiserror::Error;

/// Result type for call state machine operations.
pub type CallResult<T> = Result<T, CallError>;

/// Operations the call state machine refuses in its current state.
///
/// Collaborator failures are not errors: they are outcomes (see
/// [`crate::call::CallEvent`]) and always leave the machine idle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The single call slot is taken.
    #[error("call slot busy ({0:?})")]
    Busy(CallState),

    /// The operation does not apply in this state.
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: CallState,
    },

    /// `dial` was asked to place an inbound call.
    #[error("incoming calls cannot be dialed")]
    NotOutbound,
}

/// Errors loading or validating the boot configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {source}")]
    Identifier {
        field: &'static str,
        #[source]
        source: intercom_types::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal boot failures. The supervisor loop is never entered.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("hardware initialization failed")]
    HardwareInit,
}
