//! Core type definitions for the intercom control core.
//!
//! This crate defines the plain data shared by every layer of the endpoint:
//! - Fixed-capacity identifiers (serials, firmware versions, caller numbers)
//! - Device identity, fixed at boot
//! - Call descriptors and keypad/button input
//! - The tick counter used as the unit of elapsed time
//! - Heartbeat samples and self-diagnostics reports
//!
//! Behaviour (state machines, scheduling, networking) lives in the
//! `intercom-net` and `intercom-core` crates, not here.

mod call;
mod identity;
mod ids;
mod input;
mod telemetry;
mod tick;

pub use call::{CallInfo, CallType, IncomingCall};
pub use identity::DeviceIdentity;
pub use ids::{BoundedString, CallerId, ConnectionId, FirmwareVersion, ModelName, SerialNumber};
pub use input::{ConfigEntry, FunctionKey, KeypadKey, UserInput, VolumeStep};
pub use telemetry::{Component, DiagnosticIssue, DiagnosticsReport, HeartbeatSample, Severity};
pub use tick::{Tick, ticks_for};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier: length {len} outside 1..={capacity}")]
    InvalidIdentifier { len: usize, capacity: usize },

    #[error("invalid user input: {0}")]
    InvalidInput(String),
}
