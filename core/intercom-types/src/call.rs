//! Call descriptors.

use crate::ids::{CallerId, ConnectionId};
use crate::tick::Tick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of call, which decides the path through the call state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    /// Inbound call: rings, waits for an answer.
    Incoming,
    /// Call placed from the keypad or a speed-dial button.
    Outgoing,
    /// Call placed by the emergency arbitrator.
    Emergency,
}

impl CallType {
    /// Returns true if the device placed this call.
    #[must_use]
    pub const fn is_outbound(&self) -> bool {
        matches!(self, Self::Outgoing | Self::Emergency)
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// An inbound call as reported by the signaling layer, before the core
/// stamps it with a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCall {
    pub caller: CallerId,
    pub connection: ConnectionId,
}

impl IncomingCall {
    pub fn new(caller: CallerId, connection: ConnectionId) -> Self {
        Self { caller, connection }
    }
}

/// The call currently owned by the call state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// Remote party: caller id for inbound calls, dialed number otherwise.
    pub caller: CallerId,
    /// Call kind.
    pub kind: CallType,
    /// Signaling/audio session handle.
    pub connection: ConnectionId,
    /// Tick at which the call was detected or placed.
    pub created_at: Tick,
}

impl CallInfo {
    /// Creates a call descriptor.
    #[must_use]
    pub fn new(caller: CallerId, kind: CallType, connection: ConnectionId, created_at: Tick) -> Self {
        Self {
            caller,
            kind,
            connection,
            created_at,
        }
    }

    /// Stamps an inbound call with the tick it was detected on.
    #[must_use]
    pub fn incoming(call: IncomingCall, at: Tick) -> Self {
        Self::new(call.caller, CallType::Incoming, call.connection, at)
    }
}
