//! Messages exchanged with the monitoring server.
//!
//! Every exchange is one request from the device followed by one reply from
//! the server, then the connection is closed.

use crate::config::NetworkConfig;
use intercom_types::{DeviceIdentity, DiagnosticsReport, HeartbeatSample, SerialNumber};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u32 = 1;

/// A request sent by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Registration handshake.
    Register(RegisterMessage),
    /// Periodic health telemetry.
    Heartbeat(HeartbeatMessage),
    /// Critical findings from a self-test.
    Diagnostics(DiagnosticsMessage),
}

impl ServerMessage {
    /// Builds the registration payload for this device.
    pub fn register(identity: &DeviceIdentity, network: &NetworkConfig) -> Self {
        Self::Register(RegisterMessage {
            version: PROTOCOL_VERSION,
            serial: identity.serial.clone(),
            firmware: identity.firmware.to_string(),
            model: identity.model.to_string(),
            ip: network.addressing().ip,
        })
    }

    pub fn heartbeat(identity: &DeviceIdentity, sample: HeartbeatSample) -> Self {
        Self::Heartbeat(HeartbeatMessage {
            serial: identity.serial.clone(),
            sample,
        })
    }

    pub fn diagnostics(identity: &DeviceIdentity, report: DiagnosticsReport) -> Self {
        Self::Diagnostics(DiagnosticsMessage {
            serial: identity.serial.clone(),
            report,
        })
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Heartbeat(_) => "heartbeat",
            Self::Diagnostics(_) => "diagnostics",
        }
    }

    /// Serial number of the sending device.
    pub fn serial(&self) -> &SerialNumber {
        match self {
            Self::Register(m) => &m.serial,
            Self::Heartbeat(m) => &m.serial,
            Self::Diagnostics(m) => &m.serial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMessage {
    /// Protocol version.
    pub version: u32,
    pub serial: SerialNumber,
    pub firmware: String,
    pub model: String,
    /// Address the device is reachable on.
    pub ip: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    pub serial: SerialNumber,
    pub sample: HeartbeatSample,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsMessage {
    pub serial: SerialNumber,
    pub report: DiagnosticsReport,
}

/// The server's answer to a [`ServerMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerReply {
    Ack,
    Reject { reason: String },
}

impl ServerReply {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }
}
