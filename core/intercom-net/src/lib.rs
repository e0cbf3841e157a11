//! Monitoring-server endpoint client for the intercom control core.
//!
//! The device announces itself to a monitoring server and keeps it informed
//! with heartbeats and diagnostics reports. A primary/backup server pair is
//! configured; the backup is only tried when the primary fails.
//!
//! ## Components
//!
//! - **Config**: LAN addressing (DHCP or static defaults) and server pair
//! - **Registration**: the registration state machine
//! - **Protocol**: messages exchanged with the server
//! - **Codec**: length-prefixed JSON framing
//! - **Transport**: abstracts how a message reaches a server
//! - **Client**: registration handshake and best-effort telemetry
//!
//! Every network attempt is bounded by a timeout; the client never retries
//! inline. Retrying is left to the supervisor's schedule.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use intercom_net::{ClientConfig, EndpointClient, RegistrationState, TcpTransport};
//!
//! let client = EndpointClient::new(Arc::new(TcpTransport), ClientConfig::default());
//! assert_eq!(client.state(), RegistrationState::Unregistered);
//! ```

mod client;
pub mod codec;
pub mod config;
mod error;
pub mod protocol;
pub mod registration;
pub mod transport;

pub use client::{ClientConfig, EndpointClient};
pub use config::{AddressSource, Addressing, NetworkConfig, ServerEndpoint};
pub use error::{NetError, NetResult};
pub use protocol::{
    DiagnosticsMessage, HeartbeatMessage, PROTOCOL_VERSION, RegisterMessage, ServerMessage,
    ServerReply,
};
pub use registration::{RegistrationState, ServerRole};
pub use transport::{ServerTransport, TcpTransport};
