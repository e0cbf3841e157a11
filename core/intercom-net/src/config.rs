//! Network configuration.
//!
//! Addressing comes either from a DHCP lease or from the static defaults the
//! host firmware ships with. [`NetworkConfig`] holds exactly one active
//! source; switching sources replaces the active addresses wholesale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Where the active addresses came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    Dhcp,
    StaticDefault,
}

/// IPv4 interface addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressing {
    pub ip: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
}

impl Default for Addressing {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::new(192, 168, 1, 100),
            subnet: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            dns: Ipv4Addr::new(8, 8, 8, 8),
        }
    }
}

/// A monitoring server address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Device network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    source: AddressSource,
    active: Addressing,
    static_defaults: Addressing,
    primary_server: String,
    backup_server: String,
    server_port: u16,
}

impl NetworkConfig {
    /// Creates a configuration running on the static defaults.
    pub fn new(
        static_defaults: Addressing,
        primary_server: impl Into<String>,
        backup_server: impl Into<String>,
        server_port: u16,
    ) -> Self {
        Self {
            source: AddressSource::StaticDefault,
            active: static_defaults,
            static_defaults,
            primary_server: primary_server.into(),
            backup_server: backup_server.into(),
            server_port,
        }
    }

    /// Switches to addresses obtained from a DHCP lease.
    pub fn apply_dhcp_lease(&mut self, lease: Addressing) {
        self.source = AddressSource::Dhcp;
        self.active = lease;
    }

    /// Switches back to the static defaults.
    pub fn revert_to_static(&mut self) {
        self.source = AddressSource::StaticDefault;
        self.active = self.static_defaults;
    }

    pub fn source(&self) -> AddressSource {
        self.source
    }

    /// The addresses currently in effect.
    pub fn addressing(&self) -> &Addressing {
        &self.active
    }

    pub fn static_defaults(&self) -> &Addressing {
        &self.static_defaults
    }

    pub fn primary(&self) -> ServerEndpoint {
        ServerEndpoint::new(&self.primary_server, self.server_port)
    }

    pub fn backup(&self) -> ServerEndpoint {
        ServerEndpoint::new(&self.backup_server, self.server_port)
    }
}
