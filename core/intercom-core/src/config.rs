//! Boot configuration, read from TOML.
//!
//! ```toml
//! [device]
//! serial = "IC2-000154"
//! firmware = "2.3.1"
//! model = "IC-200 Lobby Panel"
//!
//! [network]
//! primary_server = "monitor-a.lan"
//! backup_server = "monitor-b.lan"
//! server_port = 7700
//!
//! [calls]
//! emergency_number = "112"
//! landlines = ["044-22334455"]
//! ```
//!
//! Every section except `[device]` may be omitted. Unknown keys are errors
//! so a typo never silently falls back to a default.

use crate::call::CallConfig;
use crate::diagnostics::DiagnosticsConfig;
use crate::emergency::EmergencyConfig;
use crate::error::ConfigError;
use crate::scheduler::ScheduleConfig;
use crate::supervisor::SupervisorConfig;
use intercom_net::{Addressing, ClientConfig, NetworkConfig};
use intercom_types::{CallerId, DeviceIdentity};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootConfig {
    pub device: DeviceSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub calls: CallsSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSection {
    pub serial: String,
    pub firmware: String,
    pub model: String,
}

/// Static default addressing and the monitoring server pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NetworkSection {
    pub ip: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub primary_server: String,
    pub backup_server: String,
    pub server_port: u16,
    pub attempt_timeout_ms: u64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        let addressing = Addressing::default();
        Self {
            ip: addressing.ip,
            subnet: addressing.subnet,
            gateway: addressing.gateway,
            dns: addressing.dns,
            primary_server: "192.168.1.10".to_string(),
            backup_server: "192.168.1.11".to_string(),
            server_port: 7700,
            attempt_timeout_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CallsSection {
    pub answer_timeout_ms: u64,
    pub dial_timeout_ms: u64,
    pub log_capacity: usize,
    pub emergency_number: String,
    pub max_emergency_call_secs: u64,
    /// Speed-dial targets, indexed from 1.
    pub landlines: Vec<String>,
    pub volume: u8,
}

impl Default for CallsSection {
    fn default() -> Self {
        Self {
            answer_timeout_ms: 30_000,
            dial_timeout_ms: 60_000,
            log_capacity: 64,
            emergency_number: "112".to_string(),
            max_emergency_call_secs: 600,
            landlines: Vec::new(),
            volume: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScheduleSection {
    pub loop_period_ms: u64,
    pub heartbeat_interval_ticks: u64,
    pub diagnostics_interval_ticks: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            loop_period_ms: 100,
            heartbeat_interval_ticks: 60,
            diagnostics_interval_ticks: 86_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DiagnosticsSection {
    pub low_battery_percent: u8,
    pub max_temperature_c: f32,
    pub max_memory_percent: u8,
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        let defaults = DiagnosticsConfig::default();
        Self {
            low_battery_percent: defaults.low_battery_percent,
            max_temperature_c: defaults.max_temperature_c,
            max_memory_percent: defaults.max_memory_percent,
        }
    }
}

impl BootConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded boot configuration from {:?}", path);
        Ok(config)
    }

    /// Validates identifiers and builds the runtime configuration.
    pub fn into_supervisor_config(self) -> Result<SupervisorConfig, ConfigError> {
        let identity = DeviceIdentity::new(
            &self.device.serial,
            &self.device.firmware,
            &self.device.model,
        )
        .map_err(|source| ConfigError::Identifier {
            field: "device",
            source,
        })?;

        if self.schedule.loop_period_ms == 0 {
            return Err(ConfigError::Invalid("loop_period_ms must be positive".into()));
        }
        if self.network.attempt_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "attempt_timeout_ms must be positive".into(),
            ));
        }

        let net = self.network;
        let network = NetworkConfig::new(
            Addressing {
                ip: net.ip,
                subnet: net.subnet,
                gateway: net.gateway,
                dns: net.dns,
            },
            net.primary_server,
            net.backup_server,
            net.server_port,
        );

        let destination: CallerId = self.calls.emergency_number.parse().map_err(|source| {
            ConfigError::Identifier {
                field: "emergency_number",
                source,
            }
        })?;
        let landlines = self
            .calls
            .landlines
            .iter()
            .map(|n| n.parse::<CallerId>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::Identifier {
                field: "landlines",
                source,
            })?;

        Ok(SupervisorConfig {
            identity,
            network,
            client: ClientConfig {
                attempt_timeout: Duration::from_millis(net.attempt_timeout_ms),
            },
            calls: CallConfig {
                answer_timeout: Duration::from_millis(self.calls.answer_timeout_ms),
                dial_timeout: Duration::from_millis(self.calls.dial_timeout_ms),
                log_capacity: self.calls.log_capacity,
            },
            emergency: EmergencyConfig {
                destination,
                max_call: Duration::from_secs(self.calls.max_emergency_call_secs),
            },
            schedule: ScheduleConfig {
                heartbeat_interval: self.schedule.heartbeat_interval_ticks,
                diagnostics_interval: self.schedule.diagnostics_interval_ticks,
            },
            diagnostics: DiagnosticsConfig {
                low_battery_percent: self.diagnostics.low_battery_percent,
                max_temperature_c: self.diagnostics.max_temperature_c,
                max_memory_percent: self.diagnostics.max_memory_percent,
            },
            loop_period: Duration::from_millis(self.schedule.loop_period_ms),
            landlines,
            volume: self.calls.volume,
        })
    }
}
