//! Boot sequence.
//!
//! Only a hardware failure stops the device from starting. Everything after
//! that (DHCP, link, audio, registration) degrades the system but leaves it
//! able to place and take calls.

use crate::error::BootError;
use crate::ports::Peripherals;
use crate::supervisor::{Supervisor, SupervisorConfig};
use intercom_net::{EndpointClient, ServerTransport};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    /// Every boot step succeeded.
    Ready,
    /// Running with at least one [`BootWarning`].
    Degraded,
}

/// A non-fatal boot problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootWarning {
    /// No DHCP lease; running on the static defaults.
    DhcpUnavailable,
    NetworkApplyFailed,
    ConnectivityFailed,
    AudioTestFailed,
    /// Neither monitoring server accepted the registration.
    RegistrationFailed,
}

impl fmt::Display for BootWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DhcpUnavailable => "DHCP unavailable, using static defaults",
            Self::NetworkApplyFailed => "network configuration not applied",
            Self::ConnectivityFailed => "gateway unreachable",
            Self::AudioTestFailed => "audio self-test failed",
            Self::RegistrationFailed => "monitoring server unreachable",
        };
        f.write_str(s)
    }
}

/// Brings up the device and returns a supervisor ready to run.
pub async fn boot(
    config: SupervisorConfig,
    mut peripherals: Peripherals,
    transport: Arc<dyn ServerTransport>,
) -> Result<Supervisor, BootError> {
    info!(
        "Booting {} serial {} firmware {}",
        config.identity.model, config.identity.serial, config.identity.firmware
    );
    peripherals.display.show("Starting...");

    if !peripherals.hardware.initialize() {
        error!("Hardware initialization failed");
        peripherals.hardware.signal_boot_failure();
        peripherals.display.show("Hardware failure");
        return Err(BootError::HardwareInit);
    }

    let mut warnings = Vec::new();
    let mut network = config.network.clone();

    match peripherals.hardware.request_dhcp() {
        Some(lease) => {
            info!("DHCP lease {} via {}", lease.ip, lease.gateway);
            network.apply_dhcp_lease(lease);
        }
        None => {
            warn!("No DHCP lease, using static defaults");
            network.revert_to_static();
            warnings.push(BootWarning::DhcpUnavailable);
        }
    }

    if !peripherals.hardware.apply_network_config(&network) {
        warn!("Failed to apply network configuration");
        warnings.push(BootWarning::NetworkApplyFailed);
    }
    if !peripherals.hardware.test_connectivity() {
        warn!("Connectivity test failed");
        warnings.push(BootWarning::ConnectivityFailed);
    }
    if !peripherals.hardware.test_audio() {
        warn!("Audio self-test failed");
        warnings.push(BootWarning::AudioTestFailed);
    }

    let mut client = EndpointClient::new(transport, config.client.clone());
    if !client.register(&config.identity, &network).await.is_registered() {
        warnings.push(BootWarning::RegistrationFailed);
    }

    peripherals.audio.set_volume(config.volume.min(crate::context::MAX_VOLUME));

    if warnings.is_empty() {
        info!("Boot complete");
        peripherals.display.show("Ready");
    } else {
        for w in &warnings {
            warn!("Boot warning: {}", w);
        }
        peripherals.display.show(&format!("Degraded: {}", warnings[0]));
    }

    Ok(Supervisor::assemble(config, network, peripherals, client, warnings))
}
