//! Host-side simulator for the intercom control core.
//!
//! - [`device`]: a simulated board implementing every port
//! - [`scenario`]: TOML scenarios that configure the board and script events
//! - [`monitor`]: a monitoring server stub with an HTTP status API

pub mod device;
pub mod monitor;
pub mod scenario;

use anyhow::{Result, anyhow};
use device::SimDevice;
use intercom_core::{Supervisor, boot};
use intercom_net::ServerTransport;
use scenario::Scenario;
use std::sync::Arc;
use tracing::info;

/// Boots a simulated device from `scenario` and runs it for `ticks` ticks.
pub async fn run_device(
    scenario: Scenario,
    transport: Arc<dyn ServerTransport>,
    ticks: u64,
) -> Result<(Supervisor, SimDevice)> {
    let config = scenario.boot.into_supervisor_config()?;
    let device = SimDevice::new(scenario.board, scenario.events, config.loop_period);

    let mut supervisor = boot(config, device.peripherals(), transport)
        .await
        .map_err(|e| anyhow!("Boot failed: {e}"))?;
    info!(
        "Device up: {:?}, registration {}",
        supervisor.status(),
        supervisor.registration()
    );

    supervisor.run_for(ticks).await;
    Ok((supervisor, device))
}
