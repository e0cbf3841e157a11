//! Endpoint client: registration handshake and best-effort telemetry.

use crate::config::{NetworkConfig, ServerEndpoint};
use crate::error::{NetError, NetResult};
use crate::protocol::{ServerMessage, ServerReply};
use crate::registration::{RegistrationState, ServerRole};
use crate::transport::ServerTransport;
use intercom_types::{DeviceIdentity, DiagnosticsReport, HeartbeatSample};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the endpoint client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for one connect+send+reply attempt.
    pub attempt_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(3),
        }
    }
}

/// Talks to the monitoring server pair on behalf of the device.
pub struct EndpointClient {
    transport: Arc<dyn ServerTransport>,
    config: ClientConfig,
    state: RegistrationState,
    /// Server that accepted the last successful registration.
    registered_with: Option<ServerRole>,
}

impl EndpointClient {
    pub fn new(transport: Arc<dyn ServerTransport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            state: RegistrationState::Unregistered,
            registered_with: None,
        }
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn registered_with(&self) -> Option<ServerRole> {
        self.registered_with
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.config.attempt_timeout
    }

    /// Registers with the primary server, falling back to the backup.
    ///
    /// Each server is tried exactly once. When both fail the state ends in
    /// [`RegistrationState::Failed`] and the device keeps running
    /// unregistered; retrying is the caller's decision.
    pub async fn register(
        &mut self,
        identity: &DeviceIdentity,
        network: &NetworkConfig,
    ) -> RegistrationState {
        let message = ServerMessage::register(identity, network);
        self.registered_with = None;
        self.advance(RegistrationState::PendingPrimary);

        let primary = network.primary();
        match self.attempt(&primary, &message).await {
            Ok(()) => {
                info!("Registered with primary server {}", primary);
                self.registered_with = Some(ServerRole::Primary);
                self.advance(RegistrationState::Registered);
                return self.state;
            }
            Err(e) => warn!("Primary server {} unavailable: {}", primary, e),
        }

        self.advance(RegistrationState::PendingBackup);
        let backup = network.backup();
        match self.attempt(&backup, &message).await {
            Ok(()) => {
                info!("Registered with backup server {}", backup);
                self.registered_with = Some(ServerRole::Backup);
                self.advance(RegistrationState::Registered);
            }
            Err(e) => {
                warn!("Backup server {} unavailable: {}", backup, e);
                self.advance(RegistrationState::Failed);
            }
        }
        self.state
    }

    /// Sends one heartbeat. Failures are returned, never retried here.
    pub async fn send_heartbeat(
        &self,
        identity: &DeviceIdentity,
        network: &NetworkConfig,
        sample: HeartbeatSample,
    ) -> NetResult<()> {
        let server = self.telemetry_server(network);
        self.attempt(&server, &ServerMessage::heartbeat(identity, sample))
            .await
    }

    /// Reports self-test findings. Failures are returned, never retried here.
    pub async fn report_diagnostics(
        &self,
        identity: &DeviceIdentity,
        network: &NetworkConfig,
        report: DiagnosticsReport,
    ) -> NetResult<()> {
        let server = self.telemetry_server(network);
        self.attempt(&server, &ServerMessage::diagnostics(identity, report))
            .await
    }

    /// Telemetry goes to whichever server accepted us, primary otherwise.
    fn telemetry_server(&self, network: &NetworkConfig) -> ServerEndpoint {
        match self.registered_with {
            Some(ServerRole::Backup) => network.backup(),
            Some(ServerRole::Primary) | None => network.primary(),
        }
    }

    async fn attempt(&self, server: &ServerEndpoint, message: &ServerMessage) -> NetResult<()> {
        debug!("Sending {} to {}", message.kind(), server);
        let exchange = self.transport.exchange(server, message);
        match tokio::time::timeout(self.config.attempt_timeout, exchange).await {
            Err(_) => Err(NetError::Timeout),
            Ok(Err(e)) => Err(e),
            Ok(Ok(ServerReply::Ack)) => Ok(()),
            Ok(Ok(ServerReply::Reject { reason })) => Err(NetError::Rejected(reason)),
        }
    }

    fn advance(&mut self, next: RegistrationState) {
        match self.state.transition(next) {
            Ok(state) => {
                debug!("Registration {} -> {}", self.state, state);
                self.state = state;
            }
            // Only reachable from an in-flight attempt that was cancelled
            // mid-await; restart the sequence from a resting state.
            Err(e) => {
                warn!("{}", e);
                self.state = next;
            }
        }
    }
}
