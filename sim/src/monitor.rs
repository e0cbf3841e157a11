//! Monitoring server stub.
//!
//! Accepts registrations, heartbeats and diagnostics over the device wire
//! protocol and exposes what it has seen through a small HTTP API.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use intercom_net::codec::{read_frame, write_frame};
use intercom_net::{NetResult, PROTOCOL_VERSION, ServerMessage, ServerReply};
use intercom_types::{DiagnosticsReport, HeartbeatSample};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// What the monitor knows about one device.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DeviceStatus {
    pub serial: String,
    pub model: String,
    pub firmware: String,
    pub ip: Ipv4Addr,
    pub registrations: u64,
    pub heartbeats: u64,
    pub last_heartbeat: Option<HeartbeatSample>,
    pub last_report: Option<DiagnosticsReport>,
}

/// Shared device table.
#[derive(Clone, Default)]
pub struct MonitorState {
    devices: Arc<RwLock<HashMap<String, DeviceStatus>>>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one device message and returns the reply to send.
    pub async fn handle(&self, message: ServerMessage) -> ServerReply {
        let mut devices = self.devices.write().await;
        match message {
            ServerMessage::Register(reg) => {
                if reg.version != PROTOCOL_VERSION {
                    warn!("Rejecting {}: protocol version {}", reg.serial, reg.version);
                    return ServerReply::reject(format!(
                        "unsupported protocol version {}",
                        reg.version
                    ));
                }
                let serial = reg.serial.to_string();
                info!("Registered {} ({} {}) at {}", serial, reg.model, reg.firmware, reg.ip);
                let entry = devices.entry(serial.clone()).or_insert_with(|| DeviceStatus {
                    serial,
                    model: String::new(),
                    firmware: String::new(),
                    ip: reg.ip,
                    registrations: 0,
                    heartbeats: 0,
                    last_heartbeat: None,
                    last_report: None,
                });
                entry.model = reg.model;
                entry.firmware = reg.firmware;
                entry.ip = reg.ip;
                entry.registrations += 1;
                ServerReply::Ack
            }
            ServerMessage::Heartbeat(hb) => match devices.get_mut(hb.serial.as_str()) {
                Some(device) => {
                    debug!("Heartbeat from {}: battery {}%", hb.serial, hb.sample.battery_percent);
                    device.heartbeats += 1;
                    device.last_heartbeat = Some(hb.sample);
                    ServerReply::Ack
                }
                None => ServerReply::reject("unknown device"),
            },
            ServerMessage::Diagnostics(diag) => match devices.get_mut(diag.serial.as_str()) {
                Some(device) => {
                    warn!(
                        "{} reported {} issue(s)",
                        diag.serial,
                        diag.report.issues.len()
                    );
                    device.last_report = Some(diag.report);
                    ServerReply::Ack
                }
                None => ServerReply::reject("unknown device"),
            },
        }
    }

    /// All known devices, ordered by serial.
    pub async fn devices(&self) -> Vec<DeviceStatus> {
        let mut devices: Vec<_> = self.devices.read().await.values().cloned().collect();
        devices.sort_by(|a, b| a.serial.cmp(&b.serial));
        devices
    }

    pub async fn device(&self, serial: &str) -> Option<DeviceStatus> {
        self.devices.read().await.get(serial).cloned()
    }
}

/// Serves one request/reply exchange.
pub async fn serve_connection(mut stream: TcpStream, state: MonitorState) -> NetResult<()> {
    let message: ServerMessage = read_frame(&mut stream).await?;
    let reply = state.handle(message).await;
    write_frame(&mut stream, &reply).await
}

/// Accepts device connections until the listener fails.
pub async fn serve_devices(listener: TcpListener, state: MonitorState) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, state).await {
                warn!("Exchange with {} failed: {}", peer, e);
            }
        });
    }
}

async fn list_handler(State(state): State<MonitorState>) -> Json<Vec<DeviceStatus>> {
    Json(state.devices().await)
}

async fn device_handler(
    State(state): State<MonitorState>,
    Path(serial): Path<String>,
) -> Result<Json<DeviceStatus>, StatusCode> {
    state.device(&serial).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Build the HTTP status API router over the given device table.
pub fn build_router(state: MonitorState) -> Router {
    Router::new()
        .route("/api/v1/devices", get(list_handler))
        .route("/api/v1/devices/{serial}", get(device_handler))
        .with_state(state)
}
