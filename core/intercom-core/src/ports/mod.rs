//! Collaborator ports.
//!
//! The core never touches hardware directly. Everything it needs from the
//! board (buttons, ring tone, audio path, sensors, display) goes through the
//! traits below. All calls are synchronous and must return promptly; the only
//! awaited I/O in the core is network traffic, which is time-bounded.

pub mod mock;

use intercom_net::{Addressing, NetworkConfig};
use intercom_types::{CallerId, ConnectionId, IncomingCall, UserInput};

/// Front-panel display. Fire-and-forget.
pub trait StatusDisplay {
    fn show(&mut self, message: &str);
}

/// Board bring-up and self-tests.
pub trait Hardware {
    /// Brings up the board. `false` is fatal.
    fn initialize(&mut self) -> bool;

    /// Drives the distinct boot-failure indication (LED pattern, tone).
    fn signal_boot_failure(&mut self);

    /// Requests a DHCP lease. `None` when no server answered.
    fn request_dhcp(&mut self) -> Option<Addressing>;

    /// Applies addressing to the network interface.
    fn apply_network_config(&mut self, config: &NetworkConfig) -> bool;

    /// Checks that the gateway is reachable.
    fn test_connectivity(&mut self) -> bool;

    /// Loopback test of the audio subsystem.
    fn test_audio(&mut self) -> bool;
}

/// Non-blocking event sources, each polled once per tick.
pub trait EventSource {
    fn poll_incoming_call(&mut self) -> Option<IncomingCall>;
    fn poll_user_input(&mut self) -> Option<UserInput>;
    /// Autonomous emergency condition (e.g. a door-forced or fall sensor).
    fn poll_emergency_condition(&mut self) -> bool;
}

/// Microphone/speaker path bound to a call's connection.
pub trait AudioPath {
    /// Binds mic and speaker to the connection.
    fn establish(&mut self, connection: ConnectionId) -> bool;
    /// Unbinds the audio path.
    fn teardown(&mut self, connection: ConnectionId);
    /// Sets speaker volume, `0..=10`.
    fn set_volume(&mut self, level: u8);
}

/// Progress of an outbound call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialStatus {
    /// Still ringing at the far end.
    Pending,
    /// The far end picked up.
    Connected,
    /// Busy, unreachable, or refused.
    Failed,
}

/// Call signaling: ring indication and call setup/teardown.
pub trait Signaling {
    fn start_ringing(&mut self, caller: &CallerId);
    fn stop_ringing(&mut self);
    /// Starts an outbound call. `None` when the line refused immediately.
    fn dial(&mut self, number: &CallerId) -> Option<ConnectionId>;
    fn dial_status(&mut self, connection: ConnectionId) -> DialStatus;
    /// Releases the connection (hang up, decline, or cancel).
    fn release(&mut self, connection: ConnectionId);
    /// Whether the remote side has hung up.
    fn remote_ended(&mut self, connection: ConnectionId) -> bool;
}

/// Audible/visual emergency alarm.
pub trait Alarm {
    fn activate(&mut self);
    fn deactivate(&mut self);
}

/// Health sensors. Pure reads.
pub trait Telemetry {
    /// Battery charge, percent.
    fn battery_level(&self) -> u8;
    /// Signal strength, dBm.
    fn signal_strength(&self) -> i16;
    /// Memory in use, percent.
    fn memory_usage(&self) -> u8;
    /// Board temperature, °C.
    fn temperature(&self) -> f32;
}

/// The full set of collaborators owned by the supervisor.
pub struct Peripherals {
    pub display: Box<dyn StatusDisplay>,
    pub hardware: Box<dyn Hardware>,
    pub events: Box<dyn EventSource>,
    pub audio: Box<dyn AudioPath>,
    pub signaling: Box<dyn Signaling>,
    pub alarm: Box<dyn Alarm>,
    pub telemetry: Box<dyn Telemetry>,
}
