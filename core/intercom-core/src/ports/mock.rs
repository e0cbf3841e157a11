//! An in-memory device for testing.
//!
//! [`MockDevice`] implements every port over one shared state, so a test can
//! hand clones to the supervisor and still inspect and script the device.

use super::*;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Scripted behavior and recorded side effects.
#[derive(Debug)]
pub struct MockDeviceState {
    // Hardware
    pub hardware_ok: bool,
    pub dhcp_lease: Option<Addressing>,
    pub network_apply_ok: bool,
    pub connectivity_ok: bool,
    pub audio_test_ok: bool,
    pub boot_failure_signaled: bool,
    pub applied_configs: Vec<NetworkConfig>,

    // Event sources
    pub incoming: VecDeque<IncomingCall>,
    pub inputs: VecDeque<UserInput>,
    /// Consumed by the next poll.
    pub emergency_condition: bool,

    // Audio
    pub audio_ok: bool,
    pub established: Vec<ConnectionId>,
    pub torn_down: Vec<ConnectionId>,
    pub volume: Option<u8>,

    // Signaling
    pub ringing: bool,
    pub ring_starts: u32,
    pub dial_ok: bool,
    pub dial_status: DialStatus,
    pub next_connection: u32,
    pub dialed: Vec<CallerId>,
    pub released: Vec<ConnectionId>,
    pub remote_ended: HashSet<ConnectionId>,

    // Alarm
    pub alarm_active: bool,
    pub alarm_activations: u32,

    // Display
    pub messages: Vec<String>,

    // Telemetry
    pub battery: u8,
    pub signal: i16,
    pub memory: u8,
    pub temperature: f32,
}

impl Default for MockDeviceState {
    fn default() -> Self {
        Self {
            hardware_ok: true,
            dhcp_lease: None,
            network_apply_ok: true,
            connectivity_ok: true,
            audio_test_ok: true,
            boot_failure_signaled: false,
            applied_configs: Vec::new(),
            incoming: VecDeque::new(),
            inputs: VecDeque::new(),
            emergency_condition: false,
            audio_ok: true,
            established: Vec::new(),
            torn_down: Vec::new(),
            volume: None,
            ringing: false,
            ring_starts: 0,
            dial_ok: true,
            dial_status: DialStatus::Connected,
            next_connection: 100,
            dialed: Vec::new(),
            released: Vec::new(),
            remote_ended: HashSet::new(),
            alarm_active: false,
            alarm_activations: 0,
            messages: Vec::new(),
            battery: 95,
            signal: -60,
            memory: 40,
            temperature: 35.0,
        }
    }
}

/// Shared handle to a mock device.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with the device state locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut MockDeviceState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Boxes clones of this device as a full peripheral set.
    pub fn peripherals(&self) -> Peripherals {
        Peripherals {
            display: Box::new(self.clone()),
            hardware: Box::new(self.clone()),
            events: Box::new(self.clone()),
            audio: Box::new(self.clone()),
            signaling: Box::new(self.clone()),
            alarm: Box::new(self.clone()),
            telemetry: Box::new(self.clone()),
        }
    }

    pub fn push_incoming(&self, call: IncomingCall) {
        self.with(|s| s.incoming.push_back(call));
    }

    pub fn push_input(&self, input: UserInput) {
        self.with(|s| s.inputs.push_back(input));
    }

    /// Marks the remote side of `connection` as hung up.
    pub fn end_remote(&self, connection: ConnectionId) {
        self.with(|s| {
            s.remote_ended.insert(connection);
        });
    }

    pub fn messages(&self) -> Vec<String> {
        self.with(|s| s.messages.clone())
    }
}

impl StatusDisplay for MockDevice {
    fn show(&mut self, message: &str) {
        self.with(|s| s.messages.push(message.to_string()));
    }
}

impl Hardware for MockDevice {
    fn initialize(&mut self) -> bool {
        self.with(|s| s.hardware_ok)
    }

    fn signal_boot_failure(&mut self) {
        self.with(|s| s.boot_failure_signaled = true);
    }

    fn request_dhcp(&mut self) -> Option<Addressing> {
        self.with(|s| s.dhcp_lease)
    }

    fn apply_network_config(&mut self, config: &NetworkConfig) -> bool {
        self.with(|s| {
            s.applied_configs.push(config.clone());
            s.network_apply_ok
        })
    }

    fn test_connectivity(&mut self) -> bool {
        self.with(|s| s.connectivity_ok)
    }

    fn test_audio(&mut self) -> bool {
        self.with(|s| s.audio_test_ok)
    }
}

impl EventSource for MockDevice {
    fn poll_incoming_call(&mut self) -> Option<IncomingCall> {
        self.with(|s| s.incoming.pop_front())
    }

    fn poll_user_input(&mut self) -> Option<UserInput> {
        self.with(|s| s.inputs.pop_front())
    }

    fn poll_emergency_condition(&mut self) -> bool {
        self.with(|s| std::mem::take(&mut s.emergency_condition))
    }
}

impl AudioPath for MockDevice {
    fn establish(&mut self, connection: ConnectionId) -> bool {
        self.with(|s| {
            if s.audio_ok {
                s.established.push(connection);
            }
            s.audio_ok
        })
    }

    fn teardown(&mut self, connection: ConnectionId) {
        self.with(|s| s.torn_down.push(connection));
    }

    fn set_volume(&mut self, level: u8) {
        self.with(|s| s.volume = Some(level));
    }
}

impl Signaling for MockDevice {
    fn start_ringing(&mut self, _caller: &CallerId) {
        self.with(|s| {
            s.ringing = true;
            s.ring_starts += 1;
        });
    }

    fn stop_ringing(&mut self) {
        self.with(|s| s.ringing = false);
    }

    fn dial(&mut self, number: &CallerId) -> Option<ConnectionId> {
        self.with(|s| {
            s.dialed.push(number.clone());
            if !s.dial_ok {
                return None;
            }
            s.next_connection += 1;
            Some(ConnectionId::new(s.next_connection))
        })
    }

    fn dial_status(&mut self, _connection: ConnectionId) -> DialStatus {
        self.with(|s| s.dial_status)
    }

    fn release(&mut self, connection: ConnectionId) {
        self.with(|s| s.released.push(connection));
    }

    fn remote_ended(&mut self, connection: ConnectionId) -> bool {
        self.with(|s| s.remote_ended.contains(&connection))
    }
}

impl Alarm for MockDevice {
    fn activate(&mut self) {
        self.with(|s| {
            s.alarm_active = true;
            s.alarm_activations += 1;
        });
    }

    fn deactivate(&mut self) {
        self.with(|s| s.alarm_active = false);
    }
}

impl Telemetry for MockDevice {
    fn battery_level(&self) -> u8 {
        self.with(|s| s.battery)
    }

    fn signal_strength(&self) -> i16 {
        self.with(|s| s.signal)
    }

    fn memory_usage(&self) -> u8 {
        self.with(|s| s.memory)
    }

    fn temperature(&self) -> f32 {
        self.with(|s| s.temperature)
    }
}
