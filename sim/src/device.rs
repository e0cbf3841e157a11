//! Simulated board.
//!
//! [`SimDevice`] implements every port for the supervisor. Scenario events
//! are released by elapsed time: an event scheduled for tick `n` becomes
//! visible on the first poll at least `n` loop periods after start.

use crate::scenario::{BoardConfig, ScenarioAction, ScenarioEvent};
use intercom_core::ports::{
    Alarm, AudioPath, DialStatus, EventSource, Hardware, Peripherals, Signaling, StatusDisplay,
    Telemetry,
};
use intercom_net::{Addressing, NetworkConfig};
use intercom_types::{CallerId, ConnectionId, IncomingCall, UserInput};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

struct SimState {
    board: BoardConfig,
    started: Instant,
    period: Duration,
    timeline: VecDeque<ScenarioEvent>,
    incoming: VecDeque<IncomingCall>,
    inputs: VecDeque<UserInput>,
    emergency: bool,
    next_connection: u32,
    /// Connection the last scripted remote hang-up applies to.
    current: Option<ConnectionId>,
    dialing: Option<(ConnectionId, u64)>,
    remote_ended: HashSet<ConnectionId>,
    display: Vec<String>,
}

impl SimState {
    fn tick(&self) -> u64 {
        let elapsed = self.started.elapsed().as_millis();
        let period = self.period.as_millis().max(1);
        u64::try_from(elapsed / period).unwrap_or(u64::MAX)
    }

    /// Releases every scripted event that is due.
    fn pump(&mut self) {
        let now = self.tick();
        while self.timeline.front().is_some_and(|e| e.at <= now) {
            let Some(event) = self.timeline.pop_front() else {
                break;
            };
            self.apply(event);
        }
    }

    fn apply(&mut self, event: ScenarioEvent) {
        debug!("Scenario t{}: {:?}", event.at, event.action);
        match event.action {
            ScenarioAction::Incoming { caller } => match CallerId::new(caller.as_str()) {
                Ok(caller) => {
                    let connection = self.allocate();
                    self.current = Some(connection);
                    self.incoming.push_back(IncomingCall::new(caller, connection));
                }
                Err(e) => warn!("Skipping call from {:?}: {}", caller, e),
            },
            ScenarioAction::Input { input } => match input.parse::<UserInput>() {
                Ok(input) => self.inputs.push_back(input),
                Err(e) => warn!("Skipping input {:?}: {}", input, e),
            },
            ScenarioAction::RemoteHangup => match self.current {
                Some(connection) => {
                    self.remote_ended.insert(connection);
                }
                None => warn!("Remote hang-up with no call"),
            },
            ScenarioAction::Emergency => self.emergency = true,
            ScenarioAction::Sensors {
                battery,
                memory,
                temperature,
            } => {
                if let Some(battery) = battery {
                    self.board.battery = battery;
                }
                if let Some(memory) = memory {
                    self.board.memory = memory;
                }
                if let Some(temperature) = temperature {
                    self.board.temperature = temperature;
                }
            }
        }
    }

    fn allocate(&mut self) -> ConnectionId {
        self.next_connection += 1;
        ConnectionId::new(self.next_connection)
    }
}

/// Shared handle to the simulated board. Single-threaded.
#[derive(Clone)]
pub struct SimDevice {
    state: Rc<RefCell<SimState>>,
}

impl SimDevice {
    pub fn new(board: BoardConfig, events: Vec<ScenarioEvent>, period: Duration) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                board,
                started: Instant::now(),
                period,
                timeline: events.into(),
                incoming: VecDeque::new(),
                inputs: VecDeque::new(),
                emergency: false,
                next_connection: 0,
                current: None,
                dialing: None,
                remote_ended: HashSet::new(),
                display: Vec::new(),
            })),
        }
    }

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

    /// Everything shown on the display so far.
    pub fn display_log(&self) -> Vec<String> {
        self.state.borrow().display.clone()
    }

    /// Scripted events not yet released.
    pub fn pending_events(&self) -> usize {
        self.state.borrow().timeline.len()
    }
}

impl StatusDisplay for SimDevice {
    fn show(&mut self, message: &str) {
        info!("[display] {}", message);
        self.state.borrow_mut().display.push(message.to_string());
    }
}

impl Hardware for SimDevice {
    fn initialize(&mut self) -> bool {
        self.state.borrow().board.hardware_ok
    }

    fn signal_boot_failure(&mut self) {
        warn!("[board] boot failure pattern");
    }

    fn request_dhcp(&mut self) -> Option<Addressing> {
        self.state.borrow().board.dhcp.then(|| Addressing {
            ip: Ipv4Addr::new(192, 168, 1, 57),
            subnet: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            dns: Ipv4Addr::new(192, 168, 1, 1),
        })
    }

    fn apply_network_config(&mut self, config: &NetworkConfig) -> bool {
        info!("[board] interface up at {}", config.addressing().ip);
        true
    }

    fn test_connectivity(&mut self) -> bool {
        self.state.borrow().board.connectivity
    }

    fn test_audio(&mut self) -> bool {
        self.state.borrow().board.audio
    }
}

impl EventSource for SimDevice {
    fn poll_incoming_call(&mut self) -> Option<IncomingCall> {
        let mut state = self.state.borrow_mut();
        state.pump();
        state.incoming.pop_front()
    }

    fn poll_user_input(&mut self) -> Option<UserInput> {
        let mut state = self.state.borrow_mut();
        state.pump();
        state.inputs.pop_front()
    }

    fn poll_emergency_condition(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.pump();
        std::mem::take(&mut state.emergency)
    }
}

impl AudioPath for SimDevice {
    fn establish(&mut self, connection: ConnectionId) -> bool {
        let mut state = self.state.borrow_mut();
        if state.board.audio {
            info!("[audio] bound to {}", connection);
            state.current = Some(connection);
        }
        state.board.audio
    }

    fn teardown(&mut self, connection: ConnectionId) {
        info!("[audio] released {}", connection);
    }

    fn set_volume(&mut self, level: u8) {
        info!("[audio] volume {}", level);
    }
}

impl Signaling for SimDevice {
    fn start_ringing(&mut self, caller: &CallerId) {
        info!("[ring] {}", caller);
    }

    fn stop_ringing(&mut self) {
        debug!("[ring] off");
    }

    fn dial(&mut self, number: &CallerId) -> Option<ConnectionId> {
        let mut state = self.state.borrow_mut();
        let connection = state.allocate();
        let now = state.tick();
        info!("[line] dialing {} on {}", number, connection);
        state.current = Some(connection);
        state.dialing = Some((connection, now));
        Some(connection)
    }

    fn dial_status(&mut self, connection: ConnectionId) -> DialStatus {
        let mut state = self.state.borrow_mut();
        state.pump();
        let now = state.tick();
        let board = &state.board;
        match state.dialing {
            Some((dialed, _)) if dialed == connection && board.far_end_busy => DialStatus::Failed,
            Some((dialed, at)) if dialed == connection => {
                if now >= at + board.far_end_answers_after {
                    DialStatus::Connected
                } else {
                    DialStatus::Pending
                }
            }
            _ => DialStatus::Failed,
        }
    }

    fn release(&mut self, connection: ConnectionId) {
        let mut state = self.state.borrow_mut();
        info!("[line] released {}", connection);
        if state.dialing.is_some_and(|(c, _)| c == connection) {
            state.dialing = None;
        }
        if state.current == Some(connection) {
            state.current = None;
        }
    }

    fn remote_ended(&mut self, connection: ConnectionId) -> bool {
        let mut state = self.state.borrow_mut();
        state.pump();
        state.remote_ended.contains(&connection)
    }
}

impl Alarm for SimDevice {
    fn activate(&mut self) {
        warn!("[alarm] ON");
    }

    fn deactivate(&mut self) {
        info!("[alarm] off");
    }
}

impl Telemetry for SimDevice {
    fn battery_level(&self) -> u8 {
        self.state.borrow().board.battery
    }

    fn signal_strength(&self) -> i16 {
        self.state.borrow().board.signal
    }

    fn memory_usage(&self) -> u8 {
        self.state.borrow().board.memory
    }

    fn temperature(&self) -> f32 {
        self.state.borrow().board.temperature
    }
}
