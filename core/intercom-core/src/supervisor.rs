//! The supervisor loop.
//!
//! One [`Supervisor::step`] is one tick. Within a tick the order is fixed:
//!
//! 1. poll for an incoming call
//! 2. poll for user input and dispatch it (an emergency button runs the
//!    emergency to completion right here)
//! 3. advance call timers: answer timeout, dial progress, remote hang-up
//! 4. advance the clock and run any heartbeat/diagnostics that came due
//! 5. poll the autonomous emergency condition
//!
//! [`Supervisor::run`] and [`Supervisor::run_for`] sleep one loop period
//! between steps. The supervisor holds boxed, non-`Send` collaborators, so
//! it must be driven from a current-thread runtime.

use crate::boot::{BootWarning, SystemStatus};
use crate::call::{CallConfig, CallEvent, CallStateMachine, Termination};
use crate::clock::TickClock;
use crate::context::{AudioSettings, DialBuffer, SupervisorContext};
use crate::diagnostics::{self, DiagnosticsConfig};
use crate::emergency::{EmergencyArbitrator, EmergencyConfig, EmergencyOutcome, EmergencyPorts};
use crate::error::CallError;
use crate::ports::Peripherals;
use crate::scheduler::{ScheduleConfig, Scheduler};
use intercom_net::{ClientConfig, EndpointClient, NetworkConfig, RegistrationState};
use intercom_types::{
    CallType, CallerId, ConfigEntry, DeviceIdentity, DiagnosticsReport, FunctionKey, UserInput,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything needed to bring up a supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub identity: DeviceIdentity,
    /// Static defaults and server pair. DHCP is applied on top at boot.
    pub network: NetworkConfig,
    pub client: ClientConfig,
    pub calls: CallConfig,
    pub emergency: EmergencyConfig,
    pub schedule: ScheduleConfig,
    pub diagnostics: DiagnosticsConfig,
    /// Wall time of one tick.
    pub loop_period: Duration,
    /// Speed-dial numbers; `SpeedDial(1)` is the first.
    pub landlines: Vec<CallerId>,
    /// Speaker volume applied at boot.
    pub volume: u8,
}

impl SupervisorConfig {
    /// A configuration with default timings.
    pub fn new(identity: DeviceIdentity, network: NetworkConfig, emergency_number: CallerId) -> Self {
        Self {
            identity,
            network,
            client: ClientConfig::default(),
            calls: CallConfig::default(),
            emergency: EmergencyConfig::new(emergency_number),
            schedule: ScheduleConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            loop_period: Duration::from_millis(100),
            landlines: Vec::new(),
            volume: AudioSettings::default().volume(),
        }
    }
}

pub struct Supervisor {
    ctx: SupervisorContext,
    peripherals: Peripherals,
    client: EndpointClient,
    scheduler: Scheduler,
    arbitrator: EmergencyArbitrator,
    diagnostics: DiagnosticsConfig,
    landlines: Vec<CallerId>,
    status: SystemStatus,
    warnings: Vec<BootWarning>,
    last_report: Option<DiagnosticsReport>,
    last_emergency: Option<EmergencyOutcome>,
}

impl Supervisor {
    /// Assembles a booted supervisor. `network` is the configuration boot
    /// actually applied.
    pub(crate) fn assemble(
        config: SupervisorConfig,
        network: NetworkConfig,
        peripherals: Peripherals,
        client: EndpointClient,
        warnings: Vec<BootWarning>,
    ) -> Self {
        let status = if warnings.is_empty() {
            SystemStatus::Ready
        } else {
            SystemStatus::Degraded
        };
        let clock = TickClock::new(config.loop_period);
        Self {
            ctx: SupervisorContext {
                identity: config.identity,
                network,
                calls: CallStateMachine::new(&config.calls, config.loop_period),
                emergency: Default::default(),
                audio: AudioSettings::new(config.volume),
                dial_buffer: DialBuffer::default(),
                clock,
            },
            peripherals,
            client,
            scheduler: Scheduler::new(config.schedule),
            arbitrator: EmergencyArbitrator::new(config.emergency),
            diagnostics: config.diagnostics,
            landlines: config.landlines,
            status,
            warnings,
            last_report: None,
            last_emergency: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn context(&self) -> &SupervisorContext {
        &self.ctx
    }

    pub fn status(&self) -> SystemStatus {
        self.status
    }

    /// Problems found at boot. Empty when the status is `Ready`.
    pub fn warnings(&self) -> &[BootWarning] {
        &self.warnings
    }

    pub fn registration(&self) -> RegistrationState {
        self.client.state()
    }

    /// The most recent self-test, if one has run.
    pub fn last_report(&self) -> Option<&DiagnosticsReport> {
        self.last_report.as_ref()
    }

    pub fn last_emergency(&self) -> Option<EmergencyOutcome> {
        self.last_emergency
    }

    // ── Loop ─────────────────────────────────────────────────────

    /// Runs one tick without sleeping.
    pub async fn step(&mut self) {
        let now = self.ctx.clock.now();
        if let Some(call) = self.peripherals.events.poll_incoming_call() {
            match self
                .ctx
                .calls
                .incoming(call, now, self.peripherals.signaling.as_mut())
            {
                Ok(event) => self.surface(&event),
                Err(e) => debug!("Incoming call turned away: {}", e),
            }
        }

        if let Some(input) = self.peripherals.events.poll_user_input() {
            self.dispatch(input).await;
        }

        // An emergency above may have moved the clock.
        let now = self.ctx.clock.now();
        if let Some(event) = self.ctx.calls.advance(
            now,
            self.peripherals.signaling.as_mut(),
            self.peripherals.audio.as_mut(),
        ) {
            self.surface(&event);
        }

        let now = self.ctx.clock.tick();
        let due = self.scheduler.poll(now, self.ctx.calls.is_busy());
        if due.heartbeat {
            self.heartbeat().await;
        }
        if due.diagnostics {
            self.run_diagnostics().await;
        }

        if self.peripherals.events.poll_emergency_condition() {
            info!("Emergency condition detected");
            self.enter_emergency().await;
        }
    }

    /// Runs forever.
    pub async fn run(&mut self) {
        info!("Supervisor running ({:?} per tick)", self.ctx.clock.period());
        loop {
            self.step().await;
            self.ctx.clock.sleep().await;
        }
    }

    /// Runs `ticks` iterations.
    pub async fn run_for(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step().await;
            self.ctx.clock.sleep().await;
        }
    }

    // ── Emergency ────────────────────────────────────────────────

    /// Handles an emergency to completion. A no-op while one is running.
    pub async fn enter_emergency(&mut self) -> EmergencyOutcome {
        if !self.ctx.emergency.is_raised() {
            self.peripherals.display.show("EMERGENCY CALL");
        }
        let outcome = self
            .arbitrator
            .enter(
                &mut self.ctx.emergency,
                &mut self.ctx.calls,
                &mut self.ctx.clock,
                EmergencyPorts {
                    alarm: self.peripherals.alarm.as_mut(),
                    signaling: self.peripherals.signaling.as_mut(),
                    audio: self.peripherals.audio.as_mut(),
                },
            )
            .await;
        self.peripherals.display.show(&outcome.display_text());
        self.last_emergency = Some(outcome);
        outcome
    }

    // ── Input ────────────────────────────────────────────────────

    async fn dispatch(&mut self, input: UserInput) {
        debug!("Input: {}", input);
        match input {
            UserInput::Key(key) => {
                if self.ctx.calls.is_busy() {
                    debug!("Ignoring key {} during a call", key.as_char());
                } else if !self.ctx.dial_buffer.push(key) {
                    self.peripherals.display.show("Number too long");
                } else {
                    let digits = self.ctx.dial_buffer.as_str().to_string();
                    self.peripherals.display.show(&digits);
                }
            }
            UserInput::Function(key) => self.function(key),
            UserInput::Volume(step) => {
                let level = self.ctx.audio.step(step);
                self.peripherals.audio.set_volume(level);
                self.peripherals.display.show(&format!("Volume {level}"));
            }
            UserInput::Emergency => {
                self.enter_emergency().await;
            }
            UserInput::Configure(entry) => self.configure(entry).await,
        }
    }

    fn function(&mut self, key: FunctionKey) {
        let now = self.ctx.clock.now();
        let signaling = self.peripherals.signaling.as_mut();
        let audio = self.peripherals.audio.as_mut();
        let result = match key {
            FunctionKey::Answer => self.ctx.calls.answer(now, signaling, audio),
            FunctionKey::HangUp => self.ctx.calls.hang_up(now, Termination::Local, signaling, audio),
            FunctionKey::Clear => {
                self.ctx.dial_buffer.clear();
                self.peripherals.display.show("");
                return;
            }
            FunctionKey::Call => match self.ctx.dial_buffer.take() {
                Some(number) => self.ctx.calls.dial(number, CallType::Outgoing, now, signaling),
                None => {
                    self.peripherals.display.show("Enter a number");
                    return;
                }
            },
            FunctionKey::SpeedDial(slot) => {
                let number = usize::from(slot)
                    .checked_sub(1)
                    .and_then(|i| self.landlines.get(i))
                    .cloned();
                match number {
                    Some(number) => self.ctx.calls.dial(number, CallType::Outgoing, now, signaling),
                    None => {
                        self.peripherals
                            .display
                            .show(&format!("No number for speed dial {slot}"));
                        return;
                    }
                }
            }
        };

        match result {
            Ok(event) => self.surface(&event),
            Err(CallError::Busy(_)) => self.peripherals.display.show("Line busy"),
            Err(e) => debug!("{:?} ignored: {}", key, e),
        }
    }

    async fn configure(&mut self, entry: ConfigEntry) {
        if self.ctx.calls.is_busy() {
            warn!("Configuration refused during a call");
            self.peripherals.display.show("Finish the call first");
            return;
        }

        match entry {
            ConfigEntry::UseDhcp => match self.peripherals.hardware.request_dhcp() {
                Some(lease) => {
                    self.ctx.network.apply_dhcp_lease(lease);
                    self.apply_network();
                    self.register().await;
                }
                None => {
                    warn!("DHCP request failed, keeping current addressing");
                    self.peripherals.display.show("DHCP unavailable");
                }
            },
            ConfigEntry::UseStaticDefaults => {
                self.ctx.network.revert_to_static();
                self.apply_network();
                self.register().await;
            }
            ConfigEntry::Reregister => {
                self.register().await;
            }
        }
    }

    fn apply_network(&mut self) {
        let network = &self.ctx.network;
        if self.peripherals.hardware.apply_network_config(network) {
            info!(
                "Network now {} ({:?})",
                network.addressing().ip,
                network.source()
            );
        } else {
            warn!("Failed to apply network configuration");
            self.peripherals.display.show("Network config failed");
        }
    }

    // ── Scheduled work ───────────────────────────────────────────

    async fn register(&mut self) -> RegistrationState {
        let state = self
            .client
            .register(&self.ctx.identity, &self.ctx.network)
            .await;
        if state.is_registered() {
            self.peripherals.display.show("Registered");
        } else {
            self.peripherals.display.show("Server unreachable");
        }
        state
    }

    async fn heartbeat(&mut self) {
        if !self.client.state().is_registered() {
            debug!("Not registered, registering before heartbeat");
            if !self.register().await.is_registered() {
                warn!("Heartbeat skipped: registration failed");
                return;
            }
        }

        let sample = diagnostics::sample(self.peripherals.telemetry.as_ref(), &self.ctx.clock);
        if let Err(e) = self
            .client
            .send_heartbeat(&self.ctx.identity, &self.ctx.network, sample)
            .await
        {
            warn!("Heartbeat dropped: {}", e);
        }
    }

    async fn run_diagnostics(&mut self) {
        let report = diagnostics::self_test(
            &self.diagnostics,
            self.peripherals.telemetry.as_ref(),
            self.peripherals.hardware.as_mut(),
            self.ctx.clock.now(),
        );

        if report.has_critical() {
            let count = report.critical().count();
            for issue in report.critical() {
                warn!("Self-test: {} {}", issue.component, issue.detail);
            }
            self.peripherals
                .display
                .show(&format!("Service needed: {count} critical issue(s)"));
            if let Err(e) = self
                .client
                .report_diagnostics(&self.ctx.identity, &self.ctx.network, report.clone())
                .await
            {
                warn!("Diagnostics report dropped: {}", e);
            }
        } else {
            info!("Self-test passed ({} warning(s))", report.issues.len());
        }
        self.last_report = Some(report);
    }

    fn surface(&mut self, event: &CallEvent) {
        let text = match event {
            CallEvent::Ringing { caller } => format!("Incoming call: {caller}"),
            CallEvent::Dialing { .. } => "Calling...".to_string(),
            CallEvent::Connected { .. } => "Connected".to_string(),
            CallEvent::Missed { caller } => format!("Missed call: {caller}"),
            CallEvent::Ended { duration_ms } => format!("Call ended ({}s)", duration_ms / 1000),
            CallEvent::Declined => "Call declined".to_string(),
            CallEvent::Failed(reason) => format!("Call failed: {reason}"),
            CallEvent::Preempted => "Call dropped".to_string(),
        };
        self.peripherals.display.show(&text);
    }
}
