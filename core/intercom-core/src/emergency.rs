//! Emergency call arbitration.
//!
//! An emergency (button press or an autonomous condition) takes the call
//! slot away from whatever normal call holds it and places a call to the
//! configured emergency destination. While the emergency call runs, the
//! arbitrator owns the loop: it advances the clock itself, one period at a
//! time, and only returns once the call is over.
//!
//! The [`EmergencyFlag`] guards against re-entry. It is raised on entry and
//! lowered by a drop guard, so every exit path (including a cancelled
//! future) also silences the alarm and hangs up.

use crate::call::{CallEvent, CallStateMachine, FailureReason, Termination};
use crate::clock::TickClock;
use crate::ports::{Alarm, AudioPath, Signaling};
use intercom_types::{CallType, CallerId, ticks_for};
use std::time::Duration;
use tracing::{error, info, warn};

/// Default cap on a single emergency call.
pub const DEFAULT_MAX_EMERGENCY_CALL: Duration = Duration::from_secs(10 * 60);

/// Set while an emergency is being handled.
#[derive(Debug, Default)]
pub struct EmergencyFlag {
    raised: bool,
}

impl EmergencyFlag {
    pub fn is_raised(&self) -> bool {
        self.raised
    }

    pub(crate) fn raise(&mut self) {
        self.raised = true;
    }

    pub(crate) fn lower(&mut self) {
        self.raised = false;
    }
}

#[derive(Debug, Clone)]
pub struct EmergencyConfig {
    /// Number dialed for every emergency.
    pub destination: CallerId,
    /// Longest an emergency call may run before it is hung up.
    pub max_call: Duration,
}

impl EmergencyConfig {
    pub fn new(destination: CallerId) -> Self {
        Self {
            destination,
            max_call: DEFAULT_MAX_EMERGENCY_CALL,
        }
    }
}

/// How an emergency ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyOutcome {
    /// Another emergency was already being handled; nothing was done.
    AlreadyActive,
    /// The emergency call connected and ended normally.
    Completed { duration_ms: u64 },
    /// The emergency call never connected.
    DialFailed(FailureReason),
    /// The far end answered but audio could not be bound.
    AudioFailed,
    /// The call hit the maximum emergency call duration.
    TimedOut,
}

impl EmergencyOutcome {
    /// Short text for the front-panel display.
    pub fn display_text(&self) -> String {
        match self {
            Self::AlreadyActive => "Emergency already in progress".to_string(),
            Self::Completed { duration_ms } => {
                format!("Emergency call ended ({}s)", duration_ms / 1000)
            }
            Self::DialFailed(reason) => format!("Emergency call failed: {reason}"),
            Self::AudioFailed => "Emergency call failed: no audio".to_string(),
            Self::TimedOut => "Emergency call time limit reached".to_string(),
        }
    }
}

/// Collaborators the arbitrator drives during an emergency.
pub struct EmergencyPorts<'a> {
    pub alarm: &'a mut dyn Alarm,
    pub signaling: &'a mut dyn Signaling,
    pub audio: &'a mut dyn AudioPath,
}

/// Everything an emergency borrows, released in one place on drop.
struct Session<'a> {
    flag: &'a mut EmergencyFlag,
    calls: &'a mut CallStateMachine,
    clock: &'a mut TickClock,
    ports: EmergencyPorts<'a>,
}

impl<'a> Session<'a> {
    fn open(
        flag: &'a mut EmergencyFlag,
        calls: &'a mut CallStateMachine,
        clock: &'a mut TickClock,
        ports: EmergencyPorts<'a>,
    ) -> Self {
        flag.raise();
        ports.alarm.activate();
        Self {
            flag,
            calls,
            clock,
            ports,
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.calls.is_busy() {
            let now = self.clock.now();
            if let Err(e) = self.calls.hang_up(
                now,
                Termination::Local,
                self.ports.signaling,
                self.ports.audio,
            ) {
                error!("Failed to tear down emergency call: {}", e);
            }
        }
        self.ports.alarm.deactivate();
        self.flag.lower();
    }
}

/// Runs emergency calls.
#[derive(Debug, Clone)]
pub struct EmergencyArbitrator {
    config: EmergencyConfig,
}

impl EmergencyArbitrator {
    pub fn new(config: EmergencyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmergencyConfig {
        &self.config
    }

    /// Handles one emergency from alarm to hang-up.
    ///
    /// Any normal call is dropped first. The flag is raised for the whole
    /// duration and is always lowered again before this returns.
    pub async fn enter<'a>(
        &self,
        flag: &'a mut EmergencyFlag,
        calls: &'a mut CallStateMachine,
        clock: &'a mut TickClock,
        ports: EmergencyPorts<'a>,
    ) -> EmergencyOutcome {
        if flag.is_raised() {
            warn!("Emergency requested while one is already active");
            return EmergencyOutcome::AlreadyActive;
        }

        let mut session = Session::open(flag, calls, clock, ports);
        let outcome = self.run(&mut session).await;
        match outcome {
            EmergencyOutcome::Completed { duration_ms } => {
                info!("Emergency call completed after {} ms", duration_ms)
            }
            other => error!("Emergency call did not complete: {:?}", other),
        }
        outcome
    }

    async fn run(&self, session: &mut Session<'_>) -> EmergencyOutcome {
        let started = session.clock.now();
        let signaling = &mut *session.ports.signaling;
        let audio = &mut *session.ports.audio;

        if session.calls.preempt(started, signaling, audio).is_some() {
            info!("Normal call dropped for emergency");
        }

        let destination = self.config.destination.clone();
        info!("Placing emergency call to {}", destination);
        match session
            .calls
            .dial(destination, CallType::Emergency, started, signaling)
        {
            Ok(CallEvent::Dialing { .. }) => {}
            Ok(CallEvent::Failed(reason)) => return EmergencyOutcome::DialFailed(reason),
            Ok(other) => {
                warn!("Unexpected dial result {:?}", other);
                return EmergencyOutcome::DialFailed(FailureReason::DialRejected);
            }
            Err(e) => {
                error!("Emergency dial refused by call machine: {}", e);
                return EmergencyOutcome::DialFailed(FailureReason::DialRejected);
            }
        }

        let limit = ticks_for(self.config.max_call, session.clock.period());
        loop {
            let now = session.clock.advance().await;
            if now.since(started) >= limit {
                warn!("Emergency call reached its {:?} limit", self.config.max_call);
                if let Err(e) = session
                    .calls
                    .hang_up(now, Termination::Local, signaling, audio)
                {
                    error!("Failed to end emergency call: {}", e);
                }
                return EmergencyOutcome::TimedOut;
            }

            match session.calls.advance(now, signaling, audio) {
                None => {}
                Some(CallEvent::Connected { connection }) => {
                    info!("Emergency call connected on {}", connection)
                }
                Some(CallEvent::Ended { duration_ms }) => {
                    return EmergencyOutcome::Completed { duration_ms };
                }
                Some(CallEvent::Failed(FailureReason::AudioPath)) => {
                    return EmergencyOutcome::AudioFailed;
                }
                Some(CallEvent::Failed(reason)) => return EmergencyOutcome::DialFailed(reason),
                Some(other) => {
                    warn!("Unexpected event during emergency: {:?}", other);
                    return EmergencyOutcome::DialFailed(FailureReason::Cancelled);
                }
            }
        }
    }
}
