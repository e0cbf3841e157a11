//! The call state machine.
//!
//! Owns the single call slot. Every operation takes the current tick and the
//! collaborators it may touch; nothing here blocks or sleeps. Deadlines are
//! ticks compared against `now`, so the supervisor drives timeouts simply by
//! calling [`CallStateMachine::advance`] once per tick.

use super::log::{CallLog, CallRecord, FailureReason};
use super::state::{CallState, Transition};
use crate::error::{CallError, CallResult};
use crate::ports::{AudioPath, DialStatus, Signaling};
use intercom_types::{CallInfo, CallType, CallerId, ConnectionId, IncomingCall, Tick, ticks_for};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

const JOURNAL_CAPACITY: usize = 32;

/// Configuration for the call state machine.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long an inbound call rings before it is recorded as missed.
    pub answer_timeout: Duration,
    /// How long an outbound call may stay unanswered at the far end.
    pub dial_timeout: Duration,
    /// Number of call log entries kept.
    pub log_capacity: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            answer_timeout: Duration::from_millis(30_000),
            dial_timeout: Duration::from_millis(60_000),
            log_capacity: 64,
        }
    }
}

/// Who ended the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Local,
    Remote,
}

/// What an operation did, for the supervisor to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// An inbound call started ringing.
    Ringing { caller: CallerId },
    /// An outbound call is being set up.
    Dialing { connection: ConnectionId },
    /// Audio is connected and the call is active.
    Connected { connection: ConnectionId },
    /// An inbound call went unanswered.
    Missed { caller: CallerId },
    /// An active call was hung up.
    Ended { duration_ms: u64 },
    /// A ringing call was declined locally.
    Declined,
    /// The call ended before it was connected.
    Failed(FailureReason),
    /// The call was dropped for an emergency call.
    Preempted,
}

/// Single-slot call state machine.
pub struct CallStateMachine {
    period: Duration,
    answer_ticks: u64,
    dial_ticks: u64,
    state: CallState,
    call: Option<CallInfo>,
    /// Answer deadline while ringing, dial deadline while dialing.
    deadline: Option<Tick>,
    connected_at: Option<Tick>,
    audio_bound: bool,
    log: CallLog,
    journal: VecDeque<Transition>,
}

impl CallStateMachine {
    /// Creates an idle machine. `period` is the supervisor loop period, used
    /// to turn timeouts into tick deadlines.
    pub fn new(config: &CallConfig, period: Duration) -> Self {
        Self {
            period,
            answer_ticks: ticks_for(config.answer_timeout, period),
            dial_ticks: ticks_for(config.dial_timeout, period),
            state: CallState::Idle,
            call: None,
            deadline: None,
            connected_at: None,
            audio_bound: false,
            log: CallLog::new(config.log_capacity),
            journal: VecDeque::with_capacity(JOURNAL_CAPACITY),
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// The call occupying the slot, if any.
    pub fn call(&self) -> Option<&CallInfo> {
        self.call.as_ref()
    }

    /// Pending answer or dial deadline.
    pub fn deadline(&self) -> Option<Tick> {
        self.deadline
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn answer_timeout_ticks(&self) -> u64 {
        self.answer_ticks
    }

    /// The most recent state changes, oldest first.
    pub fn recent_transitions(&self) -> impl Iterator<Item = &Transition> {
        self.journal.iter()
    }

    // ── Inbound ──────────────────────────────────────────────────

    /// Starts ringing for an inbound call. A call arriving while the slot is
    /// taken is released and logged as rejected.
    pub fn incoming(
        &mut self,
        call: IncomingCall,
        now: Tick,
        signaling: &mut dyn Signaling,
    ) -> CallResult<CallEvent> {
        if self.state != CallState::Idle {
            warn!("Rejecting call from {}: line busy ({})", call.caller, self.state);
            signaling.release(call.connection);
            self.log.push(CallRecord::Rejected {
                caller: call.caller,
                at: now,
            });
            return Err(CallError::Busy(self.state));
        }

        let info = CallInfo::incoming(call, now);
        let caller = info.caller.clone();
        info!("Incoming call from {} on {}", caller, info.connection);
        signaling.start_ringing(&caller);
        self.deadline = Some(now.after(self.answer_ticks));
        self.call = Some(info);
        self.set_state(CallState::Ringing, now);
        Ok(CallEvent::Ringing { caller })
    }

    /// Answers the ringing call and binds audio. An answer at or past the
    /// deadline is handled as the timeout.
    pub fn answer(
        &mut self,
        now: Tick,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> CallResult<CallEvent> {
        if self.state != CallState::Ringing {
            return Err(CallError::InvalidState {
                operation: "answer",
                state: self.state,
            });
        }
        if let Some(event) = self.check_timeout(now, signaling) {
            return Ok(event);
        }

        self.deadline = None;
        signaling.stop_ringing();
        self.set_state(CallState::Answered, now);
        Ok(self.connect(now, signaling, audio))
    }

    /// Expires the ringing call once its deadline has passed.
    pub fn check_timeout(&mut self, now: Tick, signaling: &mut dyn Signaling) -> Option<CallEvent> {
        let expired = self.state == CallState::Ringing && self.deadline.is_some_and(|d| now >= d);
        if expired { Some(self.miss(now, signaling)) } else { None }
    }

    // ── Outbound ─────────────────────────────────────────────────

    /// Starts an outbound call.
    pub fn dial(
        &mut self,
        number: CallerId,
        kind: CallType,
        now: Tick,
        signaling: &mut dyn Signaling,
    ) -> CallResult<CallEvent> {
        if !kind.is_outbound() {
            return Err(CallError::NotOutbound);
        }
        if self.state != CallState::Idle {
            return Err(CallError::Busy(self.state));
        }

        self.set_state(CallState::Dialing, now);
        match signaling.dial(&number) {
            Some(connection) => {
                info!("Dialing {} ({}) on {}", number, kind, connection);
                self.call = Some(CallInfo::new(number, kind, connection, now));
                self.deadline = Some(now.after(self.dial_ticks));
                Ok(CallEvent::Dialing { connection })
            }
            None => {
                warn!("Dial to {} refused", number);
                self.log.push(CallRecord::Failed {
                    kind,
                    number,
                    reason: FailureReason::DialRejected,
                    at: now,
                });
                self.set_state(CallState::Idle, now);
                Ok(CallEvent::Failed(FailureReason::DialRejected))
            }
        }
    }

    /// Advances a dialing call: connects when the far end picks up, fails on
    /// refusal or when the dial deadline passes.
    pub fn poll_dialing(
        &mut self,
        now: Tick,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> Option<CallEvent> {
        if self.state != CallState::Dialing {
            return None;
        }
        let connection = self.call.as_ref()?.connection;

        if self.deadline.is_some_and(|d| now >= d) {
            signaling.release(connection);
            return Some(self.fail(FailureReason::DialTimeout, now));
        }
        match signaling.dial_status(connection) {
            DialStatus::Pending => None,
            DialStatus::Failed => {
                signaling.release(connection);
                Some(self.fail(FailureReason::RemoteRejected, now))
            }
            DialStatus::Connected => Some(self.connect(now, signaling, audio)),
        }
    }

    // ── Teardown ─────────────────────────────────────────────────

    /// Detects the remote side hanging up.
    pub fn poll_remote(
        &mut self,
        now: Tick,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> Option<CallEvent> {
        let connection = self.call.as_ref()?.connection;
        match self.state {
            CallState::Ringing if signaling.remote_ended(connection) => {
                Some(self.miss(now, signaling))
            }
            CallState::Dialing if signaling.remote_ended(connection) => {
                signaling.release(connection);
                Some(self.fail(FailureReason::RemoteRejected, now))
            }
            CallState::Active if signaling.remote_ended(connection) => {
                Some(self.finish(now, Termination::Remote, signaling, audio))
            }
            _ => None,
        }
    }

    /// Ends the current call.
    pub fn hang_up(
        &mut self,
        now: Tick,
        termination: Termination,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> CallResult<CallEvent> {
        match (self.state, termination) {
            (CallState::Active, _) => Ok(self.finish(now, termination, signaling, audio)),
            (CallState::Ringing, Termination::Local) => Ok(self.decline(now, signaling)),
            (CallState::Ringing, Termination::Remote) => Ok(self.miss(now, signaling)),
            (CallState::Dialing, _) => {
                if let Some(call) = &self.call {
                    signaling.release(call.connection);
                }
                let reason = match termination {
                    Termination::Local => FailureReason::Cancelled,
                    Termination::Remote => FailureReason::RemoteRejected,
                };
                Ok(self.fail(reason, now))
            }
            (state, _) => Err(CallError::InvalidState {
                operation: "hang up",
                state,
            }),
        }
    }

    /// Drops whatever call is in progress to make room for an emergency
    /// call. Ringing and dialing calls are voided; active calls are cut.
    pub fn preempt(
        &mut self,
        now: Tick,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> Option<CallEvent> {
        if self.state == CallState::Idle {
            return None;
        }
        if self.state == CallState::Ringing {
            signaling.stop_ringing();
        }
        self.unbind_audio(audio);
        self.deadline = None;
        let call = self.call.take()?;
        signaling.release(call.connection);
        warn!("Preempting {} call with {} ({})", call.kind, call.caller, self.state);
        self.log.push(CallRecord::Preempted {
            kind: call.kind,
            number: call.caller,
            at: now,
        });
        self.set_state(CallState::Idle, now);
        self.connected_at = None;
        Some(CallEvent::Preempted)
    }

    /// Runs the per-tick checks for whatever state the slot is in.
    pub fn advance(
        &mut self,
        now: Tick,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> Option<CallEvent> {
        match self.state {
            CallState::Ringing => self
                .check_timeout(now, signaling)
                .or_else(|| self.poll_remote(now, signaling, audio)),
            CallState::Dialing => self
                .poll_remote(now, signaling, audio)
                .or_else(|| self.poll_dialing(now, signaling, audio)),
            CallState::Active => self.poll_remote(now, signaling, audio),
            CallState::Idle | CallState::Answered | CallState::Unanswered => None,
        }
    }

    // ── Internals ────────────────────────────────────────────────

    /// Binds audio for an answered or picked-up call.
    fn connect(
        &mut self,
        now: Tick,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> CallEvent {
        let Some(connection) = self.call.as_ref().map(|c| c.connection) else {
            self.set_state(CallState::Idle, now);
            return CallEvent::Failed(FailureReason::AudioPath);
        };
        self.deadline = None;
        if audio.establish(connection) {
            self.audio_bound = true;
            self.connected_at = Some(now);
            self.set_state(CallState::Active, now);
            CallEvent::Connected { connection }
        } else {
            signaling.release(connection);
            self.fail(FailureReason::AudioPath, now)
        }
    }

    fn miss(&mut self, now: Tick, signaling: &mut dyn Signaling) -> CallEvent {
        signaling.stop_ringing();
        self.deadline = None;
        self.set_state(CallState::Unanswered, now);
        let call = self.call.take();
        self.set_state(CallState::Idle, now);
        match call {
            Some(call) => {
                signaling.release(call.connection);
                info!("Missed call from {} at {}", call.caller, call.created_at);
                self.log.push(CallRecord::Missed {
                    caller: call.caller.clone(),
                    at: call.created_at,
                });
                CallEvent::Missed {
                    caller: call.caller,
                }
            }
            None => CallEvent::Failed(FailureReason::Cancelled),
        }
    }

    fn decline(&mut self, now: Tick, signaling: &mut dyn Signaling) -> CallEvent {
        signaling.stop_ringing();
        self.deadline = None;
        if let Some(call) = self.call.take() {
            signaling.release(call.connection);
            info!("Declined call from {}", call.caller);
            self.log.push(CallRecord::Rejected {
                caller: call.caller,
                at: now,
            });
        }
        self.set_state(CallState::Idle, now);
        CallEvent::Declined
    }

    fn finish(
        &mut self,
        now: Tick,
        termination: Termination,
        signaling: &mut dyn Signaling,
        audio: &mut dyn AudioPath,
    ) -> CallEvent {
        self.unbind_audio(audio);
        let connected_at = self.connected_at.take().unwrap_or(now);
        let duration_ms = Tick::new(now.since(connected_at)).as_duration(self.period).as_millis();
        let duration_ms = u64::try_from(duration_ms).unwrap_or(u64::MAX);
        if let Some(call) = self.call.take() {
            signaling.release(call.connection);
            info!(
                "Call completed: {} {} {} ms, ended {:?}",
                call.kind, call.caller, duration_ms, termination
            );
            self.log.push(CallRecord::Completed {
                kind: call.kind,
                number: call.caller,
                duration_ms,
                ended_at: now,
            });
        }
        self.set_state(CallState::Idle, now);
        CallEvent::Ended { duration_ms }
    }

    fn fail(&mut self, reason: FailureReason, now: Tick) -> CallEvent {
        self.deadline = None;
        if let Some(call) = self.call.take() {
            warn!("{} call to {} failed: {}", call.kind, call.caller, reason);
            self.log.push(CallRecord::Failed {
                kind: call.kind,
                number: call.caller,
                reason,
                at: now,
            });
        }
        self.set_state(CallState::Idle, now);
        CallEvent::Failed(reason)
    }

    /// Tears down audio if this call bound it. Runs at most once per call.
    fn unbind_audio(&mut self, audio: &mut dyn AudioPath) {
        if !self.audio_bound {
            return;
        }
        if let Some(call) = &self.call {
            audio.teardown(call.connection);
        }
        self.audio_bound = false;
    }

    fn set_state(&mut self, next: CallState, now: Tick) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal call transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Call {} -> {} at {}", self.state, next, now);
        if self.journal.len() == JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
        self.journal.push_back(Transition {
            from: self.state,
            to: next,
            at: now,
        });
        self.state = next;
    }
}
