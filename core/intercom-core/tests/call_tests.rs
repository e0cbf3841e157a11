use intercom_core::call::{
    CallConfig, CallEvent, CallRecord, CallState, CallStateMachine, FailureReason, Termination,
};
use intercom_core::CallError;
use intercom_core::ports::DialStatus;
use intercom_core::ports::mock::MockDevice;
use intercom_types::{CallType, CallerId, ConnectionId, IncomingCall, Tick};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(100);

fn machine() -> CallStateMachine {
    CallStateMachine::new(&CallConfig::default(), PERIOD)
}

fn number(s: &str) -> CallerId {
    CallerId::new(s).unwrap()
}

fn call(caller: &str, conn: u32) -> IncomingCall {
    IncomingCall::new(number(caller), ConnectionId::new(conn))
}

fn t(n: u64) -> Tick {
    Tick::new(n)
}

/// Ringing call from 044-22334455 on conn#7, arrived at tick 100.
fn ringing(device: &MockDevice) -> CallStateMachine {
    let mut calls = machine();
    let mut sig = device.clone();
    calls.incoming(call("044-22334455", 7), t(100), &mut sig).unwrap();
    calls
}

// ── Inbound ──────────────────────────────────────────────────────

#[test]
fn incoming_call_rings_with_answer_deadline() {
    let device = MockDevice::new();
    let mut calls = machine();
    let mut sig = device.clone();

    let event = calls.incoming(call("044-22334455", 7), t(100), &mut sig).unwrap();

    assert_eq!(event, CallEvent::Ringing { caller: number("044-22334455") });
    assert_eq!(calls.state(), CallState::Ringing);
    assert_eq!(calls.deadline(), Some(t(400)));
    assert_eq!(calls.call().unwrap().kind, CallType::Incoming);
    assert_eq!(calls.call().unwrap().created_at, t(100));
    assert!(device.with(|s| s.ringing));
}

#[test]
fn answer_within_window_binds_audio() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let event = calls.answer(t(105), &mut sig, &mut audio).unwrap();

    assert_eq!(event, CallEvent::Connected { connection: ConnectionId::new(7) });
    assert_eq!(calls.state(), CallState::Active);
    assert_eq!(calls.deadline(), None);
    assert!(!device.with(|s| s.ringing));
    assert_eq!(device.with(|s| s.established.clone()), vec![ConnectionId::new(7)]);
}

#[test]
fn unanswered_call_is_missed_exactly_once() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let mut sig = device.clone();

    assert_eq!(calls.check_timeout(t(399), &mut sig), None);
    assert_eq!(
        calls.check_timeout(t(400), &mut sig),
        Some(CallEvent::Missed { caller: number("044-22334455") })
    );
    assert_eq!(calls.check_timeout(t(401), &mut sig), None);

    assert_eq!(calls.state(), CallState::Idle);
    let missed: Vec<_> = calls.log().missed().cloned().collect();
    assert_eq!(
        missed,
        vec![CallRecord::Missed { caller: number("044-22334455"), at: t(100) }]
    );
    assert!(!device.with(|s| s.ringing));
    assert_eq!(device.with(|s| s.released.clone()), vec![ConnectionId::new(7)]);
}

#[test]
fn answer_at_deadline_counts_as_timeout() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let event = calls.answer(t(400), &mut sig, &mut audio).unwrap();

    assert!(matches!(event, CallEvent::Missed { .. }));
    assert_eq!(calls.state(), CallState::Idle);
    assert!(device.with(|s| s.established.is_empty()));
}

#[test]
fn second_call_while_busy_is_rejected() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let mut sig = device.clone();

    let result = calls.incoming(call("555-0101", 8), t(120), &mut sig);

    assert_eq!(result, Err(CallError::Busy(CallState::Ringing)));
    assert_eq!(calls.call().unwrap().connection, ConnectionId::new(7));
    assert_eq!(device.with(|s| s.released.clone()), vec![ConnectionId::new(8)]);
    assert_eq!(
        calls.log().last(),
        Some(&CallRecord::Rejected { caller: number("555-0101"), at: t(120) })
    );
}

#[test]
fn audio_failure_on_answer_returns_to_idle() {
    let device = MockDevice::new();
    device.with(|s| s.audio_ok = false);
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let event = calls.answer(t(105), &mut sig, &mut audio).unwrap();

    assert_eq!(event, CallEvent::Failed(FailureReason::AudioPath));
    assert_eq!(calls.state(), CallState::Idle);
    assert!(calls.call().is_none());
    assert_eq!(device.with(|s| s.released.clone()), vec![ConnectionId::new(7)]);
    assert!(matches!(
        calls.log().last(),
        Some(CallRecord::Failed { reason: FailureReason::AudioPath, .. })
    ));
}

#[test]
fn answer_when_idle_is_refused() {
    let device = MockDevice::new();
    let mut calls = machine();
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let result = calls.answer(t(1), &mut sig, &mut audio);

    assert_eq!(
        result,
        Err(CallError::InvalidState { operation: "answer", state: CallState::Idle })
    );
}

#[test]
fn local_hang_up_while_ringing_declines() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let event = calls.hang_up(t(110), Termination::Local, &mut sig, &mut audio).unwrap();

    assert_eq!(event, CallEvent::Declined);
    assert_eq!(calls.state(), CallState::Idle);
    assert!(!device.with(|s| s.ringing));
    assert_eq!(
        calls.log().last(),
        Some(&CallRecord::Rejected { caller: number("044-22334455"), at: t(110) })
    );
    assert_eq!(calls.log().missed().count(), 0);
}

#[test]
fn caller_giving_up_while_ringing_is_missed() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());
    device.end_remote(ConnectionId::new(7));

    let event = calls.advance(t(150), &mut sig, &mut audio);

    assert!(matches!(event, Some(CallEvent::Missed { .. })));
    assert_eq!(calls.log().missed().count(), 1);
}

// ── Active calls ─────────────────────────────────────────────────

#[test]
fn local_hang_up_tears_down_audio_once() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.answer(t(105), &mut sig, &mut audio).unwrap();

    let event = calls.hang_up(t(155), Termination::Local, &mut sig, &mut audio).unwrap();

    assert_eq!(event, CallEvent::Ended { duration_ms: 5_000 });
    assert_eq!(calls.state(), CallState::Idle);
    assert_eq!(device.with(|s| s.torn_down.clone()), vec![ConnectionId::new(7)]);
    assert_eq!(
        calls.log().last(),
        Some(&CallRecord::Completed {
            kind: CallType::Incoming,
            number: number("044-22334455"),
            duration_ms: 5_000,
            ended_at: t(155),
        })
    );

    let again = calls.hang_up(t(156), Termination::Local, &mut sig, &mut audio);
    assert!(again.is_err());
    assert_eq!(device.with(|s| s.torn_down.len()), 1);
}

#[test]
fn remote_hang_up_ends_active_call() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.answer(t(105), &mut sig, &mut audio).unwrap();

    assert_eq!(calls.poll_remote(t(106), &mut sig, &mut audio), None);
    device.end_remote(ConnectionId::new(7));
    let event = calls.poll_remote(t(125), &mut sig, &mut audio);

    assert_eq!(event, Some(CallEvent::Ended { duration_ms: 2_000 }));
    assert_eq!(calls.state(), CallState::Idle);
    assert_eq!(device.with(|s| s.torn_down.len()), 1);
}

#[test]
fn inbound_path_is_journaled() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.answer(t(105), &mut sig, &mut audio).unwrap();

    let path: Vec<_> = calls.recent_transitions().map(|tr| (tr.from, tr.to, tr.at)).collect();

    assert_eq!(
        path,
        vec![
            (CallState::Idle, CallState::Ringing, t(100)),
            (CallState::Ringing, CallState::Answered, t(105)),
            (CallState::Answered, CallState::Active, t(105)),
        ]
    );
}

// ── Outbound ─────────────────────────────────────────────────────

#[test]
fn dialed_call_connects_when_picked_up() {
    let device = MockDevice::new();
    device.with(|s| s.dial_status = DialStatus::Pending);
    let mut calls = machine();
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let event = calls.dial(number("044-1234567"), CallType::Outgoing, t(10), &mut sig).unwrap();
    assert_eq!(event, CallEvent::Dialing { connection: ConnectionId::new(101) });
    assert_eq!(calls.state(), CallState::Dialing);
    assert_eq!(calls.poll_dialing(t(11), &mut sig, &mut audio), None);

    device.with(|s| s.dial_status = DialStatus::Connected);
    let event = calls.poll_dialing(t(12), &mut sig, &mut audio);

    assert_eq!(event, Some(CallEvent::Connected { connection: ConnectionId::new(101) }));
    assert_eq!(calls.state(), CallState::Active);
    assert_eq!(device.with(|s| s.dialed.clone()), vec![number("044-1234567")]);
}

#[test]
fn dial_without_answer_times_out() {
    let device = MockDevice::new();
    device.with(|s| s.dial_status = DialStatus::Pending);
    let mut calls = machine();
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.dial(number("044-1234567"), CallType::Outgoing, t(10), &mut sig).unwrap();

    assert_eq!(calls.poll_dialing(t(609), &mut sig, &mut audio), None);
    let event = calls.poll_dialing(t(610), &mut sig, &mut audio);

    assert_eq!(event, Some(CallEvent::Failed(FailureReason::DialTimeout)));
    assert_eq!(calls.state(), CallState::Idle);
    assert_eq!(device.with(|s| s.released.clone()), vec![ConnectionId::new(101)]);
}

#[test]
fn busy_far_end_fails_the_dial() {
    let device = MockDevice::new();
    device.with(|s| s.dial_status = DialStatus::Failed);
    let mut calls = machine();
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.dial(number("044-1234567"), CallType::Outgoing, t(10), &mut sig).unwrap();

    let event = calls.advance(t(11), &mut sig, &mut audio);

    assert_eq!(event, Some(CallEvent::Failed(FailureReason::RemoteRejected)));
    assert_eq!(calls.state(), CallState::Idle);
}

#[test]
fn refused_dial_is_logged_and_idle() {
    let device = MockDevice::new();
    device.with(|s| s.dial_ok = false);
    let mut calls = machine();
    let mut sig = device.clone();

    let event = calls.dial(number("044-1234567"), CallType::Outgoing, t(10), &mut sig).unwrap();

    assert_eq!(event, CallEvent::Failed(FailureReason::DialRejected));
    assert_eq!(calls.state(), CallState::Idle);
    assert_eq!(
        calls.log().last(),
        Some(&CallRecord::Failed {
            kind: CallType::Outgoing,
            number: number("044-1234567"),
            reason: FailureReason::DialRejected,
            at: t(10),
        })
    );
}

#[test]
fn cannot_dial_an_incoming_call() {
    let device = MockDevice::new();
    let mut calls = machine();
    let mut sig = device.clone();

    let result = calls.dial(number("044-1234567"), CallType::Incoming, t(10), &mut sig);

    assert_eq!(result, Err(CallError::NotOutbound));
    assert!(device.with(|s| s.dialed.is_empty()));
}

#[test]
fn hang_up_while_dialing_cancels() {
    let device = MockDevice::new();
    device.with(|s| s.dial_status = DialStatus::Pending);
    let mut calls = machine();
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.dial(number("044-1234567"), CallType::Outgoing, t(10), &mut sig).unwrap();

    let event = calls.hang_up(t(20), Termination::Local, &mut sig, &mut audio).unwrap();

    assert_eq!(event, CallEvent::Failed(FailureReason::Cancelled));
    assert_eq!(calls.state(), CallState::Idle);
    assert!(device.with(|s| s.torn_down.is_empty()));
}

// ── Preemption ───────────────────────────────────────────────────

#[test]
fn preempting_a_ringing_call_voids_it() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());

    let event = calls.preempt(t(150), &mut sig, &mut audio);

    assert_eq!(event, Some(CallEvent::Preempted));
    assert_eq!(calls.state(), CallState::Idle);
    assert_eq!(calls.deadline(), None);
    assert!(!device.with(|s| s.ringing));
    assert_eq!(
        calls.log().last(),
        Some(&CallRecord::Preempted {
            kind: CallType::Incoming,
            number: number("044-22334455"),
            at: t(150),
        })
    );
    // The voided call never times out into a missed record.
    assert_eq!(calls.check_timeout(t(400), &mut sig), None);
    assert_eq!(calls.log().missed().count(), 0);
}

#[test]
fn preempting_an_active_call_drops_it() {
    let device = MockDevice::new();
    let mut calls = ringing(&device);
    let (mut sig, mut audio) = (device.clone(), device.clone());
    calls.answer(t(105), &mut sig, &mut audio).unwrap();

    assert_eq!(calls.preempt(t(200), &mut sig, &mut audio), Some(CallEvent::Preempted));
    assert_eq!(device.with(|s| s.torn_down.clone()), vec![ConnectionId::new(7)]);
    assert_eq!(calls.preempt(t(201), &mut sig, &mut audio), None);
}

#[test]
fn call_log_drops_oldest_when_full() {
    let device = MockDevice::new();
    let config = CallConfig { log_capacity: 2, ..CallConfig::default() };
    let mut calls = CallStateMachine::new(&config, PERIOD);
    let mut sig = device.clone();

    for (i, n) in ["100", "200", "300"].iter().enumerate() {
        let at = t(1_000 * i as u64);
        calls.incoming(call(n, i as u32), at, &mut sig).unwrap();
        calls.check_timeout(at.after(300), &mut sig).unwrap();
    }

    let callers: Vec<_> = calls
        .log()
        .records()
        .map(|r| match r {
            CallRecord::Missed { caller, .. } => caller.to_string(),
            other => panic!("unexpected record {other:?}"),
        })
        .collect();
    assert_eq!(callers, vec!["200", "300"]);
}

proptest! {
    #[test]
    fn answer_inside_window_connects_otherwise_missed(delay in 0u64..700) {
        let device = MockDevice::new();
        let mut calls = ringing(&device);
        let (mut sig, mut audio) = (device.clone(), device.clone());

        // Tick forward to the answer, as the supervisor would.
        for now in 100..100 + delay {
            calls.check_timeout(t(now), &mut sig);
        }
        let answered = calls.answer(t(100 + delay), &mut sig, &mut audio);

        if delay < 300 {
            prop_assert_eq!(calls.state(), CallState::Active);
            prop_assert_eq!(calls.log().missed().count(), 0);
        } else {
            let missed = answered.is_err() || matches!(answered, Ok(CallEvent::Missed { .. }));
            prop_assert!(missed);
            prop_assert_eq!(calls.state(), CallState::Idle);
            prop_assert_eq!(calls.log().missed().count(), 1);
            prop_assert!(device.with(|s| s.established.is_empty()));
        }
    }
}
