use intercom_net::{NetError, RegistrationState};
use proptest::prelude::*;

use RegistrationState::*;

const ALL: [RegistrationState; 5] = [Unregistered, PendingPrimary, PendingBackup, Registered, Failed];

// ── Allowed transitions ──────────────────────────────────────────

#[test]
fn happy_path_via_primary() {
    let s = Unregistered.transition(PendingPrimary).unwrap();
    let s = s.transition(Registered).unwrap();
    assert!(s.is_registered());
}

#[test]
fn fallback_path_via_backup() {
    let s = Unregistered
        .transition(PendingPrimary)
        .and_then(|s| s.transition(PendingBackup))
        .and_then(|s| s.transition(Registered))
        .unwrap();
    assert_eq!(s, Registered);
}

#[test]
fn failed_only_after_backup() {
    assert!(PendingBackup.can_transition_to(Failed));
    assert!(!PendingPrimary.can_transition_to(Failed));
    assert!(!Unregistered.can_transition_to(Failed));
    assert!(!Registered.can_transition_to(Failed));
}

#[test]
fn new_attempt_restarts_from_resting_states() {
    for from in [Unregistered, Registered, Failed] {
        assert!(from.can_transition_to(PendingPrimary), "{from:?}");
    }
    assert!(!PendingBackup.can_transition_to(PendingPrimary));
    assert!(!PendingPrimary.can_transition_to(PendingPrimary));
}

// ── Rejected transitions ─────────────────────────────────────────

#[test]
fn skipping_primary_is_rejected() {
    let err = Unregistered.transition(PendingBackup).unwrap_err();
    match err {
        NetError::InvalidTransition { from, to } => {
            assert_eq!(from, Unregistered);
            assert_eq!(to, PendingBackup);
        }
        other => panic!("Expected InvalidTransition, got {other:?}"),
    }
}

#[test]
fn cannot_register_without_attempt() {
    assert!(Unregistered.transition(Registered).is_err());
    assert!(Failed.transition(Registered).is_err());
}

#[test]
fn pending_predicates() {
    assert!(PendingPrimary.is_pending());
    assert!(PendingBackup.is_pending());
    assert!(!Registered.is_pending());
    assert!(!Failed.is_pending());
}

#[test]
fn display() {
    assert_eq!(Registered.to_string(), "registered");
    assert_eq!(PendingBackup.to_string(), "pending (backup)");
}

proptest! {
    /// Any accepted walk never reaches Failed without passing PendingBackup
    /// immediately before it.
    #[test]
    fn failed_is_always_preceded_by_backup(steps in prop::collection::vec(0usize..5, 1..40)) {
        let mut state = Unregistered;
        for step in steps {
            let next = ALL[step];
            if let Ok(s) = state.transition(next) {
                if s == Failed {
                    prop_assert_eq!(state, PendingBackup);
                }
                state = s;
            }
        }
    }
}
