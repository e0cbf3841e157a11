//! Call states.
//!
//! ```text
//! inbound:   Idle ─► Ringing ─► Answered ─► Active ─► Idle
//!                       └─► Unanswered ─► Idle
//! outbound:  Idle ─► Dialing ─► Active ─► Idle
//! ```
//!
//! `Answered` and `Unanswered` are passed through inside a single operation
//! and never observed between ticks.

use intercom_types::Tick;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    Idle,
    Ringing,
    Answered,
    Unanswered,
    Dialing,
    Active,
}

impl CallState {
    /// Whether `self -> next` is a legal step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Idle, Ringing | Dialing)
                | (Ringing, Answered | Unanswered | Idle)
                | (Answered, Active | Idle)
                | (Unanswered, Idle)
                | (Dialing, Active | Idle)
                | (Active, Idle)
        )
    }

    /// A call is in progress and background work must wait.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Ringing => "ringing",
            Self::Answered => "answered",
            Self::Unanswered => "unanswered",
            Self::Dialing => "dialing",
            Self::Active => "active",
        };
        f.write_str(s)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CallState,
    pub to: CallState,
    pub at: Tick,
}
