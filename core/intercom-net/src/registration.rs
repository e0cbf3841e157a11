//! Registration state machine.
//!
//! ```text
//! Unregistered ─► PendingPrimary ─► PendingBackup ─► Failed
//!                       │                 │
//!                       └──► Registered ◄─┘
//! ```
//!
//! A new attempt re-enters `PendingPrimary` from any resting state.

use crate::error::{NetError, NetResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    Unregistered,
    PendingPrimary,
    PendingBackup,
    Registered,
    Failed,
}

impl RegistrationState {
    /// Whether `self -> next` is an allowed step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use RegistrationState::*;
        matches!(
            (self, next),
            (Unregistered | Registered | Failed, PendingPrimary)
                | (PendingPrimary, PendingBackup | Registered)
                | (PendingBackup, Registered | Failed)
        )
    }

    /// Performs a checked transition.
    pub fn transition(self, next: Self) -> NetResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(NetError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Registered)
    }

    /// True while a registration attempt is in flight.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::PendingPrimary | Self::PendingBackup)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unregistered => "unregistered",
            Self::PendingPrimary => "pending (primary)",
            Self::PendingBackup => "pending (backup)",
            Self::Registered => "registered",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Which server of the pair accepted the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    Primary,
    Backup,
}
