//! In-memory call log.

use intercom_types::{CallType, CallerId, Tick};
use std::collections::VecDeque;
use std::fmt;

/// Why a call ended without being connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The line refused the dial attempt outright.
    DialRejected,
    /// The far end never picked up.
    DialTimeout,
    /// The far end was busy or refused.
    RemoteRejected,
    /// Mic/speaker could not be bound to the connection.
    AudioPath,
    /// Hung up locally while still dialing.
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DialRejected => "dial rejected",
            Self::DialTimeout => "no answer",
            Self::RemoteRejected => "remote busy or refused",
            Self::AudioPath => "audio path failure",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecord {
    /// Inbound call that was never answered. `at` is when it arrived.
    Missed { caller: CallerId, at: Tick },
    /// Call that reached Active and was hung up.
    Completed {
        kind: CallType,
        number: CallerId,
        duration_ms: u64,
        ended_at: Tick,
    },
    /// Call that ended before audio was connected.
    Failed {
        kind: CallType,
        number: CallerId,
        reason: FailureReason,
        at: Tick,
    },
    /// Inbound call declined locally or turned away because the slot was busy.
    Rejected { caller: CallerId, at: Tick },
    /// Call dropped to make room for an emergency call.
    Preempted {
        kind: CallType,
        number: CallerId,
        at: Tick,
    },
}

/// Bounded call log; the oldest record is dropped when full.
#[derive(Debug, Clone)]
pub struct CallLog {
    records: VecDeque<CallRecord>,
    capacity: usize,
}

impl CallLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: CallRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &CallRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&CallRecord> {
        self.records.back()
    }

    /// Missed-call records, oldest first.
    pub fn missed(&self) -> impl Iterator<Item = &CallRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, CallRecord::Missed { .. }))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
