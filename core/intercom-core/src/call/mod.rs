//! Call handling: the single-slot call state machine and its call log.

mod log;
mod machine;
mod state;

pub use log::{CallLog, CallRecord, FailureReason};
pub use machine::{CallConfig, CallEvent, CallStateMachine, Termination};
pub use state::{CallState, Transition};
