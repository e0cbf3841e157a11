//! Control core of a LAN intercom endpoint.
//!
//! A single [`Supervisor`] owns all device state and drives it one tick at a
//! time: it takes and places calls through the [`call`] state machine, hands
//! the line to the [`emergency`] arbitrator when an alarm is raised, and
//! keeps the monitoring server informed through periodic heartbeats and
//! self-tests.
//!
//! Hardware is reached only through the [`ports`] traits. A host brings the
//! device up with [`boot`] and then calls [`Supervisor::run`] on a
//! current-thread tokio runtime.

pub mod boot;
pub mod call;
pub mod clock;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod emergency;
pub mod error;
pub mod ports;
pub mod scheduler;
pub mod supervisor;

pub use boot::{BootWarning, SystemStatus, boot};
pub use config::BootConfig;
pub use error::{BootError, CallError, CallResult, ConfigError};
pub use supervisor::{Supervisor, SupervisorConfig};
