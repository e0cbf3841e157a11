//! Health telemetry: heartbeat samples and self-diagnostics reports.

use crate::tick::Tick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One heartbeat's worth of health readings. Built, sent, and dropped
/// within a single heartbeat cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatSample {
    /// Ticks since boot.
    pub uptime_ticks: u64,
    /// Seconds since boot at the configured loop period.
    pub uptime_secs: u64,
    /// Battery charge, percent.
    pub battery_percent: u8,
    /// Network signal strength, dBm.
    pub signal_dbm: i16,
    /// Memory in use, percent.
    pub memory_percent: u8,
    /// Board temperature, degrees Celsius.
    pub temperature_c: f32,
}

/// Subsystem a diagnostic finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Battery,
    Temperature,
    Memory,
    Network,
    Audio,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Battery => "battery",
            Self::Temperature => "temperature",
            Self::Memory => "memory",
            Self::Network => "network",
            Self::Audio => "audio",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// A single self-test finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    pub component: Component,
    pub severity: Severity,
    pub detail: String,
}

impl DiagnosticIssue {
    pub fn new(component: Component, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            component,
            severity,
            detail: detail.into(),
        }
    }
}

/// Result of a full self-test run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Tick the self-test ran on.
    pub at: Tick,
    /// Findings, empty when everything passed.
    pub issues: Vec<DiagnosticIssue>,
}

impl DiagnosticsReport {
    #[must_use]
    pub fn new(at: Tick) -> Self {
        Self {
            at,
            issues: Vec::new(),
        }
    }

    pub fn push(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    /// Findings that must be reported upstream.
    pub fn critical(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Critical)
    }

    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.critical().next().is_some()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
