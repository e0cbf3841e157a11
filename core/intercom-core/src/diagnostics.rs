//! Telemetry sampling and the full self-test.

use crate::clock::TickClock;
use crate::ports::{Hardware, Telemetry};
use intercom_types::{Component, DiagnosticIssue, DiagnosticsReport, HeartbeatSample, Severity, Tick};

/// Self-test thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticsConfig {
    /// Battery below this is critical.
    pub low_battery_percent: u8,
    /// Temperature above this is critical.
    pub max_temperature_c: f32,
    /// Memory usage above this is a warning.
    pub max_memory_percent: u8,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            low_battery_percent: 20,
            max_temperature_c: 70.0,
            max_memory_percent: 90,
        }
    }
}

/// Reads the sensors into a heartbeat sample.
pub fn sample(telemetry: &dyn Telemetry, clock: &TickClock) -> HeartbeatSample {
    HeartbeatSample {
        uptime_ticks: clock.now().value(),
        uptime_secs: clock.uptime().as_secs(),
        battery_percent: telemetry.battery_level(),
        signal_dbm: telemetry.signal_strength(),
        memory_percent: telemetry.memory_usage(),
        temperature_c: telemetry.temperature(),
    }
}

/// Runs every check and collects the findings.
pub fn self_test(
    config: &DiagnosticsConfig,
    telemetry: &dyn Telemetry,
    hardware: &mut dyn Hardware,
    now: Tick,
) -> DiagnosticsReport {
    let mut report = DiagnosticsReport::new(now);

    let battery = telemetry.battery_level();
    if battery < config.low_battery_percent {
        report.push(DiagnosticIssue::new(
            Component::Battery,
            Severity::Critical,
            format!("battery at {battery}%"),
        ));
    }

    let temperature = telemetry.temperature();
    if temperature > config.max_temperature_c {
        report.push(DiagnosticIssue::new(
            Component::Temperature,
            Severity::Critical,
            format!("temperature {temperature:.1}°C"),
        ));
    }

    let memory = telemetry.memory_usage();
    if memory > config.max_memory_percent {
        report.push(DiagnosticIssue::new(
            Component::Memory,
            Severity::Warning,
            format!("memory at {memory}%"),
        ));
    }

    if !hardware.test_connectivity() {
        report.push(DiagnosticIssue::new(
            Component::Network,
            Severity::Critical,
            "gateway unreachable",
        ));
    }

    if !hardware.test_audio() {
        report.push(DiagnosticIssue::new(
            Component::Audio,
            Severity::Critical,
            "audio loopback failed",
        ));
    }

    report
}
