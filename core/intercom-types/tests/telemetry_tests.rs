use intercom_types::{
    Component, DiagnosticIssue, DiagnosticsReport, HeartbeatSample, Severity, Tick,
};

#[test]
fn empty_report_is_clean() {
    let report = DiagnosticsReport::new(Tick::new(86_400));
    assert!(report.is_clean());
    assert!(!report.has_critical());
    assert_eq!(report.at, Tick::new(86_400));
}

#[test]
fn warning_only_report_has_no_critical() {
    let mut report = DiagnosticsReport::new(Tick::ZERO);
    report.push(DiagnosticIssue::new(Component::Memory, Severity::Warning, "memory at 93%"));
    assert!(!report.is_clean());
    assert!(!report.has_critical());
}

#[test]
fn critical_filters_findings() {
    let mut report = DiagnosticsReport::new(Tick::ZERO);
    report.push(DiagnosticIssue::new(Component::Memory, Severity::Warning, "memory at 93%"));
    report.push(DiagnosticIssue::new(Component::Battery, Severity::Critical, "battery at 5%"));
    let critical: Vec<_> = report.critical().collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].component, Component::Battery);
    assert!(report.has_critical());
}

#[test]
fn severity_ordering() {
    assert!(Severity::Warning < Severity::Critical);
}

#[test]
fn sample_serializes_with_field_names() {
    let sample = HeartbeatSample {
        uptime_ticks: 600,
        uptime_secs: 60,
        battery_percent: 87,
        signal_dbm: -61,
        memory_percent: 42,
        temperature_c: 36.5,
    };
    let value = serde_json::to_value(&sample).unwrap();
    assert_eq!(value["uptime_ticks"], 600);
    assert_eq!(value["battery_percent"], 87);
    assert_eq!(value["signal_dbm"], -61);
    let parsed: HeartbeatSample = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, sample);
}

#[test]
fn component_serde_names() {
    let json = serde_json::to_string(&Component::Temperature).unwrap();
    assert_eq!(json, "\"temperature\"");
    assert_eq!(Component::Audio.to_string(), "audio");
}
