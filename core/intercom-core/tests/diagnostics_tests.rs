use intercom_core::clock::TickClock;
use intercom_core::context::{AudioSettings, DialBuffer};
use intercom_core::diagnostics::{self, DiagnosticsConfig};
use intercom_core::ports::mock::MockDevice;
use intercom_types::{Component, KeypadKey, Severity, Tick, VolumeStep};
use std::time::Duration;

#[test]
fn sample_reads_every_sensor() {
    let device = MockDevice::new();
    let mut clock = TickClock::new(Duration::from_millis(100));
    for _ in 0..600 {
        clock.tick();
    }

    let sample = diagnostics::sample(&device, &clock);

    assert_eq!(sample.uptime_ticks, 600);
    assert_eq!(sample.uptime_secs, 60);
    assert_eq!(sample.battery_percent, 95);
    assert_eq!(sample.signal_dbm, -60);
    assert_eq!(sample.memory_percent, 40);
    assert_eq!(sample.temperature_c, 35.0);
}

#[test]
fn healthy_device_passes_self_test() {
    let device = MockDevice::new();
    let mut hardware = device.clone();

    let report = diagnostics::self_test(&DiagnosticsConfig::default(), &device, &mut hardware, Tick::new(9));

    assert!(report.is_clean());
    assert_eq!(report.at, Tick::new(9));
}

#[test]
fn thresholds_classify_findings() {
    let device = MockDevice::new();
    device.with(|s| {
        s.battery = 19;
        s.temperature = 70.5;
        s.memory = 91;
        s.connectivity_ok = false;
        s.audio_test_ok = false;
    });
    let mut hardware = device.clone();

    let report = diagnostics::self_test(&DiagnosticsConfig::default(), &device, &mut hardware, Tick::ZERO);

    let findings: Vec<_> = report.issues.iter().map(|i| (i.component, i.severity)).collect();
    assert_eq!(
        findings,
        vec![
            (Component::Battery, Severity::Critical),
            (Component::Temperature, Severity::Critical),
            (Component::Memory, Severity::Warning),
            (Component::Network, Severity::Critical),
            (Component::Audio, Severity::Critical),
        ]
    );
    assert_eq!(report.critical().count(), 4);
}

#[test]
fn values_at_the_threshold_pass() {
    let device = MockDevice::new();
    device.with(|s| {
        s.battery = 20;
        s.temperature = 70.0;
        s.memory = 90;
    });
    let mut hardware = device.clone();

    let report = diagnostics::self_test(&DiagnosticsConfig::default(), &device, &mut hardware, Tick::ZERO);

    assert!(report.is_clean());
}

#[test]
fn volume_steps_clamp() {
    let mut audio = AudioSettings::default();
    assert_eq!(audio.volume(), 5);
    assert_eq!(audio.step(VolumeStep::Down), 4);
    assert_eq!(AudioSettings::new(42).volume(), 10);

    let mut quiet = AudioSettings::new(0);
    assert_eq!(quiet.step(VolumeStep::Down), 0);
    audio = AudioSettings::new(10);
    assert_eq!(audio.step(VolumeStep::Up), 10);
}

#[test]
fn dial_buffer_is_bounded() {
    let mut buffer = DialBuffer::default();
    for _ in 0..32 {
        assert!(buffer.push(KeypadKey::Hash));
    }
    assert!(!buffer.push(KeypadKey::Star));
    assert_eq!(buffer.as_str().len(), 32);

    let number = buffer.take().unwrap();
    assert_eq!(number.len(), 32);
    assert!(buffer.is_empty());
    assert!(buffer.take().is_none());
}
