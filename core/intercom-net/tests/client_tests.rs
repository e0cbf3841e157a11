use intercom_net::transport::mock::{MockBehavior, MockTransport};
use intercom_net::{
    Addressing, ClientConfig, EndpointClient, NetError, NetworkConfig, RegistrationState,
    ServerMessage, ServerRole,
};
use intercom_types::{DeviceIdentity, DiagnosticsReport, HeartbeatSample, Tick};
use std::sync::Arc;
use std::time::Duration;

const PRIMARY: &str = "primary.monitor.lan";
const BACKUP: &str = "backup.monitor.lan";

fn identity() -> DeviceIdentity {
    DeviceIdentity::new("SN123456", "2.4.1", "IC-200").unwrap()
}

fn network() -> NetworkConfig {
    NetworkConfig::new(Addressing::default(), PRIMARY, BACKUP, 5060)
}

fn make_client(transport: &MockTransport) -> EndpointClient {
    EndpointClient::new(Arc::new(transport.clone()), ClientConfig::default())
}

fn sample() -> HeartbeatSample {
    HeartbeatSample {
        uptime_ticks: 60,
        uptime_secs: 6,
        battery_percent: 90,
        signal_dbm: -55,
        memory_percent: 30,
        temperature_c: 35.0,
    }
}

// ── Registration ─────────────────────────────────────────────────

#[tokio::test]
async fn registers_with_primary() {
    let transport = MockTransport::new();
    let mut client = make_client(&transport);

    let state = client.register(&identity(), &network()).await;

    assert_eq!(state, RegistrationState::Registered);
    assert_eq!(client.state(), RegistrationState::Registered);
    assert_eq!(client.registered_with(), Some(ServerRole::Primary));
    assert_eq!(transport.attempted_hosts(), vec![PRIMARY]);
}

#[tokio::test]
async fn falls_back_to_backup_with_same_payload() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Refuse);
    let mut client = make_client(&transport);

    let state = client.register(&identity(), &network()).await;

    assert_eq!(state, RegistrationState::Registered);
    assert_eq!(client.registered_with(), Some(ServerRole::Backup));
    let attempts = transport.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].0.host, PRIMARY);
    assert_eq!(attempts[1].0.host, BACKUP);
    assert_eq!(attempts[0].1, attempts[1].1);
}

#[tokio::test]
async fn both_fail_yields_failed_after_one_attempt_each() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Refuse);
    transport.set_behavior(BACKUP, MockBehavior::Reject("unknown device".into()));
    let mut client = make_client(&transport);

    let state = client.register(&identity(), &network()).await;

    assert_eq!(state, RegistrationState::Failed);
    assert_eq!(client.registered_with(), None);
    assert_eq!(transport.attempted_hosts(), vec![PRIMARY, BACKUP]);
}

#[tokio::test(start_paused = true)]
async fn hung_primary_times_out_then_backup() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Hang);
    let mut client = EndpointClient::new(
        Arc::new(transport.clone()),
        ClientConfig {
            attempt_timeout: Duration::from_secs(2),
        },
    );

    let start = tokio::time::Instant::now();
    let state = client.register(&identity(), &network()).await;

    assert_eq!(state, RegistrationState::Registered);
    assert_eq!(client.registered_with(), Some(ServerRole::Backup));
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn both_hung_is_bounded_by_two_timeouts() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Hang);
    transport.set_behavior(BACKUP, MockBehavior::Hang);
    let mut client = make_client(&transport);

    let start = tokio::time::Instant::now();
    let state = client.register(&identity(), &network()).await;

    assert_eq!(state, RegistrationState::Failed);
    assert!(start.elapsed() <= client.attempt_timeout() * 2 + Duration::from_millis(10));
}

#[tokio::test]
async fn reregister_after_failure() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Refuse);
    transport.set_behavior(BACKUP, MockBehavior::Refuse);
    let mut client = make_client(&transport);
    assert_eq!(client.register(&identity(), &network()).await, RegistrationState::Failed);

    transport.set_behavior(PRIMARY, MockBehavior::Accept);
    assert_eq!(client.register(&identity(), &network()).await, RegistrationState::Registered);
    assert_eq!(transport.count("register"), 3);
}

#[tokio::test]
async fn register_payload_carries_identity_and_address() {
    let transport = MockTransport::new();
    let mut client = make_client(&transport);
    client.register(&identity(), &network()).await;

    match &transport.attempts()[0].1 {
        ServerMessage::Register(m) => {
            assert_eq!(m.serial.as_str(), "SN123456");
            assert_eq!(m.firmware, "2.4.1");
            assert_eq!(m.model, "IC-200");
            assert_eq!(m.ip, Addressing::default().ip);
            assert_eq!(m.version, intercom_net::PROTOCOL_VERSION);
        }
        other => panic!("Expected Register, got {other:?}"),
    }
}

// ── Telemetry ────────────────────────────────────────────────────

#[tokio::test]
async fn heartbeat_goes_to_registered_server() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Refuse);
    let mut client = make_client(&transport);
    client.register(&identity(), &network()).await;
    transport.clear();

    client.send_heartbeat(&identity(), &network(), sample()).await.unwrap();

    assert_eq!(transport.attempted_hosts(), vec![BACKUP]);
    assert_eq!(transport.count("heartbeat"), 1);
}

#[tokio::test]
async fn heartbeat_defaults_to_primary_when_unregistered() {
    let transport = MockTransport::new();
    let client = make_client(&transport);

    client.send_heartbeat(&identity(), &network(), sample()).await.unwrap();

    assert_eq!(transport.attempted_hosts(), vec![PRIMARY]);
}

#[tokio::test]
async fn heartbeat_failure_is_returned_not_retried() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Refuse);
    let client = make_client(&transport);

    let result = client.send_heartbeat(&identity(), &network(), sample()).await;

    assert!(matches!(result, Err(NetError::Io(_))));
    assert_eq!(transport.attempts().len(), 1);
}

#[tokio::test]
async fn diagnostics_rejection_is_reported() {
    let transport = MockTransport::new();
    transport.set_behavior(PRIMARY, MockBehavior::Reject("busy".into()));
    let client = make_client(&transport);

    let result = client
        .report_diagnostics(&identity(), &network(), DiagnosticsReport::new(Tick::new(86_400)))
        .await;

    match result {
        Err(NetError::Rejected(reason)) => assert_eq!(reason, "busy"),
        other => panic!("Expected Rejected, got {other:?}"),
    }
}
