use intercom_types::{Tick, ticks_for};
use std::time::Duration;

// ── Construction ─────────────────────────────────────────────────

#[test]
fn zero_is_default() {
    assert_eq!(Tick::default(), Tick::ZERO);
    assert_eq!(Tick::ZERO.value(), 0);
}

#[test]
fn next_and_after() {
    let t = Tick::new(10);
    assert_eq!(t.next(), Tick::new(11));
    assert_eq!(t.after(300), Tick::new(310));
}

#[test]
fn saturates_at_max() {
    let t = Tick::new(u64::MAX);
    assert_eq!(t.next(), t);
    assert_eq!(t.after(5), t);
}

// ── Arithmetic ───────────────────────────────────────────────────

#[test]
fn since_counts_elapsed_ticks() {
    assert_eq!(Tick::new(105).since(Tick::new(100)), 5);
    assert_eq!(Tick::new(100).since(Tick::new(105)), 0);
}

#[test]
fn periods_counts_completed_intervals() {
    assert_eq!(Tick::new(59).periods(60), 0);
    assert_eq!(Tick::new(60).periods(60), 1);
    assert_eq!(Tick::new(179).periods(60), 2);
    assert_eq!(Tick::new(100).periods(0), 0);
}

#[test]
fn ordering() {
    assert!(Tick::new(1) < Tick::new(2));
    assert_eq!(Tick::new(3).max(Tick::new(7)), Tick::new(7));
}

#[test]
fn as_duration() {
    let period = Duration::from_millis(100);
    assert_eq!(Tick::new(300).as_duration(period), Duration::from_secs(30));
}

#[test]
fn display() {
    assert_eq!(Tick::new(42).to_string(), "t42");
}

// ── ticks_for ────────────────────────────────────────────────────

#[test]
fn answer_timeout_at_reference_cadence() {
    let ticks = ticks_for(Duration::from_millis(30_000), Duration::from_millis(100));
    assert_eq!(ticks, 300);
}

#[test]
fn rounds_partial_ticks_up() {
    assert_eq!(ticks_for(Duration::from_millis(150), Duration::from_millis(100)), 2);
    assert_eq!(ticks_for(Duration::from_millis(1), Duration::from_millis(100)), 1);
    assert_eq!(ticks_for(Duration::ZERO, Duration::from_millis(100)), 0);
}

#[test]
fn zero_period_counts_milliseconds() {
    assert_eq!(ticks_for(Duration::from_millis(250), Duration::ZERO), 250);
}
