//! Tests for utility functions

use std::time::Duration;

use agent_orchestrator::util::{init_tracing, now_ms, Clock, ManualClock, SystemClock};

#[test]
fn test_manual_clock_advances() {
    let clock = ManualClock::new(0);
    assert_eq!(clock.now_ms(), 0);
    clock.advance(Duration::from_millis(1_500));
    assert_eq!(clock.now_ms(), 1_500);
}

#[test]
fn test_system_clock_tracks_now() {
    let before = now_ms();
    let read = SystemClock.now_ms();
    assert!(read >= before);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialised twice without panicking");
}
