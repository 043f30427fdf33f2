//! Tests for autopilot liveness monitoring
//!
//! Tests the strict timeout comparison, once-per-episode assertion,
//! clearing on a new command, and wrap-around of the millisecond clock.
//!
//! Run with: cargo test --no-default-features --features std --test liveness_tests

use courier_firmware::control::LivenessMonitor;
use courier_firmware::types::{FailsafeEvent, Millis};

const TIMEOUT: Millis = Millis::new(400);

fn ms(value: u32) -> Millis {
    Millis::new(value)
}

/// Monitor whose last command arrived at `t`
fn monitor_at(t: u32) -> LivenessMonitor {
    LivenessMonitor::new(TIMEOUT, ms(t))
}

// ============================================================================
// Timeout Comparison
// ============================================================================

#[test]
fn within_timeout_is_live() {
    let mut monitor = monitor_at(0);
    assert_eq!(monitor.check(ms(399)), None);
    assert!(!monitor.is_lost());
}

#[test]
fn exactly_timeout_is_live() {
    let mut monitor = monitor_at(0);
    assert_eq!(monitor.check(ms(400)), None);
    assert!(!monitor.is_lost());
}

#[test]
fn past_timeout_is_lost() {
    let mut monitor = monitor_at(0);
    assert_eq!(monitor.check(ms(401)), Some(FailsafeEvent::Asserted));
    assert!(monitor.is_lost());
}

#[test]
fn command_at_399_then_check_at_800() {
    let mut monitor = monitor_at(0);
    monitor.command_received(ms(399));

    assert_eq!(monitor.check(ms(799)), None);
    assert_eq!(monitor.check(ms(800)), Some(FailsafeEvent::Asserted));
}

#[test]
fn reports_timeout_and_elapsed() {
    let monitor = monitor_at(1_000);
    assert_eq!(monitor.timeout(), TIMEOUT);
    assert_eq!(monitor.elapsed(ms(1_250)), ms(250));
}

// ============================================================================
// Episodes
// ============================================================================

#[test]
fn asserts_once_per_episode() {
    let mut monitor = monitor_at(0);

    assert_eq!(monitor.check(ms(401)), Some(FailsafeEvent::Asserted));
    for t in (420..2_000).step_by(20) {
        assert_eq!(monitor.check(ms(t)), None, "t={t}");
    }
    assert!(monitor.is_lost());
}

#[test]
fn command_clears_the_failsafe() {
    let mut monitor = monitor_at(0);
    monitor.check(ms(500));

    assert_eq!(monitor.command_received(ms(600)), Some(FailsafeEvent::Cleared));
    assert!(!monitor.is_lost());
    assert_eq!(monitor.check(ms(700)), None);
}

#[test]
fn repeated_commands_clear_only_once() {
    let mut monitor = monitor_at(0);
    monitor.check(ms(500));

    assert_eq!(monitor.command_received(ms(600)), Some(FailsafeEvent::Cleared));
    assert_eq!(monitor.command_received(ms(610)), None);
}

#[test]
fn new_episode_asserts_again() {
    let mut monitor = monitor_at(0);

    assert_eq!(monitor.check(ms(401)), Some(FailsafeEvent::Asserted));
    assert_eq!(monitor.command_received(ms(450)), Some(FailsafeEvent::Cleared));
    assert_eq!(monitor.check(ms(850)), None);
    assert_eq!(monitor.check(ms(851)), Some(FailsafeEvent::Asserted));
}

#[test]
fn regular_commands_keep_it_live() {
    let mut monitor = monitor_at(0);
    for t in (0..10_000).step_by(100) {
        monitor.command_received(ms(t));
        assert_eq!(monitor.check(ms(t + 50)), None);
    }
    assert!(!monitor.is_lost());
}

// ============================================================================
// Clock Wrap
// ============================================================================

#[test]
fn elapsed_spans_clock_wrap() {
    let start = u32::MAX - 100;
    let mut monitor = monitor_at(start);

    assert_eq!(monitor.check(ms(start.wrapping_add(400))), None);
    assert_eq!(
        monitor.check(ms(start.wrapping_add(401))),
        Some(FailsafeEvent::Asserted)
    );
}
