//! Tests for the 50 Hz control cycle
//!
//! Tests channel sampling from the configured switches, the liveness-then-
//! arbiter ordering within one cycle, and publication into the shared
//! authority state.
//!
//! Run with: cargo test --no-default-features --features std --test cycle_tests

use courier_firmware::config::ConfigSnapshot;
use courier_firmware::control::{AuthoritySink, ControlCycle, CycleOutcome, SharedAuthority};
use courier_firmware::hal::mock::{MockBoard, MockContext};
use courier_firmware::hal::{Hal, RcInput, Scheduler};
use courier_firmware::types::{ControlAuthority, FailsafeEvent, Millis, PulseWidth, RcChannel};

/// Receiver frame with settable channels 1..=8
#[derive(Default)]
struct Sticks {
    channels: [Option<u16>; 8],
}

impl Sticks {
    fn with(mut self, channel: u8, us: u16) -> Self {
        self.channels[usize::from(channel - 1)] = Some(us);
        self
    }

    /// Selector on CH6 and thrust-enable on CH7, as in the build options
    fn switches(selector: u16, thrust_enable: u16) -> Self {
        Self::default().with(6, selector).with(7, thrust_enable)
    }
}

impl RcInput for Sticks {
    fn new_input(&mut self) -> bool {
        true
    }

    fn num_channels(&self) -> u8 {
        8
    }

    fn read(&self, channel: RcChannel) -> Option<PulseWidth> {
        self.channels[channel.index()].map(PulseWidth::from_us)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Published {
    Authority(ControlAuthority),
    Failsafe(FailsafeEvent),
}

#[derive(Default)]
struct RecordingSink {
    published: Vec<Published>,
}

impl AuthoritySink for RecordingSink {
    fn publish_authority(&mut self, authority: ControlAuthority) {
        self.published.push(Published::Authority(authority));
    }

    fn publish_failsafe(&mut self, event: FailsafeEvent) {
        self.published.push(Published::Failsafe(event));
    }
}

fn ms(value: u32) -> Millis {
    Millis::new(value)
}

fn cycle_at(now: u32) -> ControlCycle {
    ControlCycle::new(&ConfigSnapshot::from_build().unwrap(), ms(now))
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn samples_configured_channels() {
    let cycle = cycle_at(0);
    let rc = Sticks::switches(1900, 1100).with(3, 1500);

    let sample = cycle.sample(&rc);
    assert_eq!(sample.selector, Some(PulseWidth::from_us(1900)));
    assert_eq!(sample.thrust_enable, Some(PulseWidth::from_us(1100)));
}

#[test]
fn missing_channels_sample_as_none() {
    let cycle = cycle_at(0);
    let rc = Sticks::default().with(1, 1500).with(2, 1500);

    let sample = cycle.sample(&rc);
    assert_eq!(sample.selector, None);
    assert_eq!(sample.thrust_enable, None);
}

// ============================================================================
// One Cycle
// ============================================================================

#[test]
fn quiet_cycle_publishes_nothing() {
    let mut cycle = cycle_at(0);
    let mut sink = RecordingSink::default();

    let outcome = cycle.run(&Sticks::switches(1000, 1000), ms(20), &mut sink);

    assert_eq!(outcome, CycleOutcome::default());
    assert!(sink.published.is_empty());
    assert_eq!(cycle.authority(), ControlAuthority::Autonomous);
}

#[test]
fn override_is_published() {
    let mut cycle = cycle_at(0);
    let mut sink = RecordingSink::default();

    let outcome = cycle.run(&Sticks::switches(1900, 1900), ms(20), &mut sink);

    assert_eq!(outcome.transition, Some(ControlAuthority::ManualOverride));
    assert_eq!(outcome.failsafe, None);
    assert_eq!(
        sink.published,
        vec![Published::Authority(ControlAuthority::ManualOverride)]
    );
    assert!(cycle.authority().is_manual());
}

#[test]
fn liveness_runs_before_arbitration() {
    let mut cycle = cycle_at(0);
    let mut sink = RecordingSink::default();

    let outcome = cycle.run(&Sticks::switches(1900, 1900), ms(401), &mut sink);

    assert_eq!(outcome.failsafe, Some(FailsafeEvent::Asserted));
    assert_eq!(outcome.transition, Some(ControlAuthority::ManualOverride));
    assert_eq!(
        sink.published,
        vec![
            Published::Failsafe(FailsafeEvent::Asserted),
            Published::Authority(ControlAuthority::ManualOverride),
        ]
    );
    assert!(cycle.failsafe_active());
}

#[test]
fn command_clears_failsafe_through_sink() {
    let mut cycle = cycle_at(0);
    let mut sink = RecordingSink::default();
    let rc = Sticks::switches(1000, 1000);

    cycle.run(&rc, ms(500), &mut sink);
    assert_eq!(
        cycle.command_received(ms(520), &mut sink),
        Some(FailsafeEvent::Cleared)
    );
    assert_eq!(cycle.command_received(ms(540), &mut sink), None);

    assert_eq!(
        sink.published,
        vec![
            Published::Failsafe(FailsafeEvent::Asserted),
            Published::Failsafe(FailsafeEvent::Cleared),
        ]
    );
    assert!(!cycle.failsafe_active());
}

#[test]
fn dropped_frame_keeps_manual_override() {
    let mut cycle = cycle_at(0);
    let mut sink = RecordingSink::default();

    cycle.run(&Sticks::switches(1900, 1900), ms(20), &mut sink);
    let outcome = cycle.run(&Sticks::default(), ms(40), &mut sink);

    assert_eq!(outcome.transition, None);
    assert_eq!(cycle.authority(), ControlAuthority::ManualOverride);
    assert!(cycle.arbiter().selector_intent());
}

#[test]
fn timer_starts_at_construction() {
    let mut cycle = cycle_at(10_000);
    let mut sink = RecordingSink::default();
    let rc = Sticks::switches(1000, 1000);

    assert_eq!(cycle.run(&rc, ms(10_400), &mut sink).failsafe, None);
    assert_eq!(
        cycle.run(&rc, ms(10_401), &mut sink).failsafe,
        Some(FailsafeEvent::Asserted)
    );
    assert_eq!(cycle.liveness().timeout(), ms(400));
}

// ============================================================================
// Shared Authority
// ============================================================================

#[test]
fn shared_authority_starts_autonomous() {
    let shared = SharedAuthority::new();
    assert_eq!(shared.authority(), ControlAuthority::Autonomous);
    assert!(!shared.failsafe_active());
    assert_eq!(shared.transitions(), 0);
}

#[test]
fn shared_authority_tracks_the_cycle() {
    static SHARED: SharedAuthority = SharedAuthority::new();
    let mut sink = &SHARED;
    let mut cycle = cycle_at(0);

    cycle.run(&Sticks::switches(1900, 1900), ms(20), &mut sink);
    assert_eq!(SHARED.authority(), ControlAuthority::ManualOverride);

    cycle.run(&Sticks::switches(1000, 1900), ms(500), &mut sink);
    assert_eq!(SHARED.authority(), ControlAuthority::Autonomous);
    assert!(SHARED.failsafe_active());
    assert_eq!(SHARED.transitions(), 2);

    cycle.command_received(ms(510), &mut sink);
    assert!(!SHARED.failsafe_active());
}

#[test]
fn owned_shared_authority_is_a_sink() {
    let mut shared = SharedAuthority::new();
    let mut cycle = cycle_at(0);

    cycle.run(&Sticks::switches(1900, 1900), ms(20), &mut shared);
    assert_eq!(shared.authority(), ControlAuthority::ManualOverride);
    assert_eq!(shared.transitions(), 1);
}

// ============================================================================
// Through the HAL
// ============================================================================

#[test]
fn cycle_reads_hal_rc_input() {
    let board = MockBoard::new();
    let clock = board.clock();
    let mut ctx = MockContext::default();
    let mut hal = Hal::construct(board, ConfigSnapshot::from_build().unwrap())
        .init(&mut ctx)
        .unwrap();
    let mut cycle = ControlCycle::new(hal.config(), hal.scheduler().millis());
    let mut sink = RecordingSink::default();

    hal.rc_in_mut()
        .set_frame(&[1500, 1500, 1000, 1500, 1100, 1950, 1950, 1500]);
    assert!(hal.rc_in_mut().new_input());
    assert!(!hal.rc_in_mut().new_input());
    assert_eq!(hal.rc_in().num_channels(), 8);

    clock.set(20);
    let now = hal.scheduler().millis();
    let outcome = cycle.run(hal.rc_in(), now, &mut sink);
    assert_eq!(outcome.transition, Some(ControlAuthority::ManualOverride));

    let selector = RcChannel::new(6).unwrap();
    hal.rc_in_mut()
        .set_channel(selector, Some(PulseWidth::from_us(1200)));
    clock.set(40);
    let now = hal.scheduler().millis();
    let outcome = cycle.run(hal.rc_in(), now, &mut sink);
    assert_eq!(outcome.transition, Some(ControlAuthority::Autonomous));
    assert_eq!(
        sink.published,
        vec![
            Published::Authority(ControlAuthority::ManualOverride),
            Published::Authority(ControlAuthority::Autonomous),
        ]
    );
}

#[test]
fn silent_receiver_holds_then_low_switch_releases() {
    let board = MockBoard::new();
    let mut ctx = MockContext::default();
    let mut hal = Hal::construct(board, ConfigSnapshot::from_build().unwrap())
        .init(&mut ctx)
        .unwrap();
    let mut cycle = ControlCycle::new(hal.config(), ms(0));
    let mut sink = RecordingSink::default();

    hal.rc_in_mut()
        .set_frame(&[1500, 1500, 1000, 1500, 1100, 1900, 1900, 1500]);
    cycle.run(hal.rc_in(), ms(20), &mut sink);
    assert!(cycle.authority().is_manual());

    hal.rc_in_mut().silence();
    let selector = RcChannel::new(6).unwrap();
    assert_eq!(hal.rc_in().read(selector), None);
    let outcome = cycle.run(hal.rc_in(), ms(40), &mut sink);
    assert_eq!(outcome.transition, None);
    assert!(cycle.authority().is_manual());

    hal.rc_in_mut()
        .set_frame(&[1500, 1500, 1000, 1500, 1100, 1100, 1900, 1500]);
    let outcome = cycle.run(hal.rc_in(), ms(60), &mut sink);
    assert_eq!(outcome.transition, Some(ControlAuthority::Autonomous));
}
