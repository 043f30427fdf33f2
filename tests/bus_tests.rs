//! Tests for bus plumbing
//!
//! Tests bounded polling, the I2C timeout as seen through the HAL, the
//! serial console, and the PPM sum-signal decoder.
//!
//! Run with: cargo test --no-default-features --features std --test bus_tests

use std::fmt::Write as _;

use courier_firmware::config::{ConfigSnapshot, SerialConfig};
use courier_firmware::hal::bus::{poll_until, Deadline};
use courier_firmware::hal::console::SerialConsole;
use courier_firmware::hal::mock::{
    I2cTransaction, MockBoard, MockClock, MockContext, MockSerialPort,
};
use courier_firmware::hal::ppm::{PpmDecoder, FRAME_STALE_US, MIN_FRAME_CHANNELS, SYNC_MIN_US};
use courier_firmware::hal::{
    Bringup, BusError, Clock, Console, DriverError, Hal, I2cBus, Ready, SerialPort,
};
use courier_firmware::types::{BaudRate, Millis, PulseWidth, RcChannel};

fn ready_hal(board: MockBoard) -> Hal<MockBoard, Ready> {
    let mut ctx = MockContext::default();
    Hal::construct(board, ConfigSnapshot::from_build().unwrap())
        .init(&mut ctx)
        .unwrap()
}

// ============================================================================
// Bounded Polling
// ============================================================================

#[test]
fn deadline_is_inclusive_of_budget() {
    let deadline = Deadline::new(Millis::new(500), Millis::new(100));
    assert!(!deadline.expired(Millis::new(600)));
    assert!(deadline.expired(Millis::new(601)));
    assert_eq!(deadline.remaining(Millis::new(550)), Millis::new(50));
}

#[test]
fn poll_returns_once_step_completes() {
    let clock = MockClock::new();
    clock.set_auto_advance(1);
    let mut polls = 0;

    let result = poll_until(&clock, Millis::new(100), || {
        polls += 1;
        (polls == 3).then_some(Ok(polls))
    });

    assert_eq!(result, Ok(3));
}

#[test]
fn poll_propagates_step_error() {
    let clock = MockClock::new();
    let result: Result<(), BusError> =
        poll_until(&clock, Millis::new(100), || Some(Err(BusError::Nack)));
    assert_eq!(result, Err(BusError::Nack));
}

#[test]
fn poll_times_out() {
    let clock = MockClock::new();
    clock.set(1_000);
    clock.set_auto_advance(5);

    let result: Result<(), BusError> = poll_until(&clock, Millis::new(50), || None);

    assert_eq!(result, Err(BusError::Timeout));
    let now = clock.now();
    assert!(now.since(Millis::new(1_000)) > Millis::new(50));
}

// ============================================================================
// I2C Through the HAL
// ============================================================================

#[test]
fn i2c_transactions_complete() {
    let mut hal = ready_hal(MockBoard::new());
    let i2c = hal.i2c_mut();

    i2c.write(0x68, &[0x6B, 0x00]).unwrap();
    i2c.set_read_data(&[0x68]);
    let mut who_am_i = [0u8; 2];
    i2c.write_read(0x68, &[0x75], &mut who_am_i).unwrap();

    assert_eq!(who_am_i, [0x68, 0xFF]);
    assert_eq!(
        i2c.transactions(),
        &[
            I2cTransaction::Write {
                addr: 0x68,
                data: vec![0x6B, 0x00],
            },
            I2cTransaction::WriteRead {
                addr: 0x68,
                write_data: vec![0x75],
                read_len: 2,
            },
        ]
    );
}

#[test]
fn stalled_i2c_times_out() {
    let board = MockBoard::new();
    let clock = board.clock();
    let mut hal = ready_hal(board);

    clock.set_auto_advance(1);
    hal.i2c_mut().set_stalled(true);
    let mut buffer = [0u8; 6];

    assert_eq!(hal.i2c_mut().read(0x1E, &mut buffer), Err(BusError::Timeout));
    assert!(clock.now() > Millis::new(100));
}

#[test]
fn i2c_recovers_after_stall() {
    let board = MockBoard::new();
    let clock = board.clock();
    let mut hal = ready_hal(board);
    clock.set_auto_advance(1);

    hal.i2c_mut().set_stalled(true);
    assert_eq!(hal.i2c_mut().write(0x77, &[0xD0]), Err(BusError::Timeout));
    hal.i2c_mut().set_stalled(false);
    assert_eq!(hal.i2c_mut().write(0x77, &[0xD0]), Ok(()));
}

#[test]
fn zero_i2c_timeout_is_rejected() {
    let mut hal = ready_hal(MockBoard::new());
    assert_eq!(
        hal.i2c_mut().set_timeout(Millis::ZERO),
        Err(DriverError::InvalidArgument)
    );
    assert_eq!(hal.i2c().timeout(), Millis::new(100));
}

#[test]
fn bus_errors_map_to_driver_errors() {
    assert_eq!(DriverError::from(BusError::NotStarted), DriverError::NotInitialized);
    assert_eq!(DriverError::from(BusError::Timeout), DriverError::Hardware);
    assert_eq!(BusError::Timeout.to_string(), "bus transaction timed out");
}

// ============================================================================
// Serial Console
// ============================================================================

fn serial(primary: u32, fallback: u32) -> SerialConfig {
    SerialConfig {
        primary_baud: BaudRate::new(primary).unwrap(),
        fallback_baud: BaudRate::new(fallback).unwrap(),
    }
}

#[test]
fn console_rejects_output_before_bringup() {
    let mut console = SerialConsole::new(MockSerialPort::new(true), serial(115_200, 57_600));
    assert!(write!(console, "early").is_err());
    assert_eq!(console.active_baud(), None);
}

#[test]
fn console_selects_baud_by_connection() {
    let mut console = SerialConsole::new(MockSerialPort::new(false), serial(115_200, 57_600));
    assert_eq!(console.select_baud().bps(), 57_600);

    console.port_mut().set_connected(true);
    assert_eq!(console.select_baud().bps(), 115_200);

    console.init(&mut ()).unwrap();
    assert_eq!(console.port().baud(), BaudRate::new(115_200));
}

#[test]
fn console_bringup_runs_once() {
    let mut console = SerialConsole::new(MockSerialPort::new(true), serial(115_200, 115_200));
    console.init(&mut ()).unwrap();
    assert_eq!(console.init(&mut ()), Err(DriverError::AlreadyInitialized));
}

#[test]
fn console_writes_to_port() {
    let mut console = SerialConsole::new(MockSerialPort::new(true), serial(115_200, 115_200));
    console.init(&mut ()).unwrap();

    write!(console, "alt={}m", 42).unwrap();
    assert_eq!(console.port().written(), b"alt=42m");
    assert!(console.port().is_connected());
}

// ============================================================================
// PPM Decoding
// ============================================================================

/// Feed a sync gap, then one edge per interval, then a closing sync gap
fn feed_frame(decoder: &mut PpmDecoder, start: u32, pulses: &[u32]) -> u32 {
    let mut t = start;
    decoder.on_edge(t);
    t = t.wrapping_add(SYNC_MIN_US + 1000);
    decoder.on_edge(t);
    for pulse in pulses {
        t = t.wrapping_add(*pulse);
        decoder.on_edge(t);
    }
    t = t.wrapping_add(SYNC_MIN_US + 1000);
    decoder.on_edge(t);
    t
}

#[test]
fn ppm_frame_carries_channels() {
    let mut decoder = PpmDecoder::new();
    feed_frame(
        &mut decoder,
        0,
        &[1500, 1500, 1000, 1500, 1200, 1900, 1950, 1500],
    );

    let frame = decoder.latest().unwrap();
    assert_eq!(frame.count(), 8);
    assert_eq!(
        frame.get(RcChannel::new(6).unwrap()),
        Some(PulseWidth::from_us(1900))
    );
    assert_eq!(
        frame.get(RcChannel::new(7).unwrap()),
        Some(PulseWidth::from_us(1950))
    );
}

#[test]
fn ppm_minimum_frame() {
    let mut decoder = PpmDecoder::new();
    let pulses = vec![1500u32; usize::from(MIN_FRAME_CHANNELS)];
    feed_frame(&mut decoder, 0, &pulses);

    let frame = decoder.latest().unwrap();
    assert_eq!(frame.count(), MIN_FRAME_CHANNELS);
    assert_eq!(frame.get(RcChannel::new(5).unwrap()), None);
}

#[test]
fn ppm_consecutive_frames_replace_latest() {
    let mut decoder = PpmDecoder::new();
    let mut edge = feed_frame(&mut decoder, 0, &[1000, 1000, 1000, 1000]);
    assert!(decoder.take_fresh());
    assert!(!decoder.take_fresh());

    for _ in 0..4 {
        edge += 2000;
        assert!(!decoder.on_edge(edge));
    }
    assert!(decoder.on_edge(edge + SYNC_MIN_US));
    assert!(decoder.take_fresh());

    let ch1 = RcChannel::new(1).unwrap();
    assert_eq!(
        decoder.latest().unwrap().get(ch1),
        Some(PulseWidth::from_us(2000))
    );
}

#[test]
fn ppm_out_of_range_pulse_drops_frame() {
    let mut decoder = PpmDecoder::new();
    feed_frame(&mut decoder, 0, &[1500, 1500, 2400, 1500, 1500]);
    assert!(decoder.latest().is_none());
    assert!(!decoder.take_fresh());
}

#[test]
fn ppm_silent_receiver_serves_no_sample() {
    let mut decoder = PpmDecoder::new();
    let end = feed_frame(
        &mut decoder,
        0,
        &[1500, 1500, 1000, 1500, 1200, 1900, 1900, 1500],
    );
    let ch6 = RcChannel::new(6).unwrap();

    let frame = decoder.current(end + 20_000).unwrap();
    assert_eq!(frame.get(ch6), Some(PulseWidth::from_us(1900)));

    assert!(decoder.current(end + FRAME_STALE_US + 1).is_none());
}

#[test]
fn ppm_staleness_spans_timer_wrap() {
    let mut decoder = PpmDecoder::new();
    let end = feed_frame(&mut decoder, u32::MAX - 10_000, &[1500; 4]);

    assert!(decoder.current(end.wrapping_add(FRAME_STALE_US)).is_some());
    assert!(decoder.current(end.wrapping_add(FRAME_STALE_US + 1)).is_none());
}

#[test]
fn ppm_new_frame_after_silence_is_current() {
    let mut decoder = PpmDecoder::new();
    let end = feed_frame(&mut decoder, 0, &[1500; 4]);
    let resumed = end + 500_000;
    assert!(decoder.current(resumed).is_none());

    let end = feed_frame(&mut decoder, resumed, &[1100; 4]);
    let ch1 = RcChannel::new(1).unwrap();
    assert_eq!(
        decoder.current(end).unwrap().get(ch1),
        Some(PulseWidth::from_us(1100))
    );
}
