//! Mock board for host testing
//!
//! Every driver records what was done to it into a shared [`InitLog`], so
//! tests can observe the bring-up order, the forwarded context, and the I2C
//! timeout. [`MockBoard::failing_at`] injects a bring-up failure at any step.
//!
//! # Example
//!
//! ```
//! use courier_firmware::config::ConfigSnapshot;
//! use courier_firmware::hal::mock::{MockBoard, MockContext};
//! use courier_firmware::hal::Hal;
//!
//! let board = MockBoard::new();
//! let log = board.log();
//! let config = ConfigSnapshot::from_build().unwrap();
//! let mut ctx = MockContext::default();
//! let hal = Hal::construct(board, config).init(&mut ctx).unwrap();
//! assert_eq!(log.steps().len(), 8);
//! # drop(hal);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::config::{board, ConfigSnapshot};
use crate::scheduler::{RateBand, TaskId};
use crate::types::{BaudRate, Millis, PulseWidth, RcChannel, RC_INPUT_CHANNELS, RC_OUTPUT_CHANNELS};

use super::bus::poll_until;
use super::console::SerialConsole;
use super::error::{BusError, BusResult, DriverError, DriverResult};
use super::interfaces::{
    AnalogIn, Bringup, Clock, Console, Gpio, I2cBus, PinMode, RcInput, RcOutput, Scheduler,
    SerialPort, SpiDevice, SpiManager, Storage, Util,
};
use super::mirror::{FlashMirror, FlashRegion};
use super::{Board, BringupStep, Drivers};

/// Something a mock driver observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    /// `init` was called on the driver for this step
    Init(BringupStep),
    /// `I2cBus::begin`
    I2cBegin,
    /// `I2cBus::set_timeout` with the given value
    I2cTimeout(Millis),
}

/// Event log shared by every driver of one board
#[derive(Debug, Clone, Default)]
pub struct InitLog(Rc<RefCell<Vec<MockEvent>>>);

impl InitLog {
    fn push(&self, event: MockEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Every recorded event, in order
    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        self.0.borrow().clone()
    }

    /// Bring-up steps that were attempted, in order
    ///
    /// I2C counts as attempted once `begin` is called.
    #[must_use]
    pub fn steps(&self) -> Vec<BringupStep> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                MockEvent::Init(step) => Some(*step),
                MockEvent::I2cBegin => Some(BringupStep::I2c),
                MockEvent::I2cTimeout(_) => None,
            })
            .collect()
    }
}

/// Board-specific bring-up context for the mock board
///
/// Each context-accepting driver appends its step, proving the composition
/// root forwarded the same context to it.
#[derive(Debug, Default)]
pub struct MockContext {
    /// Steps that received this context
    pub forwarded: Vec<BringupStep>,
}

/// Shared simulated millisecond clock
///
/// Clones observe the same time. With auto-advance set, every read moves
/// time forward, which lets a polling loop run into its deadline.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u32>>,
    auto_advance: Rc<Cell<u32>>,
}

impl MockClock {
    /// Clock at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    /// Move time forward
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    /// Advance by `ms` on every read
    pub fn set_auto_advance(&self, ms: u32) {
        self.auto_advance.set(ms);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Millis {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.auto_advance.get()));
        Millis::new(now)
    }
}

#[derive(Debug)]
struct Recorder {
    step: BringupStep,
    log: InitLog,
    fail: Option<DriverError>,
    initialized: bool,
}

impl Recorder {
    fn new(step: BringupStep, log: &InitLog, plan: Option<(BringupStep, DriverError)>) -> Self {
        Self {
            step,
            log: log.clone(),
            fail: plan.and_then(|(at, error)| (at == step).then_some(error)),
            initialized: false,
        }
    }

    fn record(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        if self.initialized {
            return Err(DriverError::AlreadyInitialized);
        }
        self.log.push(MockEvent::Init(self.step));
        ctx.forwarded.push(self.step);
        if let Some(error) = self.fail {
            return Err(error);
        }
        self.initialized = true;
        Ok(())
    }

    fn ensure_initialized(&self) -> DriverResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DriverError::NotInitialized)
        }
    }
}

// ============================================================================
// Serial
// ============================================================================

/// Mock UART
#[derive(Debug, Default)]
pub struct MockSerialPort {
    connected: bool,
    baud: Option<BaudRate>,
    tx: Vec<u8>,
    rx: VecDeque<u8>,
}

impl MockSerialPort {
    /// Port whose transport reports `connected`
    #[must_use]
    pub fn new(connected: bool) -> Self {
        Self {
            connected,
            ..Self::default()
        }
    }

    /// Rate passed to the last `begin`
    #[must_use]
    pub const fn baud(&self) -> Option<BaudRate> {
        self.baud
    }

    /// Bytes written so far
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Queue bytes for `read_byte`
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }

    /// Plug or unplug the transport
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl SerialPort for MockSerialPort {
    fn begin(&mut self, baud: BaudRate) -> DriverResult<()> {
        self.baud = Some(baud);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn write(&mut self, data: &[u8]) -> DriverResult<usize> {
        if self.baud.is_none() {
            return Err(DriverError::NotInitialized);
        }
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

/// Recording wrapper around the real [`SerialConsole`]
#[derive(Debug)]
pub struct MockConsole {
    inner: SerialConsole<MockSerialPort>,
    recorder: Recorder,
}

impl MockConsole {
    /// Underlying port
    #[must_use]
    pub const fn port(&self) -> &MockSerialPort {
        self.inner.port()
    }

    /// Text written to the console
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(self.inner.port().written()).into_owned()
    }
}

impl Bringup<MockContext> for MockConsole {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)?;
        self.inner.init(ctx)
    }
}

impl fmt::Write for MockConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(&mut self.inner, s)
    }
}

impl Console for MockConsole {
    fn active_baud(&self) -> Option<BaudRate> {
        self.inner.active_baud()
    }
}

// ============================================================================
// I2C / SPI
// ============================================================================

/// Recorded I2C transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// Write
    Write {
        /// 7-bit address
        addr: u8,
        /// Bytes written
        data: Vec<u8>,
    },
    /// Read
    Read {
        /// 7-bit address
        addr: u8,
        /// Bytes requested
        len: usize,
    },
    /// Write then read
    WriteRead {
        /// 7-bit address
        addr: u8,
        /// Bytes written
        write_data: Vec<u8>,
        /// Bytes requested
        read_len: usize,
    },
}

/// Mock I2C bus
///
/// Transactions complete immediately unless the bus is stalled, in which
/// case they poll until the configured timeout expires.
#[derive(Debug)]
pub struct MockI2c {
    log: InitLog,
    clock: MockClock,
    fail: Option<DriverError>,
    started: bool,
    timeout: Millis,
    stalled: bool,
    transactions: Vec<I2cTransaction>,
    read_data: VecDeque<u8>,
}

impl MockI2c {
    /// Simulate a device that holds the bus forever
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Queue bytes returned by reads
    pub fn set_read_data(&mut self, data: &[u8]) {
        self.read_data = data.iter().copied().collect();
    }

    /// Transactions attempted so far
    #[must_use]
    pub fn transactions(&self) -> &[I2cTransaction] {
        &self.transactions
    }

    fn transact(&mut self, transaction: I2cTransaction, buffer: &mut [u8]) -> BusResult<()> {
        if !self.started {
            return Err(BusError::NotStarted);
        }
        self.transactions.push(transaction);

        let stalled = self.stalled;
        poll_until(&self.clock, self.timeout, || (!stalled).then_some(Ok(())))?;

        for byte in buffer.iter_mut() {
            *byte = self.read_data.pop_front().unwrap_or(0xFF);
        }
        Ok(())
    }
}

impl I2cBus for MockI2c {
    fn begin(&mut self) -> DriverResult<()> {
        self.log.push(MockEvent::I2cBegin);
        if let Some(error) = self.fail {
            return Err(error);
        }
        self.started = true;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Millis) -> DriverResult<()> {
        self.log.push(MockEvent::I2cTimeout(timeout));
        if timeout == Millis::ZERO {
            return Err(DriverError::InvalidArgument);
        }
        self.timeout = timeout;
        Ok(())
    }

    fn timeout(&self) -> Millis {
        self.timeout
    }

    fn write(&mut self, addr: u8, data: &[u8]) -> BusResult<()> {
        let transaction = I2cTransaction::Write {
            addr,
            data: data.to_vec(),
        };
        self.transact(transaction, &mut [])
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> BusResult<()> {
        let transaction = I2cTransaction::Read {
            addr,
            len: buffer.len(),
        };
        self.transact(transaction, buffer)
    }

    fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> BusResult<()> {
        let transaction = I2cTransaction::WriteRead {
            addr,
            write_data: write.to_vec(),
            read_len: read.len(),
        };
        self.transact(transaction, read)
    }
}

/// Mock SPI manager (loopback: rx receives tx)
#[derive(Debug)]
pub struct MockSpi {
    recorder: Recorder,
    transfers: Vec<(SpiDevice, Vec<u8>)>,
}

impl MockSpi {
    /// Transfers performed so far
    #[must_use]
    pub fn transfers(&self) -> &[(SpiDevice, Vec<u8>)] {
        &self.transfers
    }
}

impl Bringup<MockContext> for MockSpi {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)
    }
}

impl SpiManager for MockSpi {
    fn transfer(&mut self, device: SpiDevice, tx: &[u8], rx: &mut [u8]) -> BusResult<()> {
        if self.recorder.ensure_initialized().is_err() {
            return Err(BusError::NotStarted);
        }
        self.transfers.push((device, tx.to_vec()));
        for (out, byte) in rx.iter_mut().zip(tx) {
            *out = *byte;
        }
        Ok(())
    }
}

// ============================================================================
// Analog / storage / GPIO
// ============================================================================

const ANALOG_PINS: usize = 16;

/// Mock ADC with settable readings
#[derive(Debug)]
pub struct MockAnalogIn {
    recorder: Recorder,
    values: [u16; ANALOG_PINS],
}

impl MockAnalogIn {
    /// Set the raw value a pin reads
    pub fn set(&mut self, pin: u8, raw: u16) {
        if let Some(value) = self.values.get_mut(usize::from(pin)) {
            *value = raw & 0x0FFF;
        }
    }
}

impl Bringup<MockContext> for MockAnalogIn {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)
    }
}

impl AnalogIn for MockAnalogIn {
    fn read_raw(&mut self, pin: u8) -> DriverResult<u16> {
        self.recorder.ensure_initialized()?;
        self.values
            .get(usize::from(pin))
            .copied()
            .ok_or(DriverError::InvalidArgument)
    }
}

/// RAM stand-in for a flash region, with injectable program failures
#[derive(Debug)]
pub struct MockFlash {
    stored: Vec<u8>,
    failures: u32,
    programs: u32,
}

impl MockFlash {
    /// Bytes currently held by the region
    #[must_use]
    pub fn stored(&self) -> &[u8] {
        &self.stored
    }

    /// Number of erase-and-program cycles attempted
    #[must_use]
    pub const fn programs(&self) -> u32 {
        self.programs
    }

    /// Fail the next `count` programs without storing anything
    pub fn fail_programs(&mut self, count: u32) {
        self.failures = count;
    }
}

impl FlashRegion for MockFlash {
    fn load(&mut self, image: &mut [u8]) -> DriverResult<()> {
        image.copy_from_slice(&self.stored);
        Ok(())
    }

    fn program(&mut self, image: &[u8]) -> DriverResult<()> {
        self.programs += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(DriverError::Hardware);
        }
        self.stored.copy_from_slice(image);
        Ok(())
    }
}

/// Flash-backed storage over a [`MockFlash`]
pub struct MockStorage {
    recorder: Recorder,
    mirror: FlashMirror<MockFlash, { board::STORAGE_SIZE }>,
}

impl MockStorage {
    /// The backing flash region
    #[must_use]
    pub const fn flash(&self) -> &MockFlash {
        self.mirror.region()
    }

    /// The backing flash region, mutably
    pub fn flash_mut(&mut self) -> &mut MockFlash {
        self.mirror.region_mut()
    }
}

impl fmt::Debug for MockStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStorage")
            .field("recorder", &self.recorder)
            .field("in_sync", &self.mirror.in_sync())
            .finish_non_exhaustive()
    }
}

impl Bringup<MockContext> for MockStorage {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)?;
        self.mirror.load()
    }
}

impl Storage for MockStorage {
    fn size(&self) -> usize {
        board::STORAGE_SIZE
    }

    fn read_block(&mut self, offset: usize, buffer: &mut [u8]) -> DriverResult<()> {
        self.recorder.ensure_initialized()?;
        self.mirror.read(offset, buffer)
    }

    fn write_block(&mut self, offset: usize, data: &[u8]) -> DriverResult<()> {
        self.recorder.ensure_initialized()?;
        self.mirror.write(offset, data)
    }
}

const GPIO_PINS: usize = 64;

/// Mock digital I/O
#[derive(Debug)]
pub struct MockGpio {
    modes: [Option<PinMode>; GPIO_PINS],
    levels: [bool; GPIO_PINS],
}

impl MockGpio {
    /// Drive an input pin from the outside
    pub fn set_input(&mut self, pin: u8, high: bool) {
        if let Some(level) = self.levels.get_mut(usize::from(pin)) {
            *level = high;
        }
    }

    /// Configured mode of a pin
    #[must_use]
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(usize::from(pin)).copied().flatten()
    }

    fn slot(pin: u8) -> DriverResult<usize> {
        let slot = usize::from(pin);
        if slot < GPIO_PINS {
            Ok(slot)
        } else {
            Err(DriverError::InvalidArgument)
        }
    }
}

impl Gpio for MockGpio {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> DriverResult<()> {
        let slot = Self::slot(pin)?;
        self.modes[slot] = Some(mode);
        if mode == PinMode::InputPullUp {
            self.levels[slot] = true;
        }
        Ok(())
    }

    fn read(&mut self, pin: u8) -> DriverResult<bool> {
        let slot = Self::slot(pin)?;
        if self.modes[slot].is_none() {
            return Err(DriverError::NotInitialized);
        }
        Ok(self.levels[slot])
    }

    fn write(&mut self, pin: u8, high: bool) -> DriverResult<()> {
        let slot = Self::slot(pin)?;
        if self.modes[slot] != Some(PinMode::Output) {
            return Err(DriverError::InvalidArgument);
        }
        self.levels[slot] = high;
        Ok(())
    }
}

// ============================================================================
// RC input / output
// ============================================================================

/// Mock receiver with settable channels
#[derive(Debug)]
pub struct MockRcInput {
    recorder: Recorder,
    channels: [Option<PulseWidth>; RC_INPUT_CHANNELS as usize],
    fresh: bool,
}

impl MockRcInput {
    /// Set or drop one channel and mark a new frame
    pub fn set_channel(&mut self, channel: RcChannel, pulse: Option<PulseWidth>) {
        self.channels[channel.index()] = pulse;
        self.fresh = true;
    }

    /// Replace the whole frame; channels past `pulses` are dropped
    pub fn set_frame(&mut self, pulses: &[u16]) {
        for (index, slot) in self.channels.iter_mut().enumerate() {
            *slot = pulses.get(index).map(|us| PulseWidth::from_us(*us));
        }
        self.fresh = true;
    }

    /// Receiver went quiet: every channel reads as missing
    pub fn silence(&mut self) {
        self.channels = [None; RC_INPUT_CHANNELS as usize];
    }
}

impl Bringup<MockContext> for MockRcInput {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)
    }
}

impl RcInput for MockRcInput {
    fn new_input(&mut self) -> bool {
        core::mem::replace(&mut self.fresh, false)
    }

    fn num_channels(&self) -> u8 {
        // at most RC_INPUT_CHANNELS
        self.channels.iter().take_while(|slot| slot.is_some()).count() as u8
    }

    fn read(&self, channel: RcChannel) -> Option<PulseWidth> {
        self.channels[channel.index()]
    }
}

/// Mock RC output
#[derive(Debug)]
pub struct MockRcOutput {
    recorder: Recorder,
    freq_hz: u32,
    enabled: [bool; RC_OUTPUT_CHANNELS as usize],
    pulses: [Option<PulseWidth>; RC_OUTPUT_CHANNELS as usize],
}

impl MockRcOutput {
    /// Current refresh rate
    #[must_use]
    pub const fn freq_hz(&self) -> u32 {
        self.freq_hz
    }

    /// Whether an output is being driven
    #[must_use]
    pub fn is_enabled(&self, channel: RcChannel) -> bool {
        self.enabled
            .get(channel.index())
            .copied()
            .unwrap_or(false)
    }

    fn slot(channel: RcChannel) -> DriverResult<usize> {
        let slot = channel.index();
        if slot < usize::from(RC_OUTPUT_CHANNELS) {
            Ok(slot)
        } else {
            Err(DriverError::InvalidArgument)
        }
    }
}

impl Bringup<MockContext> for MockRcOutput {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)
    }
}

impl RcOutput for MockRcOutput {
    fn set_freq_hz(&mut self, hz: u32) -> DriverResult<()> {
        if !(1..=490).contains(&hz) {
            return Err(DriverError::InvalidArgument);
        }
        self.freq_hz = hz;
        Ok(())
    }

    fn enable(&mut self, channel: RcChannel) -> DriverResult<()> {
        let slot = Self::slot(channel)?;
        self.enabled[slot] = true;
        Ok(())
    }

    fn disable(&mut self, channel: RcChannel) -> DriverResult<()> {
        let slot = Self::slot(channel)?;
        self.enabled[slot] = false;
        Ok(())
    }

    fn write(&mut self, channel: RcChannel, pulse: PulseWidth) -> DriverResult<()> {
        let slot = Self::slot(channel)?;
        self.pulses[slot] = Some(pulse);
        Ok(())
    }

    fn read(&self, channel: RcChannel) -> Option<PulseWidth> {
        self.pulses.get(channel.index()).copied().flatten()
    }
}

// ============================================================================
// Scheduler / util
// ============================================================================

/// Mock scheduler on a [`MockClock`]
#[derive(Debug)]
pub struct MockScheduler {
    recorder: Recorder,
    clock: MockClock,
    capacity: usize,
    tasks: Vec<(RateBand, TaskId)>,
}

impl MockScheduler {
    /// Registered periodic tasks, in registration order
    #[must_use]
    pub fn tasks(&self) -> &[(RateBand, TaskId)] {
        &self.tasks
    }
}

impl Bringup<MockContext> for MockScheduler {
    fn init(&mut self, ctx: &mut MockContext) -> DriverResult<()> {
        self.recorder.record(ctx)
    }
}

impl Scheduler for MockScheduler {
    fn millis(&self) -> Millis {
        self.clock.now()
    }

    fn micros(&self) -> u64 {
        u64::from(self.clock.now().as_ms()) * 1_000
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(ms);
    }

    fn register_periodic(&mut self, band: RateBand, task: TaskId) -> DriverResult<()> {
        self.recorder.ensure_initialized()?;
        if self.tasks.len() >= self.capacity {
            return Err(DriverError::InvalidArgument);
        }
        self.tasks.push((band, task));
        Ok(())
    }
}

/// Mock utilities
#[derive(Debug, Default)]
pub struct MockUtil {
    armed: bool,
}

impl Util for MockUtil {
    fn soft_armed(&self) -> bool {
        self.armed
    }

    fn set_soft_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    fn available_memory(&self) -> Option<u32> {
        None
    }
}

// ============================================================================
// Board
// ============================================================================

/// Host board made of recording mock drivers
#[derive(Debug, Clone)]
pub struct MockBoard {
    log: InitLog,
    clock: MockClock,
    connected: bool,
    fail: Option<(BringupStep, DriverError)>,
    task_capacity: usize,
}

impl MockBoard {
    /// All drivers healthy, primary transport connected
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: InitLog::default(),
            clock: MockClock::new(),
            connected: true,
            fail: None,
            task_capacity: 8,
        }
    }

    /// Make the driver for `step` fail its bring-up with `error`
    #[must_use]
    pub fn failing_at(mut self, step: BringupStep, error: DriverError) -> Self {
        self.fail = Some((step, error));
        self
    }

    /// Whether the console's primary transport is connected
    #[must_use]
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    /// Size of the scheduler's task table
    #[must_use]
    pub fn with_task_capacity(mut self, capacity: usize) -> Self {
        self.task_capacity = capacity;
        self
    }

    /// Shared event log
    #[must_use]
    pub fn log(&self) -> InitLog {
        self.log.clone()
    }

    /// Shared clock
    #[must_use]
    pub fn clock(&self) -> MockClock {
        self.clock.clone()
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for MockBoard {
    type Context = MockContext;
    type Console = MockConsole;
    type Uart = MockSerialPort;
    type I2c = MockI2c;
    type Spi = MockSpi;
    type AnalogIn = MockAnalogIn;
    type Storage = MockStorage;
    type Gpio = MockGpio;
    type RcIn = MockRcInput;
    type RcOut = MockRcOutput;
    type Scheduler = MockScheduler;
    type Util = MockUtil;

    fn construct(self, config: &ConfigSnapshot) -> Drivers<Self> {
        let log = &self.log;
        let plan = self.fail;
        let recorder = |step| Recorder::new(step, log, plan);

        Drivers {
            console: MockConsole {
                inner: SerialConsole::new(MockSerialPort::new(self.connected), config.serial()),
                recorder: recorder(BringupStep::Console),
            },
            uart_b: MockSerialPort::new(false),
            uart_c: MockSerialPort::new(false),
            i2c: MockI2c {
                log: log.clone(),
                clock: self.clock.clone(),
                fail: plan.and_then(|(at, error)| (at == BringupStep::I2c).then_some(error)),
                started: false,
                timeout: Millis::ZERO,
                stalled: false,
                transactions: Vec::new(),
                read_data: VecDeque::new(),
            },
            spi: MockSpi {
                recorder: recorder(BringupStep::Spi),
                transfers: Vec::new(),
            },
            analog_in: MockAnalogIn {
                recorder: recorder(BringupStep::AnalogInput),
                values: [0; ANALOG_PINS],
            },
            storage: MockStorage {
                recorder: recorder(BringupStep::Storage),
                mirror: FlashMirror::new(MockFlash {
                    stored: vec![0xFF; board::STORAGE_SIZE],
                    failures: 0,
                    programs: 0,
                }),
            },
            gpio: MockGpio {
                modes: [None; GPIO_PINS],
                levels: [false; GPIO_PINS],
            },
            rc_in: MockRcInput {
                recorder: recorder(BringupStep::RcInput),
                channels: [None; RC_INPUT_CHANNELS as usize],
                fresh: false,
            },
            rc_out: MockRcOutput {
                recorder: recorder(BringupStep::RcOutput),
                freq_hz: board::RC_OUTPUT_FREQUENCY_HZ,
                enabled: [false; RC_OUTPUT_CHANNELS as usize],
                pulses: [None; RC_OUTPUT_CHANNELS as usize],
            },
            scheduler: MockScheduler {
                recorder: recorder(BringupStep::Scheduler),
                clock: self.clock.clone(),
                capacity: self.task_capacity,
                tasks: Vec::new(),
            },
            util: MockUtil::default(),
        }
    }
}
