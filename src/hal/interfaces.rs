//! Capability interfaces
//!
//! Each trait is one hardware capability the composition root hands out.
//! Boards provide the concrete implementations; the core only ever talks to
//! these traits.

use crate::scheduler::{RateBand, TaskId};
use crate::types::{BaudRate, Millis, PulseWidth, RcChannel};

use super::error::{BusResult, DriverResult};

/// One-time bring-up with an opaque, board-specific context
///
/// The composition root forwards `ctx` untouched; only the board knows what
/// it contains (an interrupt registry, a clock tree handle, or nothing).
pub trait Bringup<C> {
    /// Bring the driver up
    ///
    /// # Errors
    ///
    /// Any error is fatal to boot.
    fn init(&mut self, ctx: &mut C) -> DriverResult<()>;
}

/// Byte-oriented serial port
pub trait SerialPort {
    /// Open the port at the given rate
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` if the rate cannot be generated.
    fn begin(&mut self, baud: BaudRate) -> DriverResult<()>;

    /// Whether the transport behind the port is present (e.g. USB cable attached)
    fn is_connected(&self) -> bool;

    /// Write bytes, returning how many were accepted
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotInitialized` before [`SerialPort::begin`].
    fn write(&mut self, data: &[u8]) -> DriverResult<usize>;

    /// Read one byte if available
    fn read_byte(&mut self) -> Option<u8>;
}

/// Diagnostic console
pub trait Console: core::fmt::Write {
    /// Baud rate the console settled on during bring-up
    fn active_baud(&self) -> Option<BaudRate>;
}

/// I2C bus master
///
/// Started with [`I2cBus::begin`] rather than [`Bringup`]; every transaction
/// is bounded by the timeout set through [`I2cBus::set_timeout`].
pub trait I2cBus {
    /// Start the bus peripheral
    ///
    /// # Errors
    ///
    /// Returns a driver error if the peripheral cannot be configured.
    fn begin(&mut self) -> DriverResult<()>;

    /// Bound every later transaction by `timeout`
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for a zero timeout.
    fn set_timeout(&mut self, timeout: Millis) -> DriverResult<()>;

    /// Currently applied per-transaction timeout
    fn timeout(&self) -> Millis;

    /// Write bytes to a 7-bit address
    ///
    /// # Errors
    ///
    /// Returns `BusError::Timeout` when the transaction exceeds the timeout.
    fn write(&mut self, addr: u8, data: &[u8]) -> BusResult<()>;

    /// Read bytes from a 7-bit address
    ///
    /// # Errors
    ///
    /// Returns `BusError::Timeout` when the transaction exceeds the timeout.
    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> BusResult<()>;

    /// Write then read with a repeated start
    ///
    /// # Errors
    ///
    /// Returns `BusError::Timeout` when the transaction exceeds the timeout.
    fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> BusResult<()>;
}

/// Devices attached to the SPI manager
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpiDevice {
    /// External device on the expansion header
    External,
}

/// SPI device manager
pub trait SpiManager {
    /// Full-duplex transfer with chip select asserted for `device`
    ///
    /// # Errors
    ///
    /// Returns a [`BusError`](super::error::BusError) on bus fault or timeout.
    fn transfer(&mut self, device: SpiDevice, tx: &[u8], rx: &mut [u8]) -> BusResult<()>;
}

/// Analog input sampler
pub trait AnalogIn {
    /// Sample a pin, returning the raw 12-bit conversion
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for a pin without an ADC channel.
    fn read_raw(&mut self, pin: u8) -> DriverResult<u16>;
}

/// Non-volatile storage
pub trait Storage {
    /// Usable size in bytes
    fn size(&self) -> usize;

    /// Read `buffer.len()` bytes starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` if the range exceeds [`Storage::size`].
    fn read_block(&mut self, offset: usize, buffer: &mut [u8]) -> DriverResult<()>;

    /// Write `data` starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` if the range exceeds [`Storage::size`].
    fn write_block(&mut self, offset: usize, data: &[u8]) -> DriverResult<()>;
}

/// Pin direction for digital I/O
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Floating input
    Input,
    /// Input with pull-up
    InputPullUp,
    /// Push-pull output
    Output,
}

/// Digital I/O
pub trait Gpio {
    /// Configure a pin
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an unknown pin.
    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> DriverResult<()>;

    /// Read a pin level
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an unknown pin.
    fn read(&mut self, pin: u8) -> DriverResult<bool>;

    /// Drive a pin level
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an unknown pin.
    fn write(&mut self, pin: u8, high: bool) -> DriverResult<()>;
}

/// RC receiver input
pub trait RcInput {
    /// Refresh the sample; true if a new frame arrived since the last call
    fn new_input(&mut self) -> bool;

    /// Number of channels in the current frame
    fn num_channels(&self) -> u8;

    /// Current pulse width for a channel
    ///
    /// None if the frame did not carry it or the receiver has gone silent.
    fn read(&self, channel: RcChannel) -> Option<PulseWidth>;
}

/// RC (servo/ESC) output
///
/// Outputs are numbered from 1, like receiver channels.
pub trait RcOutput {
    /// Set the refresh rate of all outputs
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an unsupported rate.
    fn set_freq_hz(&mut self, hz: u32) -> DriverResult<()>;

    /// Start driving an output
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an output the board lacks.
    fn enable(&mut self, channel: RcChannel) -> DriverResult<()>;

    /// Stop driving an output
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an output the board lacks.
    fn disable(&mut self, channel: RcChannel) -> DriverResult<()>;

    /// Set an output pulse width
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` for an output the board lacks.
    fn write(&mut self, channel: RcChannel, pulse: PulseWidth) -> DriverResult<()>;

    /// Last pulse width written to an output
    fn read(&self, channel: RcChannel) -> Option<PulseWidth>;
}

/// Timing primitives and periodic-task registration
pub trait Scheduler {
    /// Milliseconds since boot
    fn millis(&self) -> Millis;

    /// Microseconds since boot
    fn micros(&self) -> u64;

    /// Busy-wait
    fn delay_ms(&mut self, ms: u32);

    /// Ask the task loop to dispatch `task` at `band`
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidArgument` if the task table is full.
    fn register_periodic(&mut self, band: RateBand, task: TaskId) -> DriverResult<()>;
}

/// Monotonic millisecond clock
///
/// Blanket-implemented for every [`Scheduler`]; bus drivers take this
/// narrower view for their timeouts.
pub trait Clock {
    /// Milliseconds since boot
    fn now(&self) -> Millis;
}

impl<S: Scheduler> Clock for S {
    fn now(&self) -> Millis {
        self.millis()
    }
}

/// Miscellaneous board utilities
pub trait Util {
    /// Whether the vehicle is soft-armed
    fn soft_armed(&self) -> bool;

    /// Set the soft-armed flag
    fn set_soft_armed(&mut self, armed: bool);

    /// Free RAM in bytes, if the board can tell
    fn available_memory(&self) -> Option<u32>;
}
