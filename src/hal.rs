//! Hardware Abstraction Layer
//!
//! Composition root for the board's capability drivers. A [`Board`] names
//! one concrete driver per capability and builds them without touching the
//! hardware; [`Hal`] owns the result and brings the drivers up in a fixed
//! order.
//!
//! ```text
//! Hal::construct(board, config)   -> Hal<B, Constructed>   (no I/O)
//!     .init(&mut ctx)             -> Hal<B, Ready>         (ordered bring-up)
//! ```
//!
//! Bring-up order, each step after everything it may depend on:
//!
//! 1. Scheduler
//! 2. Console (UART A)
//! 3. RC input
//! 4. RC output
//! 5. SPI manager
//! 6. I2C, followed by the per-transaction timeout
//! 7. Analog input
//! 8. Storage

use core::marker::PhantomData;

use crate::config::ConfigSnapshot;

pub mod bus;
pub mod console;
pub mod error;
pub mod interfaces;
pub mod mirror;
pub mod ppm;

/// Recording mock board for host tests
#[cfg(all(feature = "std", not(feature = "embedded")))]
pub mod mock;

/// Flymaple (STM32F103RE) board support
#[cfg(feature = "embedded")]
pub mod flymaple;

pub use error::{BringupError, BusError, BusResult, DriverError, DriverResult};
pub use interfaces::{
    AnalogIn, Bringup, Clock, Console, Gpio, I2cBus, PinMode, RcInput, RcOutput, Scheduler,
    SerialPort, SpiDevice, SpiManager, Storage, Util,
};

/// One step of the bring-up sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BringupStep {
    /// Timing and periodic-task registration
    Scheduler,
    /// Diagnostic console on the primary UART
    Console,
    /// RC receiver input
    RcInput,
    /// RC (servo/ESC) output
    RcOutput,
    /// SPI device manager
    Spi,
    /// I2C bus plus its transaction timeout
    I2c,
    /// Analog input sampler
    AnalogInput,
    /// Non-volatile storage
    Storage,
}

impl BringupStep {
    /// The bring-up sequence, in execution order
    pub const ORDER: [Self; 8] = [
        Self::Scheduler,
        Self::Console,
        Self::RcInput,
        Self::RcOutput,
        Self::Spi,
        Self::I2c,
        Self::AnalogInput,
        Self::Storage,
    ];

    /// Short name for logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scheduler => "scheduler",
            Self::Console => "console",
            Self::RcInput => "rc_in",
            Self::RcOutput => "rc_out",
            Self::Spi => "spi",
            Self::I2c => "i2c",
            Self::AnalogInput => "analog_in",
            Self::Storage => "storage",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BringupStep {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Board support: the concrete driver behind every capability
///
/// Exactly one board is compiled into an image: the Flymaple on the
/// target, the recording mock board in host tests.
pub trait Board: Sized {
    /// Opaque context forwarded to every driver's bring-up
    type Context;

    /// Diagnostic console (owns UART A)
    type Console: interfaces::Console + Bringup<Self::Context>;
    /// Secondary UARTs (B and C)
    type Uart: interfaces::SerialPort;
    /// I2C bus master
    type I2c: interfaces::I2cBus;
    /// SPI device manager
    type Spi: interfaces::SpiManager + Bringup<Self::Context>;
    /// Analog input sampler
    type AnalogIn: interfaces::AnalogIn + Bringup<Self::Context>;
    /// Non-volatile storage
    type Storage: interfaces::Storage + Bringup<Self::Context>;
    /// Digital I/O
    type Gpio: interfaces::Gpio;
    /// RC receiver input
    type RcIn: interfaces::RcInput + Bringup<Self::Context>;
    /// RC output
    type RcOut: interfaces::RcOutput + Bringup<Self::Context>;
    /// Scheduler
    type Scheduler: interfaces::Scheduler + Bringup<Self::Context>;
    /// Miscellaneous utilities
    type Util: interfaces::Util;

    /// Build every driver from the board's peripherals
    ///
    /// Must not perform I/O; the configuration is read here only to
    /// parameterize drivers (e.g. console baud rates).
    fn construct(self, config: &ConfigSnapshot) -> Drivers<Self>;
}

/// One driver per capability, as produced by [`Board::construct`]
pub struct Drivers<B: Board> {
    /// Console on UART A
    pub console: B::Console,
    /// UART B
    pub uart_b: B::Uart,
    /// UART C
    pub uart_c: B::Uart,
    /// I2C bus
    pub i2c: B::I2c,
    /// SPI manager
    pub spi: B::Spi,
    /// Analog input
    pub analog_in: B::AnalogIn,
    /// Storage
    pub storage: B::Storage,
    /// Digital I/O
    pub gpio: B::Gpio,
    /// RC input
    pub rc_in: B::RcIn,
    /// RC output
    pub rc_out: B::RcOut,
    /// Scheduler
    pub scheduler: B::Scheduler,
    /// Utilities
    pub util: B::Util,
}

/// Typestate: drivers built, hardware untouched
#[derive(Debug)]
pub struct Constructed;

/// Typestate: bring-up completed
#[derive(Debug)]
pub struct Ready;

/// The process-wide hardware abstraction instance
///
/// Owns every capability driver and the configuration snapshot for the
/// life of the program. Capability accessors only exist once the HAL is
/// [`Ready`]; [`Hal::init`] consumes the constructed HAL, so bring-up
/// cannot run twice.
pub struct Hal<B: Board, S = Ready> {
    drivers: Drivers<B>,
    config: ConfigSnapshot,
    _state: PhantomData<S>,
}

impl<B: Board, S> Hal<B, S> {
    /// Configuration snapshot the HAL was built with
    #[must_use]
    pub const fn config(&self) -> &ConfigSnapshot {
        &self.config
    }
}

impl<B: Board> Hal<B, Constructed> {
    /// Build every driver without touching the hardware
    #[must_use]
    pub fn construct(board: B, config: ConfigSnapshot) -> Self {
        let drivers = board.construct(&config);
        log_debug!("hal constructed");
        Self {
            drivers,
            config,
            _state: PhantomData,
        }
    }

    /// Bring every driver up, in [`BringupStep::ORDER`]
    ///
    /// `ctx` is handed to each driver untouched. The first failing step
    /// aborts the sequence; later steps are never attempted.
    ///
    /// # Errors
    ///
    /// Returns the failing step and its driver error. Boot cannot continue.
    pub fn init(mut self, ctx: &mut B::Context) -> Result<Hal<B, Ready>, BringupError> {
        for step in BringupStep::ORDER {
            log_info!("bring-up: {}", step.name());
            if let Err(cause) = self.run_step(step, ctx) {
                log_error!("bring-up of {} failed: {}", step.name(), cause);
                return Err(BringupError { step, cause });
            }
        }
        log_info!("bring-up complete");

        Ok(Hal {
            drivers: self.drivers,
            config: self.config,
            _state: PhantomData,
        })
    }

    fn run_step(&mut self, step: BringupStep, ctx: &mut B::Context) -> DriverResult<()> {
        let drivers = &mut self.drivers;
        match step {
            BringupStep::Scheduler => drivers.scheduler.init(ctx),
            BringupStep::Console => drivers.console.init(ctx),
            BringupStep::RcInput => drivers.rc_in.init(ctx),
            BringupStep::RcOutput => drivers.rc_out.init(ctx),
            BringupStep::Spi => drivers.spi.init(ctx),
            BringupStep::I2c => {
                drivers.i2c.begin()?;
                drivers.i2c.set_timeout(self.config.i2c_timeout())
            }
            BringupStep::AnalogInput => drivers.analog_in.init(ctx),
            BringupStep::Storage => drivers.storage.init(ctx),
        }
    }
}

impl<B: Board> Hal<B, Ready> {
    /// Console
    #[must_use]
    pub const fn console(&self) -> &B::Console {
        &self.drivers.console
    }

    /// Console (mutable)
    pub fn console_mut(&mut self) -> &mut B::Console {
        &mut self.drivers.console
    }

    /// UART B
    #[must_use]
    pub const fn uart_b(&self) -> &B::Uart {
        &self.drivers.uart_b
    }

    /// UART B (mutable)
    pub fn uart_b_mut(&mut self) -> &mut B::Uart {
        &mut self.drivers.uart_b
    }

    /// UART C
    #[must_use]
    pub const fn uart_c(&self) -> &B::Uart {
        &self.drivers.uart_c
    }

    /// UART C (mutable)
    pub fn uart_c_mut(&mut self) -> &mut B::Uart {
        &mut self.drivers.uart_c
    }

    /// I2C bus
    #[must_use]
    pub const fn i2c(&self) -> &B::I2c {
        &self.drivers.i2c
    }

    /// I2C bus (mutable)
    pub fn i2c_mut(&mut self) -> &mut B::I2c {
        &mut self.drivers.i2c
    }

    /// SPI manager
    #[must_use]
    pub const fn spi(&self) -> &B::Spi {
        &self.drivers.spi
    }

    /// SPI manager (mutable)
    pub fn spi_mut(&mut self) -> &mut B::Spi {
        &mut self.drivers.spi
    }

    /// Analog input
    #[must_use]
    pub const fn analog_in(&self) -> &B::AnalogIn {
        &self.drivers.analog_in
    }

    /// Analog input (mutable)
    pub fn analog_in_mut(&mut self) -> &mut B::AnalogIn {
        &mut self.drivers.analog_in
    }

    /// Storage
    #[must_use]
    pub const fn storage(&self) -> &B::Storage {
        &self.drivers.storage
    }

    /// Storage (mutable)
    pub fn storage_mut(&mut self) -> &mut B::Storage {
        &mut self.drivers.storage
    }

    /// Digital I/O
    #[must_use]
    pub const fn gpio(&self) -> &B::Gpio {
        &self.drivers.gpio
    }

    /// Digital I/O (mutable)
    pub fn gpio_mut(&mut self) -> &mut B::Gpio {
        &mut self.drivers.gpio
    }

    /// RC input
    #[must_use]
    pub const fn rc_in(&self) -> &B::RcIn {
        &self.drivers.rc_in
    }

    /// RC input (mutable)
    pub fn rc_in_mut(&mut self) -> &mut B::RcIn {
        &mut self.drivers.rc_in
    }

    /// RC output
    #[must_use]
    pub const fn rc_out(&self) -> &B::RcOut {
        &self.drivers.rc_out
    }

    /// RC output (mutable)
    pub fn rc_out_mut(&mut self) -> &mut B::RcOut {
        &mut self.drivers.rc_out
    }

    /// Scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &B::Scheduler {
        &self.drivers.scheduler
    }

    /// Scheduler (mutable)
    pub fn scheduler_mut(&mut self) -> &mut B::Scheduler {
        &mut self.drivers.scheduler
    }

    /// Utilities
    #[must_use]
    pub const fn util(&self) -> &B::Util {
        &self.drivers.util
    }

    /// Utilities (mutable)
    pub fn util_mut(&mut self) -> &mut B::Util {
        &mut self.drivers.util
    }

    /// Register the core's periodic work and one task per bound hook
    ///
    /// # Errors
    ///
    /// Returns the scheduler's error if its task table is full.
    pub fn register_tasks<C>(
        &mut self,
        hooks: &crate::scheduler::ExtensionHooks<C>,
    ) -> DriverResult<()> {
        crate::scheduler::register_core_tasks(&mut self.drivers.scheduler, hooks)
    }
}
