//! Flymaple I2C and SPI
//!
//! I2C1 sits on PB8/PB9 (remapped), SPI1 on PA5/PA6/PA7 with a software
//! chip select on PA4.

use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::{I2C1, PA4, PA5, PA6, PA7, PB8, PB9, SPI1};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::Duration;

use crate::config::board;
use crate::hal::error::{BusError, BusResult, DriverError, DriverResult};
use crate::hal::interfaces::{Bringup, I2cBus, SpiDevice, SpiManager};
use crate::types::Millis;

use super::FlymapleContext;

/// 7-bit I2C address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Create from a 7-bit address (the R/W bit is masked off)
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

fn bus_error(error: i2c::Error) -> BusError {
    match error {
        i2c::Error::Timeout => BusError::Timeout,
        i2c::Error::Nack => BusError::Nack,
        i2c::Error::Arbitration => BusError::ArbitrationLost,
        _ => BusError::Bus,
    }
}

enum I2cState {
    Idle(I2C1, PB8, PB9),
    Started(I2C1, PB8, PB9),
    Running(I2c<'static, Blocking>),
    Failed,
}

/// I2C1 master
///
/// The embassy driver enforces the transaction timeout itself, and takes it
/// at construction, so the peripheral is configured by
/// [`I2cBus::set_timeout`] rather than by [`I2cBus::begin`].
pub struct FlymapleI2c {
    state: I2cState,
    timeout: Millis,
}

impl FlymapleI2c {
    /// Hold the bus unconfigured
    #[must_use]
    pub const fn new(i2c: I2C1, scl: PB8, sda: PB9) -> Self {
        Self {
            state: I2cState::Idle(i2c, scl, sda),
            timeout: Millis::ZERO,
        }
    }

    fn bus(&mut self) -> BusResult<&mut I2c<'static, Blocking>> {
        match &mut self.state {
            I2cState::Running(bus) => Ok(bus),
            _ => Err(BusError::NotStarted),
        }
    }
}

impl I2cBus for FlymapleI2c {
    fn begin(&mut self) -> DriverResult<()> {
        match core::mem::replace(&mut self.state, I2cState::Failed) {
            I2cState::Idle(i2c, scl, sda) => {
                self.state = I2cState::Started(i2c, scl, sda);
                Ok(())
            }
            other => {
                self.state = other;
                Err(DriverError::AlreadyInitialized)
            }
        }
    }

    fn set_timeout(&mut self, timeout: Millis) -> DriverResult<()> {
        if timeout == Millis::ZERO {
            return Err(DriverError::InvalidArgument);
        }
        let (i2c, scl, sda) = match core::mem::replace(&mut self.state, I2cState::Failed) {
            I2cState::Started(i2c, scl, sda) => (i2c, scl, sda),
            other => {
                let error = if matches!(other, I2cState::Running(_)) {
                    DriverError::AlreadyInitialized
                } else {
                    DriverError::NotInitialized
                };
                self.state = other;
                return Err(error);
            }
        };

        let mut config = i2c::Config::default();
        config.timeout = Duration::from_millis(u64::from(timeout.as_ms()));

        let bus = I2c::new_blocking(i2c, scl, sda, Hertz(board::I2C_FREQUENCY_HZ), config);
        self.state = I2cState::Running(bus);
        self.timeout = timeout;
        Ok(())
    }

    fn timeout(&self) -> Millis {
        self.timeout
    }

    fn write(&mut self, addr: u8, data: &[u8]) -> BusResult<()> {
        let addr = I2cAddress::new(addr);
        self.bus()?
            .blocking_write(addr.addr(), data)
            .map_err(bus_error)
    }

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> BusResult<()> {
        let addr = I2cAddress::new(addr);
        self.bus()?
            .blocking_read(addr.addr(), buffer)
            .map_err(bus_error)
    }

    fn write_read(&mut self, addr: u8, write: &[u8], read: &mut [u8]) -> BusResult<()> {
        let addr = I2cAddress::new(addr);
        self.bus()?
            .blocking_write_read(addr.addr(), write, read)
            .map_err(bus_error)
    }
}

enum SpiState {
    Idle(SPI1, PA5, PA7, PA6, PA4),
    Running {
        spi: Spi<'static, Blocking>,
        cs: Output<'static>,
    },
    Failed,
}

/// SPI1 device manager
pub struct FlymapleSpi {
    state: SpiState,
}

impl FlymapleSpi {
    /// Hold the bus unconfigured
    #[must_use]
    pub const fn new(spi: SPI1, sck: PA5, mosi: PA7, miso: PA6, cs: PA4) -> Self {
        Self {
            state: SpiState::Idle(spi, sck, mosi, miso, cs),
        }
    }
}

impl Bringup<FlymapleContext> for FlymapleSpi {
    fn init(&mut self, _ctx: &mut FlymapleContext) -> DriverResult<()> {
        let (peri, sck, mosi, miso, cs) = match core::mem::replace(&mut self.state, SpiState::Failed)
        {
            SpiState::Idle(peri, sck, mosi, miso, cs) => (peri, sck, mosi, miso, cs),
            other => {
                self.state = other;
                return Err(DriverError::AlreadyInitialized);
            }
        };

        let mut config = spi::Config::default();
        config.frequency = Hertz(board::SPI_FREQUENCY_HZ);

        self.state = SpiState::Running {
            spi: Spi::new_blocking(peri, sck, mosi, miso, config),
            cs: Output::new(cs, Level::High, Speed::Low),
        };
        Ok(())
    }
}

impl SpiManager for FlymapleSpi {
    fn transfer(&mut self, device: SpiDevice, tx: &[u8], rx: &mut [u8]) -> BusResult<()> {
        let SpiState::Running { spi, cs } = &mut self.state else {
            return Err(BusError::NotStarted);
        };
        match device {
            SpiDevice::External => cs.set_low(),
        }
        let result = if rx.is_empty() {
            spi.blocking_write(tx)
        } else if rx.len() == tx.len() {
            spi.blocking_transfer(rx, tx)
        } else {
            cs.set_high();
            return Err(BusError::Bus);
        };
        cs.set_high();
        result.map_err(|_| BusError::Bus)
    }
}
