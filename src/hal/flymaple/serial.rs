//! Flymaple UARTs
//!
//! Each port keeps its peripheral tokens until `begin`, when the baud rate
//! is known and the USART is configured.

use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::{PA10, PA2, PA3, PA9, PB10, PB11, USART1, USART2, USART3};
use embassy_stm32::usart::{self, Uart, UartRx, UartTx};

use crate::hal::error::{DriverError, DriverResult};
use crate::hal::interfaces::SerialPort;
use crate::types::BaudRate;

/// Unopened USART plus its pins
pub enum UartPins {
    /// UART A: USART1 on PA9 (TX) / PA10 (RX)
    A(USART1, PA9, PA10),
    /// UART B: USART2 on PA2 (TX) / PA3 (RX)
    B(USART2, PA2, PA3),
    /// UART C: USART3 on PB10 (TX) / PB11 (RX)
    C(USART3, PB10, PB11),
}

impl UartPins {
    fn open(self, config: usart::Config) -> Result<Uart<'static, Blocking>, usart::ConfigError> {
        match self {
            Self::A(usart, tx, rx) => Uart::new_blocking(usart, rx, tx, config),
            Self::B(usart, tx, rx) => Uart::new_blocking(usart, rx, tx, config),
            Self::C(usart, tx, rx) => Uart::new_blocking(usart, rx, tx, config),
        }
    }
}

enum State {
    Closed(UartPins),
    Open {
        tx: UartTx<'static, Blocking>,
        rx: UartRx<'static, Blocking>,
    },
    Failed,
}

/// Blocking UART
///
/// Hardware UARTs have no presence detect, so the port always reports a
/// connected transport.
pub struct FlymapleUart {
    state: State,
    baud: Option<BaudRate>,
}

impl FlymapleUart {
    /// Hold the port closed until [`SerialPort::begin`]
    #[must_use]
    pub const fn new(pins: UartPins) -> Self {
        Self {
            state: State::Closed(pins),
            baud: None,
        }
    }

    /// Rate the port was opened at
    #[must_use]
    pub const fn baud(&self) -> Option<BaudRate> {
        self.baud
    }
}

impl SerialPort for FlymapleUart {
    fn begin(&mut self, baud: BaudRate) -> DriverResult<()> {
        let pins = match core::mem::replace(&mut self.state, State::Failed) {
            State::Closed(pins) => pins,
            other => {
                self.state = other;
                return Err(DriverError::AlreadyInitialized);
            }
        };

        let mut config = usart::Config::default();
        config.baudrate = baud.bps();

        let uart = pins.open(config).map_err(|_| DriverError::InvalidArgument)?;
        let (tx, rx) = uart.split();
        self.state = State::Open { tx, rx };
        self.baud = Some(baud);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn write(&mut self, data: &[u8]) -> DriverResult<usize> {
        let State::Open { tx, .. } = &mut self.state else {
            return Err(DriverError::NotInitialized);
        };
        tx.blocking_write(data).map_err(|_| DriverError::Hardware)?;
        Ok(data.len())
    }

    fn read_byte(&mut self) -> Option<u8> {
        match &mut self.state {
            State::Open { rx, .. } => rx.nb_read().ok(),
            State::Closed(_) | State::Failed => None,
        }
    }
}
