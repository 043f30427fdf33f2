//! Flymaple digital I/O
//!
//! Pin numbers index [`FlymapleGpio::PINS`]: 0 is the status LED (PB12),
//! 1 the buzzer (PB13).

use embassy_stm32::gpio::{Flex, Pull, Speed};
use embassy_stm32::peripherals::{PB12, PB13};
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::hal::error::{DriverError, DriverResult};
use crate::hal::interfaces::{Gpio, PinMode};

/// GPIO bank over flexible pins
pub struct FlymapleGpio {
    pins: [Flex<'static>; 2],
    modes: [Option<PinMode>; 2],
}

impl FlymapleGpio {
    /// Status LED pin number
    pub const LED: u8 = 0;

    /// Buzzer pin number
    pub const BUZZER: u8 = 1;

    /// Wrap the pins (no mode is applied yet)
    #[must_use]
    pub fn new(led: PB12, buzzer: PB13) -> Self {
        Self {
            pins: [Flex::new(led), Flex::new(buzzer)],
            modes: [None; 2],
        }
    }

    fn slot(pin: u8) -> DriverResult<usize> {
        let slot = usize::from(pin);
        if slot < 2 {
            Ok(slot)
        } else {
            Err(DriverError::InvalidArgument)
        }
    }
}

impl Gpio for FlymapleGpio {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> DriverResult<()> {
        let slot = Self::slot(pin)?;
        let flex = &mut self.pins[slot];
        match mode {
            PinMode::Input => flex.set_as_input(Pull::None),
            PinMode::InputPullUp => flex.set_as_input(Pull::Up),
            PinMode::Output => flex.set_as_output(Speed::Low),
        }
        self.modes[slot] = Some(mode);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> DriverResult<bool> {
        let slot = Self::slot(pin)?;
        if self.modes[slot].is_none() {
            return Err(DriverError::NotInitialized);
        }
        InputPin::is_high(&mut self.pins[slot]).map_err(|_| DriverError::Hardware)
    }

    fn write(&mut self, pin: u8, high: bool) -> DriverResult<()> {
        let slot = Self::slot(pin)?;
        if self.modes[slot] != Some(PinMode::Output) {
            return Err(DriverError::InvalidArgument);
        }
        OutputPin::set_state(&mut self.pins[slot], PinState::from(high))
            .map_err(|_| DriverError::Hardware)
    }
}
