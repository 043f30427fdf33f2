//! Flymaple analog inputs
//!
//! ADC1 sampling PC0..PC3 (ADC channels 10..13), exposed as pins 0..3.

use embassy_stm32::adc::{Adc, AdcChannel, AnyAdcChannel};
use embassy_stm32::peripherals::{ADC1, PC0, PC1, PC2, PC3};

use crate::hal::error::{DriverError, DriverResult};
use crate::hal::interfaces::{AnalogIn, Bringup};

use super::FlymapleContext;

const PINS: usize = 4;

enum State {
    Idle(ADC1, [AnyAdcChannel<ADC1>; PINS]),
    Running(Adc<'static, ADC1>, [AnyAdcChannel<ADC1>; PINS]),
    Failed,
}

/// Blocking 12-bit ADC reader
pub struct FlymapleAnalogIn {
    state: State,
}

impl FlymapleAnalogIn {
    /// Hold the ADC unpowered
    #[must_use]
    pub fn new(adc: ADC1, pc0: PC0, pc1: PC1, pc2: PC2, pc3: PC3) -> Self {
        let pins = [
            pc0.degrade_adc(),
            pc1.degrade_adc(),
            pc2.degrade_adc(),
            pc3.degrade_adc(),
        ];
        Self {
            state: State::Idle(adc, pins),
        }
    }
}

impl Bringup<FlymapleContext> for FlymapleAnalogIn {
    fn init(&mut self, _ctx: &mut FlymapleContext) -> DriverResult<()> {
        let (adc, pins) = match core::mem::replace(&mut self.state, State::Failed) {
            State::Idle(adc, pins) => (adc, pins),
            other => {
                self.state = other;
                return Err(DriverError::AlreadyInitialized);
            }
        };
        self.state = State::Running(Adc::new(adc), pins);
        Ok(())
    }
}

impl AnalogIn for FlymapleAnalogIn {
    fn read_raw(&mut self, pin: u8) -> DriverResult<u16> {
        let State::Running(adc, pins) = &mut self.state else {
            return Err(DriverError::NotInitialized);
        };
        let channel = pins
            .get_mut(usize::from(pin))
            .ok_or(DriverError::InvalidArgument)?;
        Ok(embassy_futures::block_on(adc.read(channel)))
    }
}
