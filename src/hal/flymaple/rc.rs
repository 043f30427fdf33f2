//! Flymaple RC input and output
//!
//! Input: a PPM sum signal on PA0. A capture task timestamps every rising
//! edge and feeds the shared [`PpmDecoder`]. Output: TIM3 channels 1..4 on
//! PC6..PC9 (full remap) at the configured servo refresh rate.

use core::cell::RefCell;

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{OutputType, Pull};
use embassy_stm32::peripherals::{EXTI0, PA0, PC6, PC7, PC8, PC9, TIM3};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::Channel;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;

use crate::config::board;
use crate::hal::error::{DriverError, DriverResult};
use crate::hal::interfaces::{Bringup, RcInput, RcOutput};
use crate::hal::ppm::{PpmDecoder, PpmFrame};
use crate::types::{PulseWidth, RcChannel};

use super::FlymapleContext;

/// Decoder shared between the capture task and [`PpmRcInput`]
static PPM: Mutex<CriticalSectionRawMutex, RefCell<PpmDecoder>> =
    Mutex::new(RefCell::new(PpmDecoder::new()));

#[allow(unsafe_code)]
#[embassy_executor::task]
async fn ppm_capture(mut pin: ExtiInput<'static>) {
    loop {
        pin.wait_for_rising_edge().await;
        // The decoder works on a wrapping 32-bit microsecond counter
        let now_us = Instant::now().as_micros() as u32;
        PPM.lock(|decoder| decoder.borrow_mut().on_edge(now_us));
    }
}

/// PPM receiver input
pub struct PpmRcInput {
    pins: Option<(PA0, EXTI0)>,
    frame: Option<PpmFrame>,
}

impl PpmRcInput {
    /// Hold the capture pin until bring-up
    #[must_use]
    pub const fn new(pin: PA0, exti: EXTI0) -> Self {
        Self {
            pins: Some((pin, exti)),
            frame: None,
        }
    }
}

impl Bringup<FlymapleContext> for PpmRcInput {
    fn init(&mut self, ctx: &mut FlymapleContext) -> DriverResult<()> {
        let (pin, exti) = self.pins.take().ok_or(DriverError::AlreadyInitialized)?;
        let input = ExtiInput::new(pin, exti, Pull::Down);
        ctx.spawner
            .spawn(ppm_capture(input))
            .map_err(|_| DriverError::Hardware)
    }
}

impl RcInput for PpmRcInput {
    fn new_input(&mut self) -> bool {
        let now_us = Instant::now().as_micros() as u32;
        let (fresh, frame) = PPM.lock(|decoder| {
            let mut decoder = decoder.borrow_mut();
            (decoder.take_fresh(), decoder.current(now_us))
        });
        // A silent receiver reads as no sample at all
        self.frame = frame;
        fresh
    }

    fn num_channels(&self) -> u8 {
        self.frame.map_or(0, |frame| frame.count())
    }

    fn read(&self, channel: RcChannel) -> Option<PulseWidth> {
        self.frame.and_then(|frame| frame.get(channel))
    }
}

const OUTPUTS: usize = 4;
const CHANNELS: [Channel; OUTPUTS] = [Channel::Ch1, Channel::Ch2, Channel::Ch3, Channel::Ch4];

enum PwmState {
    Idle(TIM3, PC6, PC7, PC8, PC9),
    Running(SimplePwm<'static, TIM3>),
    Failed,
}

/// Four-channel servo/ESC output on TIM3
pub struct PwmRcOutput {
    state: PwmState,
    freq_hz: u32,
    pulses: [Option<PulseWidth>; OUTPUTS],
}

impl PwmRcOutput {
    /// Hold the timer and pins unconfigured
    #[must_use]
    pub const fn new(tim: TIM3, ch1: PC6, ch2: PC7, ch3: PC8, ch4: PC9) -> Self {
        Self {
            state: PwmState::Idle(tim, ch1, ch2, ch3, ch4),
            freq_hz: board::RC_OUTPUT_FREQUENCY_HZ,
            pulses: [None; OUTPUTS],
        }
    }

    fn pwm(&mut self) -> DriverResult<&mut SimplePwm<'static, TIM3>> {
        match &mut self.state {
            PwmState::Running(pwm) => Ok(pwm),
            _ => Err(DriverError::NotInitialized),
        }
    }

    fn channel(channel: RcChannel) -> DriverResult<usize> {
        let slot = channel.index();
        if slot < OUTPUTS {
            Ok(slot)
        } else {
            Err(DriverError::InvalidArgument)
        }
    }

    /// Duty count for a pulse at the current refresh rate
    fn duty(&mut self, pulse: PulseWidth) -> DriverResult<u16> {
        let period_us = 1_000_000 / self.freq_hz;
        let max = u32::from(self.pwm()?.max_duty_cycle());
        let duty = u32::from(pulse.as_us()) * max / period_us;
        Ok(u16::try_from(duty.min(max)).unwrap_or(u16::MAX))
    }
}

impl Bringup<FlymapleContext> for PwmRcOutput {
    fn init(&mut self, _ctx: &mut FlymapleContext) -> DriverResult<()> {
        let (tim, ch1, ch2, ch3, ch4) = match core::mem::replace(&mut self.state, PwmState::Failed)
        {
            PwmState::Idle(tim, ch1, ch2, ch3, ch4) => (tim, ch1, ch2, ch3, ch4),
            other => {
                self.state = other;
                return Err(DriverError::AlreadyInitialized);
            }
        };

        let pwm = SimplePwm::new(
            tim,
            Some(PwmPin::new_ch1(ch1, OutputType::PushPull)),
            Some(PwmPin::new_ch2(ch2, OutputType::PushPull)),
            Some(PwmPin::new_ch3(ch3, OutputType::PushPull)),
            Some(PwmPin::new_ch4(ch4, OutputType::PushPull)),
            Hertz(self.freq_hz),
            CountingMode::EdgeAlignedUp,
        );
        self.state = PwmState::Running(pwm);
        Ok(())
    }
}

impl RcOutput for PwmRcOutput {
    fn set_freq_hz(&mut self, hz: u32) -> DriverResult<()> {
        if !(1..=490).contains(&hz) {
            return Err(DriverError::InvalidArgument);
        }
        self.pwm()?.set_frequency(Hertz(hz));
        self.freq_hz = hz;

        // Duty counts scale with the period
        for slot in 0..OUTPUTS {
            if let Some(pulse) = self.pulses[slot] {
                let duty = self.duty(pulse)?;
                self.pwm()?.channel(CHANNELS[slot]).set_duty_cycle(duty);
            }
        }
        Ok(())
    }

    fn enable(&mut self, channel: RcChannel) -> DriverResult<()> {
        let slot = Self::channel(channel)?;
        self.pwm()?.channel(CHANNELS[slot]).enable();
        Ok(())
    }

    fn disable(&mut self, channel: RcChannel) -> DriverResult<()> {
        let slot = Self::channel(channel)?;
        self.pwm()?.channel(CHANNELS[slot]).disable();
        Ok(())
    }

    fn write(&mut self, channel: RcChannel, pulse: PulseWidth) -> DriverResult<()> {
        let slot = Self::channel(channel)?;
        let duty = self.duty(pulse)?;
        self.pwm()?.channel(CHANNELS[slot]).set_duty_cycle(duty);
        self.pulses[slot] = Some(pulse);
        Ok(())
    }

    fn read(&self, channel: RcChannel) -> Option<PulseWidth> {
        self.pulses.get(channel.index()).copied().flatten()
    }
}
