//! Courier Flight Controller Main Application
//!
//! Entry point for the Flymaple (STM32F103RE) firmware.
//! Resolves the build configuration, brings the HAL up, then runs the
//! fixed-rate task loop.

#![no_std]
#![no_main]

use core::fmt::Write as _;

use defmt::info;
use embassy_executor::Spawner;
use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllMul, PllPreDiv, PllSource, Sysclk,
};
use embassy_stm32::time::Hertz;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use courier_firmware::config::board;
use courier_firmware::hal::flymaple::scheduler::MAX_TASKS;
use courier_firmware::hal::flymaple::{FlymapleBoard, FlymapleContext, FlymapleGpio};
use courier_firmware::hal::{PinMode, Ready};
use courier_firmware::prelude::*;

type FlymapleHal = Hal<FlymapleBoard, Ready>;

static HAL: StaticCell<FlymapleHal> = StaticCell::new();

/// Authority state read by the flight-control logic
static AUTHORITY: SharedAuthority = SharedAuthority::new();

const HOOKS: ExtensionHooks<FlymapleHal> = ExtensionHooks::new()
    .with_init(setup)
    .with(RateBand::SuperSlow, heartbeat);

fn rcc_config() -> embassy_stm32::Config {
    // 8 MHz crystal, PLL x9 -> 72 MHz
    let mut config = embassy_stm32::Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(8_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll = Some(Pll {
        src: PllSource::HSE,
        prediv: PllPreDiv::DIV1,
        mul: PllMul::MUL9,
    });
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV1;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Courier flight controller v{}", env!("CARGO_PKG_VERSION"));

    let config = match ConfigSnapshot::from_build() {
        Ok(config) => config,
        Err(error) => defmt::panic!("build configuration rejected: {}", error),
    };

    let p = embassy_stm32::init(rcc_config());
    info!("Clocks at {} Hz", board::SYSTEM_CLOCK_HZ);

    let mut ctx = FlymapleContext::new(spawner);
    let hal = match Hal::construct(FlymapleBoard::new(p), config).init(&mut ctx) {
        Ok(hal) => hal,
        Err(error) => defmt::panic!("{}", error),
    };
    let hal = HAL.init(hal);

    // Telemetry link on UART C; any traffic on it counts as autopilot input
    let telemetry_baud = hal.config().serial().telemetry_baud();
    if let Err(error) = hal.uart_c_mut().begin(telemetry_baud) {
        defmt::warn!("telemetry UART unavailable: {}", error);
    }

    if let Err(error) = hal.register_tasks(&HOOKS) {
        defmt::panic!("task registration failed: {}", error);
    }
    HOOKS.run_init(hal);
    writeln!(hal.console_mut(), "courier-fc ready").ok();

    let mut cycle = ControlCycle::new(hal.config(), hal.scheduler().millis());
    let mut authority = &AUTHORITY;
    let mut ticker = Ticker::every(Duration::from_hz(u64::from(RateBand::BASE_HZ)));
    let mut tick: u32 = 0;

    info!("Entering {} Hz task loop", RateBand::BASE_HZ);

    loop {
        ticker.next().await;

        let mut command = false;
        while hal.uart_c_mut().read_byte().is_some() {
            command = true;
        }
        if command {
            let now = hal.scheduler().millis();
            cycle.command_received(now, &mut authority);
        }

        let due: heapless::Vec<TaskId, MAX_TASKS> = hal.scheduler().due(tick).collect();
        for task in due {
            match task {
                TaskId::ManualOverride => {
                    hal.rc_in_mut().new_input();
                    let now = hal.scheduler().millis();
                    cycle.run(hal.rc_in(), now, &mut authority);
                }
                TaskId::Hook(band) => HOOKS.run(band, hal),
            }
        }

        // Every band divides the slowest period evenly
        tick = (tick + 1) % RateBand::SuperSlow.divisor();
    }
}

/// Startup hook: status LED as output
fn setup(hal: &mut FlymapleHal) {
    if let Err(error) = hal.gpio_mut().pin_mode(FlymapleGpio::LED, PinMode::Output) {
        defmt::warn!("status LED unavailable: {}", error);
    }
}

/// 1 Hz hook: blink the status LED and report the authority state
fn heartbeat(hal: &mut FlymapleHal) {
    let gpio = hal.gpio_mut();
    if let Ok(level) = gpio.read(FlymapleGpio::LED) {
        gpio.write(FlymapleGpio::LED, !level).ok();
    }
    info!(
        "authority={} failsafe={} transitions={}",
        AUTHORITY.authority(),
        AUTHORITY.failsafe_active(),
        AUTHORITY.transitions()
    );
}
