//! Flymaple board support
//!
//! STM32F103RE at 72 MHz. Pin assignments are listed in
//! [`config::pins`](crate::config::pins). Every driver holds its peripheral
//! tokens untouched until bring-up configures it.

pub mod analog;
pub mod bus;
pub mod gpio;
pub mod rc;
pub mod scheduler;
pub mod serial;
pub mod storage;

use embassy_executor::Spawner;
use embassy_stm32::Peripherals;

use crate::config::ConfigSnapshot;

use super::console::SerialConsole;
use super::interfaces::Util;
use super::{Board, Drivers};

pub use analog::FlymapleAnalogIn;
pub use bus::{FlymapleI2c, FlymapleSpi};
pub use gpio::FlymapleGpio;
pub use rc::{PpmRcInput, PwmRcOutput};
pub use scheduler::EmbassyScheduler;
pub use serial::{FlymapleUart, UartPins};
pub use storage::FlymapleStorage;

/// Bring-up context: drivers that need a background task spawn it here
pub struct FlymapleContext {
    /// Executor handle
    pub spawner: Spawner,
}

impl FlymapleContext {
    /// Wrap the executor handle
    #[must_use]
    pub const fn new(spawner: Spawner) -> Self {
        Self { spawner }
    }
}

/// Soft-arm flag (no free-memory probe on this board)
#[derive(Debug, Default)]
pub struct FlymapleUtil {
    armed: bool,
}

impl Util for FlymapleUtil {
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

/// The Flymaple, owning every peripheral singleton
pub struct FlymapleBoard {
    p: Peripherals,
}

impl FlymapleBoard {
    /// Take ownership of the peripherals returned by `embassy_stm32::init`
    #[must_use]
    pub const fn new(p: Peripherals) -> Self {
        Self { p }
    }
}

impl Board for FlymapleBoard {
    type Context = FlymapleContext;
    type Console = SerialConsole<FlymapleUart>;
    type Uart = FlymapleUart;
    type I2c = FlymapleI2c;
    type Spi = FlymapleSpi;
    type AnalogIn = FlymapleAnalogIn;
    type Storage = FlymapleStorage;
    type Gpio = FlymapleGpio;
    type RcIn = PpmRcInput;
    type RcOut = PwmRcOutput;
    type Scheduler = EmbassyScheduler;
    type Util = FlymapleUtil;

    fn construct(self, config: &ConfigSnapshot) -> Drivers<Self> {
        let p = self.p;
        Drivers {
            console: SerialConsole::new(
                FlymapleUart::new(UartPins::A(p.USART1, p.PA9, p.PA10)),
                config.serial(),
            ),
            uart_b: FlymapleUart::new(UartPins::B(p.USART2, p.PA2, p.PA3)),
            uart_c: FlymapleUart::new(UartPins::C(p.USART3, p.PB10, p.PB11)),
            i2c: FlymapleI2c::new(p.I2C1, p.PB8, p.PB9),
            spi: FlymapleSpi::new(p.SPI1, p.PA5, p.PA7, p.PA6, p.PA4),
            analog_in: FlymapleAnalogIn::new(p.ADC1, p.PC0, p.PC1, p.PC2, p.PC3),
            storage: FlymapleStorage::new(p.FLASH),
            gpio: FlymapleGpio::new(p.PB12, p.PB13),
            rc_in: PpmRcInput::new(p.PA0, p.EXTI0),
            rc_out: PwmRcOutput::new(p.TIM3, p.PC6, p.PC7, p.PC8, p.PC9),
            scheduler: EmbassyScheduler::new(),
            util: FlymapleUtil::default(),
        }
    }
}
