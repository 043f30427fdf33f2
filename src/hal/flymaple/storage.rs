//! Flymaple parameter storage
//!
//! The last two 2 KiB pages of internal flash, kept in a [`FlashMirror`].

use embassy_stm32::flash::Flash;
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::FLASH;

use crate::config::board::{STORAGE_FLASH_OFFSET, STORAGE_SIZE};
use crate::hal::error::{DriverError, DriverResult};
use crate::hal::interfaces::{Bringup, Storage};
use crate::hal::mirror::{FlashMirror, FlashRegion};

use super::FlymapleContext;

/// The storage pages of internal flash
pub struct StoragePages(Flash<'static, Blocking>);

impl FlashRegion for StoragePages {
    fn load(&mut self, image: &mut [u8]) -> DriverResult<()> {
        self.0
            .blocking_read(STORAGE_FLASH_OFFSET, image)
            .map_err(|_| DriverError::Hardware)
    }

    fn program(&mut self, image: &[u8]) -> DriverResult<()> {
        // STORAGE_SIZE is a whole number of pages
        let end = STORAGE_FLASH_OFFSET + STORAGE_SIZE as u32;
        self.0
            .blocking_erase(STORAGE_FLASH_OFFSET, end)
            .map_err(|_| DriverError::Hardware)?;
        self.0
            .blocking_write(STORAGE_FLASH_OFFSET, image)
            .map_err(|_| DriverError::Hardware)
    }
}

enum State {
    Idle(FLASH),
    Running(FlashMirror<StoragePages, STORAGE_SIZE>),
    Failed,
}

/// Flash-backed storage
pub struct FlymapleStorage {
    state: State,
}

impl FlymapleStorage {
    /// Hold the flash controller untouched
    #[must_use]
    pub const fn new(flash: FLASH) -> Self {
        Self {
            state: State::Idle(flash),
        }
    }

    fn mirror(&mut self) -> DriverResult<&mut FlashMirror<StoragePages, STORAGE_SIZE>> {
        match &mut self.state {
            State::Running(mirror) => Ok(mirror),
            _ => Err(DriverError::NotInitialized),
        }
    }
}

impl Bringup<FlymapleContext> for FlymapleStorage {
    fn init(&mut self, _ctx: &mut FlymapleContext) -> DriverResult<()> {
        let flash = match core::mem::replace(&mut self.state, State::Failed) {
            State::Idle(flash) => flash,
            other => {
                self.state = other;
                return Err(DriverError::AlreadyInitialized);
            }
        };
        let mut mirror = FlashMirror::new(StoragePages(Flash::new_blocking(flash)));
        mirror.load()?;
        self.state = State::Running(mirror);
        Ok(())
    }
}

impl Storage for FlymapleStorage {
    fn size(&self) -> usize {
        STORAGE_SIZE
    }

    fn read_block(&mut self, offset: usize, buffer: &mut [u8]) -> DriverResult<()> {
        self.mirror()?.read(offset, buffer)
    }

    fn write_block(&mut self, offset: usize, data: &[u8]) -> DriverResult<()> {
        self.mirror()?.write(offset, data)
    }
}
