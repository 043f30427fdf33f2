//! Serial console
//!
//! The console owns the primary serial port. At bring-up it opens the port
//! at the primary baud rate when the transport is connected, and at the
//! fallback rate otherwise.

use core::fmt;

use crate::config::SerialConfig;
use crate::types::BaudRate;

use super::error::{DriverError, DriverResult};
use super::interfaces::{Bringup, Console, SerialPort};

/// Console over a [`SerialPort`]
#[derive(Debug)]
pub struct SerialConsole<U> {
    port: U,
    serial: SerialConfig,
    active: Option<BaudRate>,
}

impl<U: SerialPort> SerialConsole<U> {
    /// Wrap a port (no I/O until bring-up)
    #[must_use]
    pub const fn new(port: U, serial: SerialConfig) -> Self {
        Self {
            port,
            serial,
            active: None,
        }
    }

    /// Underlying port
    #[must_use]
    pub const fn port(&self) -> &U {
        &self.port
    }

    /// Underlying port (mutable)
    pub fn port_mut(&mut self) -> &mut U {
        &mut self.port
    }

    /// Rate the console would select right now
    #[must_use]
    pub fn select_baud(&self) -> BaudRate {
        if self.port.is_connected() {
            self.serial.primary_baud
        } else {
            self.serial.fallback_baud
        }
    }
}

impl<U: SerialPort, C> Bringup<C> for SerialConsole<U> {
    fn init(&mut self, _ctx: &mut C) -> DriverResult<()> {
        if self.active.is_some() {
            return Err(DriverError::AlreadyInitialized);
        }
        let baud = self.select_baud();
        self.port.begin(baud)?;
        self.active = Some(baud);
        Ok(())
    }
}

impl<U: SerialPort> fmt::Write for SerialConsole<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.active.is_none() {
            return Err(fmt::Error);
        }
        let mut remaining = s.as_bytes();
        while !remaining.is_empty() {
            match self.port.write(remaining) {
                Ok(0) | Err(_) => return Err(fmt::Error),
                Ok(n) => remaining = &remaining[n.min(remaining.len())..],
            }
        }
        Ok(())
    }
}

impl<U: SerialPort> Console for SerialConsole<U> {
    fn active_baud(&self) -> Option<BaudRate> {
        self.active
    }
}
