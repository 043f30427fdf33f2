//! HAL error types
//!
//! Every board maps its peripheral-specific errors onto these variants.

use core::fmt;

use super::BringupStep;

/// Result type for driver operations
pub type DriverResult<T> = core::result::Result<T, DriverError>;

/// Result type for bus transactions
pub type BusResult<T> = core::result::Result<T, BusError>;

/// Driver-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Operation needs a driver that has not been brought up
    NotInitialized,
    /// Bring-up was attempted on a driver that is already running
    AlreadyInitialized,
    /// The peripheral reported a fault
    Hardware,
    /// Argument outside what the driver supports
    InvalidArgument,
    /// Capability not provided by this board
    Unsupported,
}

/// Bus transaction errors
///
/// Recoverable at the caller's discretion; the core never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The per-transaction timeout expired
    Timeout,
    /// Device did not acknowledge
    Nack,
    /// Another master won arbitration
    ArbitrationLost,
    /// Any other bus fault
    Bus,
    /// Transaction attempted before the bus was started
    NotStarted,
}

/// Fatal bring-up failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupError {
    /// Step that failed; no later step was attempted
    pub step: BringupStep,
    /// Driver error reported by the step
    pub cause: DriverError,
}

impl From<BusError> for DriverError {
    fn from(error: BusError) -> Self {
        match error {
            BusError::NotStarted => Self::NotInitialized,
            BusError::Timeout | BusError::Nack | BusError::ArbitrationLost | BusError::Bus => {
                Self::Hardware
            }
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "driver not initialized"),
            Self::AlreadyInitialized => write!(f, "driver already initialized"),
            Self::Hardware => write!(f, "hardware fault"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::Unsupported => write!(f, "unsupported on this board"),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "bus transaction timed out"),
            Self::Nack => write!(f, "device did not acknowledge"),
            Self::ArbitrationLost => write!(f, "bus arbitration lost"),
            Self::Bus => write!(f, "bus error"),
            Self::NotStarted => write!(f, "bus not started"),
        }
    }
}

impl fmt::Display for BringupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bring-up of {} failed: {}", self.step.name(), self.cause)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DriverError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotInitialized => defmt::write!(f, "NotInitialized"),
            Self::AlreadyInitialized => defmt::write!(f, "AlreadyInitialized"),
            Self::Hardware => defmt::write!(f, "Hardware"),
            Self::InvalidArgument => defmt::write!(f, "InvalidArgument"),
            Self::Unsupported => defmt::write!(f, "Unsupported"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BusError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Timeout => defmt::write!(f, "Timeout"),
            Self::Nack => defmt::write!(f, "Nack"),
            Self::ArbitrationLost => defmt::write!(f, "ArbitrationLost"),
            Self::Bus => defmt::write!(f, "Bus"),
            Self::NotStarted => defmt::write!(f, "NotStarted"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BringupError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}: {}", self.step.name(), self.cause);
    }
}
