//! Courier Flight Controller Firmware Library
//!
//! Bring-up and runtime-mode layer for an autopilot running on the
//! Flymaple (STM32F103RE) flight-control board. The library owns two things:
//! wiring the board's hardware drivers into one HAL instance, and deciding
//! whether the autopilot or the pilot's manual switches govern thrust/yaw.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FLIGHT CONTROL (external)                   │
//! │        reads ControlAuthority + failsafe each cycle          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     CONTROL AUTHORITY                        │
//! │  Liveness monitor  │  Manual-override arbiter  │  Hooks      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  HAL COMPOSITION ROOT                        │
//! │  Sched │ Console │ RC in/out │ SPI │ I2C │ ADC │ Storage     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 BOARD (Flymaple / mock)                      │
//! │           embassy-stm32 drivers, embassy executor            │
//! └─────────────────────────────────────────────────────────────┘
//!          ▲
//!          └── ConfigSnapshot, resolved once before bring-up
//! ```
//!
//! # Design Principles
//!
//! - **Resolve, then build**: configuration is validated before any driver
//!   exists; a bad option never reaches the hardware
//! - **Typestate bring-up**: only a `Hal<_, Ready>` hands out drivers
//! - **No unsafe in application code**: peripheral access goes through embassy
//! - **Functional core, imperative shell**: arbiter, liveness and PPM
//!   decoding are pure and host-tested
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

#[macro_use]
mod logging;

/// Shared types used across modules
pub mod types;

/// Build options, board constants and the configuration resolver
pub mod config;

/// Hardware Abstraction Layer
///
/// Capability traits, the composition root, and the board implementations.
pub mod hal;

/// Rate bands, core periodic tasks and extension hooks
pub mod scheduler;

/// Control Authority
///
/// Manual-override arbitration and autopilot liveness.
pub mod control;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::{ConfigError, ConfigSnapshot, ManualOverrideConfig, SerialConfig};
    pub use crate::control::{AuthoritySink, ControlCycle, SharedAuthority};
    pub use crate::hal::{
        AnalogIn, Board, BringupError, Console, DriverError, Gpio, Hal, I2cBus, RcInput,
        RcOutput, Scheduler, SerialPort, SpiManager, Storage, Util,
    };
    pub use crate::scheduler::{ExtensionHooks, RateBand, TaskId};
    pub use crate::types::*;

    // Error handling
    pub use core::result::Result;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
