//! Embassy-backed scheduler
//!
//! Timing comes from the embassy time driver. Periodic work is only
//! recorded here; `main` owns the ticker that dispatches it.

use embassy_time::{block_for, Duration, Instant};
use heapless::Vec;

use crate::hal::error::{DriverError, DriverResult};
use crate::hal::interfaces::{Bringup, Scheduler};
use crate::scheduler::{RateBand, TaskId};
use crate::types::Millis;

use super::FlymapleContext;

/// Maximum number of registered periodic tasks
pub const MAX_TASKS: usize = 8;

/// Scheduler on the embassy time driver
pub struct EmbassyScheduler {
    started: Option<Instant>,
    tasks: Vec<(RateBand, TaskId), MAX_TASKS>,
}

impl EmbassyScheduler {
    /// Not yet started
    #[must_use]
    pub const fn new() -> Self {
        Self {
            started: None,
            tasks: Vec::new(),
        }
    }

    /// Registered periodic tasks, in registration order
    #[must_use]
    pub fn tasks(&self) -> &[(RateBand, TaskId)] {
        &self.tasks
    }

    /// Tasks due on base tick `tick`
    pub fn due(&self, tick: u32) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks
            .iter()
            .filter(move |(band, _)| band.is_due(tick))
            .map(|(_, task)| *task)
    }
}

impl Default for EmbassyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Bringup<FlymapleContext> for EmbassyScheduler {
    fn init(&mut self, _ctx: &mut FlymapleContext) -> DriverResult<()> {
        if self.started.is_some() {
            return Err(DriverError::AlreadyInitialized);
        }
        self.started = Some(Instant::now());
        Ok(())
    }
}

impl Scheduler for EmbassyScheduler {
    fn millis(&self) -> Millis {
        // Free-running 32-bit millisecond counter
        Millis::new(Instant::now().as_millis() as u32)
    }

    fn micros(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }

    fn register_periodic(&mut self, band: RateBand, task: TaskId) -> DriverResult<()> {
        if self.started.is_none() {
            return Err(DriverError::NotInitialized);
        }
        self.tasks
            .push((band, task))
            .map_err(|_| DriverError::InvalidArgument)
    }
}
