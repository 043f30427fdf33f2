//! Periodic task bands and extension hooks
//!
//! The task loop itself belongs to the board (an embassy ticker on the
//! target). This module defines the fixed rate bands it dispatches, the
//! core's own periodic work, and the optional user hook slots.

use crate::hal::{DriverResult, Scheduler};

/// Fixed dispatch rates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateBand {
    /// 100 Hz fast loop
    Fast,
    /// 50 Hz loop
    FiftyHz,
    /// 10 Hz medium loop
    Medium,
    /// 1 Hz super-slow loop
    SuperSlow,
}

impl RateBand {
    /// Every band, fastest first
    pub const ALL: [Self; 4] = [Self::Fast, Self::FiftyHz, Self::Medium, Self::SuperSlow];

    /// Rate of the base tick every band divides down from
    pub const BASE_HZ: u32 = 100;

    /// Dispatch rate in Hz
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Fast => 100,
            Self::FiftyHz => 50,
            Self::Medium => 10,
            Self::SuperSlow => 1,
        }
    }

    /// Dispatch period in milliseconds
    #[must_use]
    pub const fn period_ms(self) -> u32 {
        1_000 / self.hz()
    }

    /// Number of base ticks per dispatch
    #[must_use]
    pub const fn divisor(self) -> u32 {
        Self::BASE_HZ / self.hz()
    }

    /// Whether the band runs on base tick `tick` (tick 0 runs every band)
    #[must_use]
    pub const fn is_due(self, tick: u32) -> bool {
        tick % self.divisor() == 0
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RateBand {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}Hz", self.hz());
    }
}

/// Periodic work the core registers with the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// Liveness check plus manual-override arbitration
    ManualOverride,
    /// User extension hook bound to a band
    Hook(RateBand),
}

#[cfg(feature = "embedded")]
impl defmt::Format for TaskId {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ManualOverride => defmt::write!(f, "manual_override"),
            Self::Hook(band) => defmt::write!(f, "hook@{}", band),
        }
    }
}

/// The core's fixed periodic work
pub const TASK_TABLE: [(TaskId, RateBand); 1] = [(TaskId::ManualOverride, RateBand::FiftyHz)];

/// Extension hook signature
pub type Hook<C> = fn(&mut C);

/// User extension points: one run-once init slot and one slot per band
///
/// Unbound slots are no-ops.
pub struct ExtensionHooks<C> {
    init: Option<Hook<C>>,
    periodic: [Option<Hook<C>>; 4],
}

impl<C> ExtensionHooks<C> {
    /// No hooks bound
    #[must_use]
    pub const fn new() -> Self {
        Self {
            init: None,
            periodic: [None; 4],
        }
    }

    /// Bind the startup hook
    #[must_use]
    pub const fn with_init(mut self, hook: Hook<C>) -> Self {
        self.init = Some(hook);
        self
    }

    /// Bind a periodic hook
    #[must_use]
    pub const fn with(mut self, band: RateBand, hook: Hook<C>) -> Self {
        self.periodic[band.slot()] = Some(hook);
        self
    }

    /// Whether a periodic hook is bound to `band`
    #[must_use]
    pub const fn is_bound(&self, band: RateBand) -> bool {
        self.periodic[band.slot()].is_some()
    }

    /// Bands that have a hook bound
    pub fn bound_bands(&self) -> impl Iterator<Item = RateBand> + '_ {
        RateBand::ALL
            .into_iter()
            .filter(move |band| self.is_bound(*band))
    }

    /// Run the startup hook, if any
    pub fn run_init(&self, ctx: &mut C) {
        if let Some(hook) = self.init {
            hook(ctx);
        }
    }

    /// Run the hook bound to `band`, if any
    pub fn run(&self, band: RateBand, ctx: &mut C) {
        if let Some(hook) = self.periodic[band.slot()] {
            hook(ctx);
        }
    }
}

impl<C> Default for ExtensionHooks<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for ExtensionHooks<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ExtensionHooks<C> {}

impl<C> core::fmt::Debug for ExtensionHooks<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExtensionHooks")
            .field("init", &self.init.is_some())
            .field("fast", &self.is_bound(RateBand::Fast))
            .field("fifty_hz", &self.is_bound(RateBand::FiftyHz))
            .field("medium", &self.is_bound(RateBand::Medium))
            .field("super_slow", &self.is_bound(RateBand::SuperSlow))
            .finish()
    }
}

/// Register [`TASK_TABLE`] plus one [`TaskId::Hook`] per bound hook band
///
/// # Errors
///
/// Stops at and returns the first registration the scheduler rejects.
pub fn register_core_tasks<S, C>(scheduler: &mut S, hooks: &ExtensionHooks<C>) -> DriverResult<()>
where
    S: Scheduler + ?Sized,
{
    for (task, band) in TASK_TABLE {
        scheduler.register_periodic(band, task)?;
        log_debug!("registered {:?} at {}Hz", task, band.hz());
    }
    for band in hooks.bound_bands() {
        scheduler.register_periodic(band, TaskId::Hook(band))?;
        log_debug!("registered extension hook at {}Hz", band.hz());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divisors_match_rates() {
        assert_eq!(RateBand::Fast.divisor(), 1);
        assert_eq!(RateBand::FiftyHz.divisor(), 2);
        assert_eq!(RateBand::Medium.divisor(), 10);
        assert_eq!(RateBand::SuperSlow.divisor(), 100);
    }

    #[test]
    fn periods_match_rates() {
        assert_eq!(RateBand::Fast.period_ms(), 10);
        assert_eq!(RateBand::SuperSlow.period_ms(), 1_000);
    }
}
