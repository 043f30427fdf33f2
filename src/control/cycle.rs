//! One control cycle
//!
//! Runs at 50 Hz from the scheduler: liveness first, then the arbiter,
//! publishing every edge through an [`AuthoritySink`].

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::config::{ConfigSnapshot, ManualOverrideConfig};
use crate::hal::RcInput;
use crate::types::{ControlAuthority, FailsafeEvent, Millis};

use super::arbiter::{ManualOverrideArbiter, OverrideSample};
use super::liveness::LivenessMonitor;

/// Receiver of control-authority and failsafe edges
pub trait AuthoritySink {
    /// The arbiter changed authority
    fn publish_authority(&mut self, authority: ControlAuthority);

    /// The failsafe condition changed
    fn publish_failsafe(&mut self, event: FailsafeEvent);
}

/// What one cycle changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Failsafe edge raised by the liveness check
    pub failsafe: Option<FailsafeEvent>,
    /// New authority, if the arbiter transitioned
    pub transition: Option<ControlAuthority>,
}

/// Liveness monitor plus arbiter, bound to the configured channels
#[derive(Clone, Copy, Debug)]
pub struct ControlCycle {
    config: ManualOverrideConfig,
    arbiter: ManualOverrideArbiter,
    liveness: LivenessMonitor,
}

impl ControlCycle {
    /// Build from the configuration snapshot, starting the liveness timer at `now`
    #[must_use]
    pub fn new(config: &ConfigSnapshot, now: Millis) -> Self {
        let manual = config.manual_override();
        Self {
            config: manual,
            arbiter: ManualOverrideArbiter::new(&manual),
            liveness: LivenessMonitor::new(config.autopilot_input_timeout(), now),
        }
    }

    /// Current authority
    #[must_use]
    pub const fn authority(&self) -> ControlAuthority {
        self.arbiter.authority()
    }

    /// Check if the autopilot-input failsafe is active
    #[must_use]
    pub const fn failsafe_active(&self) -> bool {
        self.liveness.is_lost()
    }

    /// Arbiter state
    #[must_use]
    pub const fn arbiter(&self) -> &ManualOverrideArbiter {
        &self.arbiter
    }

    /// Liveness state
    #[must_use]
    pub const fn liveness(&self) -> &LivenessMonitor {
        &self.liveness
    }

    /// Read the selector and thrust-enable channels
    pub fn sample<R: RcInput + ?Sized>(&self, rc: &R) -> OverrideSample {
        OverrideSample {
            selector: rc.read(self.config.selector_channel),
            thrust_enable: rc.read(self.config.thrust_enable_channel),
        }
    }

    /// Record a valid autonomous command, publishing the failsafe clear if any
    pub fn command_received<K: AuthoritySink + ?Sized>(
        &mut self,
        now: Millis,
        sink: &mut K,
    ) -> Option<FailsafeEvent> {
        let event = self.liveness.command_received(now);
        if let Some(event) = event {
            sink.publish_failsafe(event);
        }
        event
    }

    /// Run one cycle against the current RC input
    pub fn run<R, K>(&mut self, rc: &R, now: Millis, sink: &mut K) -> CycleOutcome
    where
        R: RcInput + ?Sized,
        K: AuthoritySink + ?Sized,
    {
        let failsafe = self.liveness.check(now);
        if let Some(event) = failsafe {
            sink.publish_failsafe(event);
        }

        let transition = self.arbiter.evaluate(self.sample(rc));
        if let Some(authority) = transition {
            sink.publish_authority(authority);
        }

        CycleOutcome {
            failsafe,
            transition,
        }
    }
}

/// Lock-free authority state shared with the flight-control logic
///
/// Suitable for a `static`: the control cycle publishes into it and any
/// other task polls it.
#[derive(Debug, Default)]
pub struct SharedAuthority {
    authority: AtomicU8,
    failsafe: AtomicBool,
    transitions: AtomicU32,
}

const AUTONOMOUS: u8 = 0;
const MANUAL: u8 = 1;

impl SharedAuthority {
    /// Autonomous, no failsafe, no transitions
    #[must_use]
    pub const fn new() -> Self {
        Self {
            authority: AtomicU8::new(AUTONOMOUS),
            failsafe: AtomicBool::new(false),
            transitions: AtomicU32::new(0),
        }
    }

    /// Latest published authority
    #[must_use]
    pub fn authority(&self) -> ControlAuthority {
        match self.authority.load(Ordering::Acquire) {
            MANUAL => ControlAuthority::ManualOverride,
            _ => ControlAuthority::Autonomous,
        }
    }

    /// Check if the autopilot-input failsafe is active
    #[must_use]
    pub fn failsafe_active(&self) -> bool {
        self.failsafe.load(Ordering::Acquire)
    }

    /// Number of authority transitions published
    #[must_use]
    pub fn transitions(&self) -> u32 {
        self.transitions.load(Ordering::Relaxed)
    }

    fn store_authority(&self, authority: ControlAuthority) {
        let raw = match authority {
            ControlAuthority::Autonomous => AUTONOMOUS,
            ControlAuthority::ManualOverride => MANUAL,
        };
        self.authority.store(raw, Ordering::Release);
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    fn store_failsafe(&self, event: FailsafeEvent) {
        self.failsafe
            .store(event == FailsafeEvent::Asserted, Ordering::Release);
    }
}

impl AuthoritySink for SharedAuthority {
    fn publish_authority(&mut self, authority: ControlAuthority) {
        self.store_authority(authority);
    }

    fn publish_failsafe(&mut self, event: FailsafeEvent) {
        self.store_failsafe(event);
    }
}

impl AuthoritySink for &SharedAuthority {
    fn publish_authority(&mut self, authority: ControlAuthority) {
        self.store_authority(authority);
    }

    fn publish_failsafe(&mut self, event: FailsafeEvent) {
        self.store_failsafe(event);
    }
}
