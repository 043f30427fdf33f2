//! Manual-Override Arbiter
//!
//! Two RC switches gate manual control: a selector and a thrust-enable.
//! Each switch is read through a [`HysteresisLatch`] so a stick hovering
//! near the threshold cannot toggle authority every cycle.
//!
//! Entering manual override needs both latches asserted; clearing either
//! one returns authority to the autopilot.

use crate::config::ManualOverrideConfig;
use crate::types::{ControlAuthority, PulseWidth};

/// Threshold with a dead band
///
/// With threshold `t` and hysteresis `h`, the latch asserts at
/// `sample >= t + h/2` and clears at `sample <= t - h/2` (integer halves).
/// Samples strictly between the bounds keep the previous state. The upper
/// bound is tested first, so a zero-width band asserts at `t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HysteresisLatch {
    upper: u16,
    lower: u16,
    asserted: bool,
}

impl HysteresisLatch {
    /// Create a cleared latch
    #[must_use]
    pub const fn new(threshold: PulseWidth, hysteresis: u16) -> Self {
        let half = hysteresis / 2;
        let threshold = threshold.as_us();
        Self {
            upper: threshold.saturating_add(half),
            lower: threshold.saturating_sub(half),
            asserted: false,
        }
    }

    /// Lowest sample that asserts
    #[must_use]
    pub const fn upper(&self) -> u16 {
        self.upper
    }

    /// Highest sample that clears
    #[must_use]
    pub const fn lower(&self) -> u16 {
        self.lower
    }

    /// Current latch state
    #[must_use]
    pub const fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Feed one sample and return the new state
    ///
    /// A missing sample leaves the state unchanged.
    pub fn update(&mut self, sample: Option<PulseWidth>) -> bool {
        if let Some(sample) = sample {
            let us = sample.as_us();
            if us >= self.upper {
                self.asserted = true;
            } else if us <= self.lower {
                self.asserted = false;
            }
        }
        self.asserted
    }
}

/// Switch readings for one control cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverrideSample {
    /// Selector channel, None if the receiver did not deliver it
    pub selector: Option<PulseWidth>,
    /// Thrust-enable channel, None if the receiver did not deliver it
    pub thrust_enable: Option<PulseWidth>,
}

impl OverrideSample {
    /// Both channels present
    #[must_use]
    pub const fn new(selector: PulseWidth, thrust_enable: PulseWidth) -> Self {
        Self {
            selector: Some(selector),
            thrust_enable: Some(thrust_enable),
        }
    }
}

/// Autonomous / manual-override state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualOverrideArbiter {
    selector: HysteresisLatch,
    thrust_enable: HysteresisLatch,
    authority: ControlAuthority,
}

impl ManualOverrideArbiter {
    /// Start in [`ControlAuthority::Autonomous`] with both intents cleared
    #[must_use]
    pub const fn new(config: &ManualOverrideConfig) -> Self {
        Self {
            selector: HysteresisLatch::new(config.selector_threshold, config.hysteresis),
            thrust_enable: HysteresisLatch::new(
                config.thrust_enable_threshold,
                config.hysteresis,
            ),
            authority: ControlAuthority::Autonomous,
        }
    }

    /// Current authority
    #[must_use]
    pub const fn authority(&self) -> ControlAuthority {
        self.authority
    }

    /// Latched selector intent
    #[must_use]
    pub const fn selector_intent(&self) -> bool {
        self.selector.is_asserted()
    }

    /// Latched thrust-enable intent
    #[must_use]
    pub const fn thrust_enable_intent(&self) -> bool {
        self.thrust_enable.is_asserted()
    }

    /// Selector latch
    #[must_use]
    pub const fn selector_latch(&self) -> &HysteresisLatch {
        &self.selector
    }

    /// Thrust-enable latch
    #[must_use]
    pub const fn thrust_enable_latch(&self) -> &HysteresisLatch {
        &self.thrust_enable
    }

    /// Run one evaluation
    ///
    /// Returns the new authority when it changed, None otherwise.
    pub fn evaluate(&mut self, sample: OverrideSample) -> Option<ControlAuthority> {
        let selector = self.selector.update(sample.selector);
        let thrust_enable = self.thrust_enable.update(sample.thrust_enable);

        let next = if selector && thrust_enable {
            ControlAuthority::ManualOverride
        } else {
            ControlAuthority::Autonomous
        };

        if next == self.authority {
            return None;
        }
        self.authority = next;
        log_info!(
            "control authority -> {:?} (selector={}, thrust_enable={})",
            next,
            selector,
            thrust_enable
        );
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_use_integer_half() {
        let latch = HysteresisLatch::new(PulseWidth::from_us(1800), 21);
        assert_eq!(latch.upper(), 1810);
        assert_eq!(latch.lower(), 1790);
    }

    #[test]
    fn zero_band_asserts_at_threshold() {
        let mut latch = HysteresisLatch::new(PulseWidth::from_us(1500), 0);
        assert!(latch.update(Some(PulseWidth::from_us(1500))));
        assert!(!latch.update(Some(PulseWidth::from_us(1499))));
    }

    #[test]
    fn missing_sample_keeps_state() {
        let mut latch = HysteresisLatch::new(PulseWidth::from_us(1800), 20);
        latch.update(Some(PulseWidth::from_us(2000)));
        assert!(latch.update(None));
    }
}
