//! Autopilot liveness
//!
//! Tracks the time since the last valid autonomous command. Exceeding the
//! configured timeout raises the failsafe once; the next command clears it.

use crate::types::{FailsafeEvent, Millis};

/// Liveness timer with edge-triggered failsafe events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LivenessMonitor {
    timeout: Millis,
    last_command: Millis,
    lost: bool,
}

impl LivenessMonitor {
    /// Start the timer at `now` (boot counts as the first command)
    #[must_use]
    pub const fn new(timeout: Millis, now: Millis) -> Self {
        Self {
            timeout,
            last_command: now,
            lost: false,
        }
    }

    /// Configured timeout
    #[must_use]
    pub const fn timeout(&self) -> Millis {
        self.timeout
    }

    /// Check if autonomous command authority is currently lost
    #[must_use]
    pub const fn is_lost(&self) -> bool {
        self.lost
    }

    /// Time since the last command
    #[must_use]
    pub const fn elapsed(&self, now: Millis) -> Millis {
        now.since(self.last_command)
    }

    /// Record a valid autonomous command
    ///
    /// Returns [`FailsafeEvent::Cleared`] if this ends a failsafe episode.
    pub fn command_received(&mut self, now: Millis) -> Option<FailsafeEvent> {
        self.last_command = now;
        if !core::mem::replace(&mut self.lost, false) {
            return None;
        }
        log_info!("autopilot input restored");
        Some(FailsafeEvent::Cleared)
    }

    /// Compare the elapsed time against the timeout
    ///
    /// Returns [`FailsafeEvent::Asserted`] on the first check that finds the
    /// elapsed time strictly greater than the timeout; later checks in the
    /// same episode return None.
    pub fn check(&mut self, now: Millis) -> Option<FailsafeEvent> {
        if self.lost {
            return None;
        }
        let elapsed = self.elapsed(now);
        if elapsed <= self.timeout {
            return None;
        }
        self.lost = true;
        log_warn!(
            "autopilot input lost: {}ms without a command (timeout {}ms)",
            elapsed.as_ms(),
            self.timeout.as_ms()
        );
        Some(FailsafeEvent::Asserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_starts_the_timer() {
        let mut monitor = LivenessMonitor::new(Millis::new(400), Millis::new(1_000));
        assert_eq!(monitor.check(Millis::new(1_400)), None);
        assert_eq!(monitor.check(Millis::new(1_401)), Some(FailsafeEvent::Asserted));
    }

    #[test]
    fn command_without_episode_is_silent() {
        let mut monitor = LivenessMonitor::new(Millis::new(400), Millis::ZERO);
        assert_eq!(monitor.command_received(Millis::new(100)), None);
        assert_eq!(monitor.elapsed(Millis::new(150)), Millis::new(50));
    }
}
