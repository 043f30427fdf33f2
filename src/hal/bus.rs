//! Bounded bus transactions
//!
//! Bus drivers that poll a peripheral status flag wrap the poll in
//! [`poll_until`], so a stuck device surfaces as [`BusError::Timeout`]
//! instead of stalling the control loop.

use crate::types::Millis;

use super::error::{BusError, BusResult};
use super::interfaces::Clock;

/// Deadline for a single transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    start: Millis,
    budget: Millis,
}

impl Deadline {
    /// Start a deadline `budget` from `now`
    #[must_use]
    pub const fn new(now: Millis, budget: Millis) -> Self {
        Self { start: now, budget }
    }

    /// Check if the budget has been used up
    #[must_use]
    pub fn expired(&self, now: Millis) -> bool {
        now.since(self.start) > self.budget
    }

    /// Time left before expiry
    #[must_use]
    pub fn remaining(&self, now: Millis) -> Millis {
        let used = now.since(self.start);
        Millis::new(self.budget.as_ms().saturating_sub(used.as_ms()))
    }
}

/// Poll `step` until it yields a result or `timeout` elapses
///
/// `step` returns `None` while the transaction is still in progress and
/// `Some(result)` once it completes or fails. The deadline is checked after
/// each unfinished poll.
///
/// # Errors
///
/// Returns the error produced by `step`, or [`BusError::Timeout`] once the
/// deadline has passed.
pub fn poll_until<C, T, F>(clock: &C, timeout: Millis, mut step: F) -> BusResult<T>
where
    C: Clock + ?Sized,
    F: FnMut() -> Option<BusResult<T>>,
{
    let deadline = Deadline::new(clock.now(), timeout);
    loop {
        if let Some(result) = step() {
            return result;
        }
        if deadline.expired(clock.now()) {
            return Err(BusError::Timeout);
        }
    }
}
