//! Control Authority
//!
//! Decides, every control cycle, whether autonomous or manual inputs govern
//! thrust and yaw, and whether autonomous command authority has been lost.
//! Pure logic: the only inputs are RC samples and timestamps.

pub mod arbiter;
pub mod cycle;
pub mod liveness;

pub use arbiter::{HysteresisLatch, ManualOverrideArbiter, OverrideSample};
pub use cycle::{AuthoritySink, ControlCycle, CycleOutcome, SharedAuthority};
pub use liveness::LivenessMonitor;
