//! Shared types used across the flight-controller firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at construction time and provide type safety throughout the codebase.

use core::fmt;

/// Number of RC input channels decoded on this board
pub const RC_INPUT_CHANNELS: u8 = 8;

/// Number of RC output (servo/ESC) channels on this board
pub const RC_OUTPUT_CHANNELS: u8 = 8;

/// RC pulse width in microseconds
///
/// Standard RC receivers produce pulses between 1000 and 2000 us,
/// with some transmitters extending to roughly 800..2200 us.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PulseWidth(u16);

impl PulseWidth {
    /// Shortest pulse any supported receiver emits
    pub const MIN_US: u16 = 800;

    /// Longest pulse any supported receiver emits
    pub const MAX_US: u16 = 2200;

    /// Nominal stick-centre pulse
    pub const CENTER: Self = Self(1500);

    /// Wrap a raw microsecond value
    #[must_use]
    pub const fn from_us(us: u16) -> Self {
        Self(us)
    }

    /// Get the pulse width in microseconds
    #[must_use]
    pub const fn as_us(self) -> u16 {
        self.0
    }

    /// Check whether the pulse lies in the range a receiver can produce
    #[must_use]
    pub const fn is_plausible(self) -> bool {
        self.0 >= Self::MIN_US && self.0 <= Self::MAX_US
    }
}

impl fmt::Debug for PulseWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PulseWidth({} us)", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PulseWidth {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}us", self.0);
    }
}

/// RC channel number (1-based, as printed on the transmitter)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RcChannel(u8);

impl RcChannel {
    /// Create from a 1-based channel number, returns None if out of range
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= RC_INPUT_CHANNELS {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Get the 1-based channel number
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Get the 0-based index into channel arrays
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Debug for RcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RcChannel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CH{}", self.0);
    }
}

/// Timestamp or duration in milliseconds
///
/// Timestamps come from a free-running 32-bit counter, so elapsed time is
/// computed with wrapping arithmetic (valid across one wrap, ~49 days).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millis(u32);

impl Millis {
    /// Zero milliseconds
    pub const ZERO: Self = Self(0);

    /// Wrap a raw millisecond count
    #[must_use]
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Get the raw millisecond count
    #[must_use]
    pub const fn as_ms(self) -> u32 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`
    #[must_use]
    pub const fn since(self, earlier: Self) -> Self {
        Self(self.0.wrapping_sub(earlier.0))
    }

    /// Advance by a duration (wrapping)
    #[must_use]
    pub const fn plus(self, duration: Self) -> Self {
        Self(self.0.wrapping_add(duration.0))
    }
}

impl fmt::Debug for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ms", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Millis {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}ms", self.0);
    }
}

/// Serial baud rate (always non-zero)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BaudRate(u32);

impl BaudRate {
    /// Common default for telemetry and console links
    pub const B115200: Self = Self(115_200);

    /// Create a baud rate, returns None for zero
    #[must_use]
    pub const fn new(bps: u32) -> Option<Self> {
        if bps == 0 {
            None
        } else {
            Some(Self(bps))
        }
    }

    /// Get the rate in bits per second
    #[must_use]
    pub const fn bps(self) -> u32 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BaudRate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}bps", self.0);
    }
}

/// Airframe geometry
///
/// Informational to the core; consumed by the external motor mixer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FrameType {
    /// Four rotors
    #[default]
    Quad,
    /// Three rotors with yaw servo
    Tri,
    /// Six rotors
    Hexa,
    /// Six rotors on three coaxial arms
    Y6,
    /// Eight rotors
    Octa,
    /// Traditional helicopter
    Heli,
}

impl FrameType {
    /// Decode from the numeric build-option value
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Quad),
            2 => Some(Self::Tri),
            3 => Some(Self::Hexa),
            4 => Some(Self::Y6),
            5 => Some(Self::Octa),
            7 => Some(Self::Heli),
            _ => None,
        }
    }

    /// Numeric build-option value
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Quad => 1,
            Self::Tri => 2,
            Self::Hexa => 3,
            Self::Y6 => 4,
            Self::Octa => 5,
            Self::Heli => 7,
        }
    }

    /// Number of motor outputs the frame drives
    #[must_use]
    pub const fn motor_count(self) -> u8 {
        match self {
            Self::Quad => 4,
            Self::Tri => 3,
            Self::Hexa | Self::Y6 => 6,
            Self::Octa => 8,
            Self::Heli => 1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FrameType {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Quad => defmt::write!(f, "QUAD"),
            Self::Tri => defmt::write!(f, "TRI"),
            Self::Hexa => defmt::write!(f, "HEXA"),
            Self::Y6 => defmt::write!(f, "Y6"),
            Self::Octa => defmt::write!(f, "OCTA"),
            Self::Heli => defmt::write!(f, "HELI"),
        }
    }
}

/// Orientation of the motor arms relative to the flight controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FrameOrientation {
    /// Arms along the roll/pitch axes
    Plus,
    /// Arms at 45 degrees
    #[default]
    X,
    /// V-tail layout
    V,
    /// H layout
    H,
}

impl FrameOrientation {
    /// Decode from the numeric build-option value
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Plus),
            1 => Some(Self::X),
            2 => Some(Self::V),
            3 => Some(Self::H),
            _ => None,
        }
    }

    /// Numeric build-option value
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Plus => 0,
            Self::X => 1,
            Self::V => 2,
            Self::H => 3,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FrameOrientation {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Plus => defmt::write!(f, "+"),
            Self::X => defmt::write!(f, "X"),
            Self::V => defmt::write!(f, "V"),
            Self::H => defmt::write!(f, "H"),
        }
    }
}

/// Behaviour bound to the auxiliary switch channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AuxSwitchFunction {
    /// Switch is ignored
    #[default]
    DoNothing,
    /// Perform a flip
    Flip,
    /// Toggle simple mode
    SimpleMode,
    /// Return to launch
    Rtl,
    /// Save current trim
    SaveTrim,
    /// Save current position as waypoint
    SaveWaypoint,
    /// Fire the camera shutter
    CameraTrigger,
    /// Enable the sonar
    Sonar,
    /// Enable the geofence
    Fence,
}

impl AuxSwitchFunction {
    /// Decode from the numeric build-option value
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::DoNothing),
            2 => Some(Self::Flip),
            3 => Some(Self::SimpleMode),
            4 => Some(Self::Rtl),
            5 => Some(Self::SaveTrim),
            7 => Some(Self::SaveWaypoint),
            9 => Some(Self::CameraTrigger),
            10 => Some(Self::Sonar),
            11 => Some(Self::Fence),
            _ => None,
        }
    }

    /// Numeric build-option value
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::DoNothing => 0,
            Self::Flip => 2,
            Self::SimpleMode => 3,
            Self::Rtl => 4,
            Self::SaveTrim => 5,
            Self::SaveWaypoint => 7,
            Self::CameraTrigger => 9,
            Self::Sonar => 10,
            Self::Fence => 11,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AuxSwitchFunction {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "AUX({})", self.code());
    }
}

/// Which source currently governs thrust and yaw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ControlAuthority {
    /// Autopilot commands are applied
    #[default]
    Autonomous,
    /// Pilot stick inputs are applied
    ManualOverride,
}

impl ControlAuthority {
    /// Check if the pilot has control
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::ManualOverride)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ControlAuthority {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Autonomous => defmt::write!(f, "AUTONOMOUS"),
            Self::ManualOverride => defmt::write!(f, "MANUAL"),
        }
    }
}

/// Edge of the autopilot-input failsafe condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailsafeEvent {
    /// No autopilot command within the configured timeout
    Asserted,
    /// A valid autopilot command arrived after a timeout
    Cleared,
}

#[cfg(feature = "embedded")]
impl defmt::Format for FailsafeEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Asserted => defmt::write!(f, "FAILSAFE"),
            Self::Cleared => defmt::write!(f, "CLEARED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_channel_bounds() {
        assert!(RcChannel::new(0).is_none());
        assert_eq!(RcChannel::new(1).map(RcChannel::index), Some(0));
        assert_eq!(RcChannel::new(8).map(RcChannel::index), Some(7));
        assert!(RcChannel::new(9).is_none());
    }

    #[test]
    fn millis_since_wraps() {
        let before = Millis::new(u32::MAX - 9);
        let after = Millis::new(10);
        assert_eq!(after.since(before), Millis::new(20));
    }

    #[test]
    fn frame_codes_roundtrip_known_values() {
        assert_eq!(FrameType::from_code(1), Some(FrameType::Quad));
        assert_eq!(FrameType::from_code(6), None);
        assert_eq!(FrameOrientation::from_code(1), Some(FrameOrientation::X));
        assert_eq!(AuxSwitchFunction::from_code(0), Some(AuxSwitchFunction::DoNothing));
        assert_eq!(AuxSwitchFunction::from_code(1), None);
    }

    #[test]
    fn baud_rate_rejects_zero() {
        assert!(BaudRate::new(0).is_none());
        assert_eq!(BaudRate::new(57_600).map(BaudRate::bps), Some(57_600));
    }
}
