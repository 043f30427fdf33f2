//! System configuration and build options
//!
//! This module holds the compile-time build options for the flight controller
//! and the resolver that turns a flat key/value [`ConfigSource`] into one
//! validated, immutable [`ConfigSnapshot`]. The snapshot is produced once at
//! process entry, before any driver is constructed, and is never mutated.

use core::fmt;

use crate::types::{
    AuxSwitchFunction, BaudRate, FrameOrientation, FrameType, Millis, PulseWidth, RcChannel,
};

/// Airframe geometry
pub const FRAME_CONFIG: FrameType = FrameType::Quad;

/// Motor arm orientation
pub const FRAME_ORIENTATION: FrameOrientation = FrameOrientation::X;

/// Behaviour of the channel 7 auxiliary switch
pub const AUX_CHANNEL_FUNCTION: AuxSwitchFunction = AuxSwitchFunction::DoNothing;

/// Geofence support
pub const FENCE_ENABLED: bool = false;

/// GNSS receiver auto-reporting
pub const GNSS_AUTOREPORT: bool = true;

/// Build-time switch for applying manual thrust/yaw from the override path
pub const MANUAL_THRUST_YAW: bool = false;

/// Window within which a valid autopilot command must arrive
pub const AUTOPILOT_INPUT_TIMEOUT_MS: u32 = 400;

/// Primary console baud rate
///
/// 250000 baud would be exact on this clock tree; 230400 is 7.8% off,
/// so the console stays at 115200.
pub const SERIAL_PRIMARY_BAUD: i32 = 115_200;

/// Baud rate used when the primary transport is disconnected
pub const SERIAL_FALLBACK_BAUD: i32 = SERIAL_PRIMARY_BAUD;

/// Dead band around the manual-override thresholds (pulse-width units)
pub const MANUAL_CONTROL_HYSTERESIS: i32 = 20;

/// RC channel carrying the manual-override selector switch
pub const MANUAL_CONTROL_SELECTOR_CHANNEL: i32 = 6;

/// Pulse width above which manual control is selected
pub const MANUAL_CONTROL_SELECTOR_THRESHOLD: i32 = 1800;

/// RC channel carrying the manual thrust-enable switch
pub const MANUAL_CONTROL_THRUSTEN_CHANNEL: i32 = 7;

/// Pulse width above which manual thrust is enabled
pub const MANUAL_CONTROL_THRUSTEN_THRESHOLD: i32 = 1800;

/// Per-transaction I2C timeout applied during bring-up
pub const I2C_TIMEOUT_MS: u32 = 100;

/// Board peripheral parameters
pub mod board {
    //! Flymaple (STM32F103RE) peripheral parameters

    /// System clock frequency (STM32F103 @ 72MHz)
    pub const SYSTEM_CLOCK_HZ: u32 = 72_000_000;

    /// I2C bus frequency for the on-board sensors
    pub const I2C_FREQUENCY_HZ: u32 = 400_000;

    /// SPI clock for external devices
    pub const SPI_FREQUENCY_HZ: u32 = 1_000_000;

    /// Servo/ESC refresh rate
    pub const RC_OUTPUT_FREQUENCY_HZ: u32 = 50;

    /// Emulated EEPROM size (last two 2K flash pages)
    pub const STORAGE_SIZE: usize = 4096;

    /// Flash offset of the emulated EEPROM region
    pub const STORAGE_FLASH_OFFSET: u32 = 512 * 1024 - STORAGE_SIZE as u32;

    /// Base tick of the periodic task loop
    pub const BASE_TICK_HZ: u32 = 100;
}

/// Pin assignments for the Flymaple board
pub mod pins {
    //! GPIO pin assignments matching the board schematic

    /// USART1 TX (console, "COM1")
    pub const UART_A_TX: &str = "PA9";

    /// USART1 RX (console, "COM1")
    pub const UART_A_RX: &str = "PA10";

    /// USART2 TX
    pub const UART_B_TX: &str = "PA2";

    /// USART2 RX
    pub const UART_B_RX: &str = "PA3";

    /// USART3 TX (GPS)
    pub const UART_C_TX: &str = "PB10";

    /// USART3 RX (GPS)
    pub const UART_C_RX: &str = "PB11";

    /// I2C1 SCL (remapped; IMU, compass, barometer)
    pub const I2C_SCL: &str = "PB8";

    /// I2C1 SDA (remapped)
    pub const I2C_SDA: &str = "PB9";

    /// SPI1 clock
    pub const SPI_SCK: &str = "PA5";

    /// SPI1 MISO
    pub const SPI_MISO: &str = "PA6";

    /// SPI1 MOSI
    pub const SPI_MOSI: &str = "PA7";

    /// SPI1 chip select for the external device
    pub const SPI_CS: &str = "PA4";

    /// PPM sum input from the RC receiver
    pub const PPM_IN: &str = "PA0";

    /// RC outputs 1-4 (TIM3 full remap)
    pub const RC_OUT: [&str; 4] = ["PC6", "PC7", "PC8", "PC9"];

    /// Analog inputs (ADC1 channels 10-13)
    pub const ANALOG_IN: [&str; 4] = ["PC0", "PC1", "PC2", "PC3"];

    /// Status LED
    pub const LED_STATUS: &str = "PB12";

    /// Buzzer
    pub const BUZZER: &str = "PB13";
}

/// Declared type of a build option
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Signed integer
    Int,
    /// Enumerated value stored as its numeric code
    Enum,
    /// Boolean flag
    Bool,
    /// Duration in milliseconds
    Duration,
}

#[cfg(feature = "embedded")]
impl defmt::Format for OptionKind {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Int => defmt::write!(f, "int"),
            Self::Enum => defmt::write!(f, "enum"),
            Self::Bool => defmt::write!(f, "bool"),
            Self::Duration => defmt::write!(f, "duration"),
        }
    }
}

/// A typed option value as delivered by a configuration source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// Signed integer
    Int(i32),
    /// Enumerated value (numeric code)
    Enum(u8),
    /// Boolean flag
    Bool(bool),
    /// Duration
    Duration(Millis),
}

impl OptionValue {
    /// Declared type of this value
    #[must_use]
    pub const fn kind(self) -> OptionKind {
        match self {
            Self::Int(_) => OptionKind::Int,
            Self::Enum(_) => OptionKind::Enum,
            Self::Bool(_) => OptionKind::Bool,
            Self::Duration(_) => OptionKind::Duration,
        }
    }
}

/// How an option behaves when the source does not provide it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Resolution fails when absent
    Required,
    /// Absent options take this value
    Default(OptionValue),
    /// Absent options copy another (earlier) option's resolved value
    SameAs(OptionKey),
}

/// The closed set of recognized build options
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionKey {
    /// `frame.type`
    FrameType,
    /// `frame.orientation`
    FrameOrientation,
    /// `aux_channel.function`
    AuxChannelFunction,
    /// `serial.primary_baud`
    SerialPrimaryBaud,
    /// `serial.fallback_baud`
    SerialFallbackBaud,
    /// `manual_override.hysteresis`
    OverrideHysteresis,
    /// `manual_override.selector_channel`
    SelectorChannel,
    /// `manual_override.selector_threshold`
    SelectorThreshold,
    /// `manual_override.thrust_enable_channel`
    ThrustEnableChannel,
    /// `manual_override.thrust_enable_threshold`
    ThrustEnableThreshold,
    /// `manual_override.thrust_yaw`
    ManualThrustYaw,
    /// `autopilot.input_timeout`
    AutopilotInputTimeout,
    /// `fence.enabled`
    FenceEnabled,
    /// `gnss.auto_report`
    GnssAutoReport,
    /// `bus.i2c_timeout`
    I2cTimeout,
}

impl OptionKey {
    /// Number of recognized options
    pub const COUNT: usize = 15;

    /// Every option, in resolution order
    ///
    /// `SameAs` dependencies must point at an earlier entry.
    pub const ALL: [Self; Self::COUNT] = [
        Self::FrameType,
        Self::FrameOrientation,
        Self::AuxChannelFunction,
        Self::SerialPrimaryBaud,
        Self::SerialFallbackBaud,
        Self::OverrideHysteresis,
        Self::SelectorChannel,
        Self::SelectorThreshold,
        Self::ThrustEnableChannel,
        Self::ThrustEnableThreshold,
        Self::ManualThrustYaw,
        Self::AutopilotInputTimeout,
        Self::FenceEnabled,
        Self::GnssAutoReport,
        Self::I2cTimeout,
    ];

    /// Dotted option name in the flat configuration namespace
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FrameType => "frame.type",
            Self::FrameOrientation => "frame.orientation",
            Self::AuxChannelFunction => "aux_channel.function",
            Self::SerialPrimaryBaud => "serial.primary_baud",
            Self::SerialFallbackBaud => "serial.fallback_baud",
            Self::OverrideHysteresis => "manual_override.hysteresis",
            Self::SelectorChannel => "manual_override.selector_channel",
            Self::SelectorThreshold => "manual_override.selector_threshold",
            Self::ThrustEnableChannel => "manual_override.thrust_enable_channel",
            Self::ThrustEnableThreshold => "manual_override.thrust_enable_threshold",
            Self::ManualThrustYaw => "manual_override.thrust_yaw",
            Self::AutopilotInputTimeout => "autopilot.input_timeout",
            Self::FenceEnabled => "fence.enabled",
            Self::GnssAutoReport => "gnss.auto_report",
            Self::I2cTimeout => "bus.i2c_timeout",
        }
    }

    /// Look up a key by its dotted name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }

    /// Declared type
    #[must_use]
    pub const fn kind(self) -> OptionKind {
        match self {
            Self::FrameType | Self::FrameOrientation | Self::AuxChannelFunction => {
                OptionKind::Enum
            }
            Self::SerialPrimaryBaud
            | Self::SerialFallbackBaud
            | Self::OverrideHysteresis
            | Self::SelectorChannel
            | Self::SelectorThreshold
            | Self::ThrustEnableChannel
            | Self::ThrustEnableThreshold => OptionKind::Int,
            Self::ManualThrustYaw | Self::FenceEnabled | Self::GnssAutoReport => OptionKind::Bool,
            Self::AutopilotInputTimeout | Self::I2cTimeout => OptionKind::Duration,
        }
    }

    /// Required/default policy
    #[must_use]
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::FrameOrientation => {
                Requirement::Default(OptionValue::Enum(FrameOrientation::X.code()))
            }
            Self::AuxChannelFunction => {
                Requirement::Default(OptionValue::Enum(AuxSwitchFunction::DoNothing.code()))
            }
            Self::SerialFallbackBaud => Requirement::SameAs(Self::SerialPrimaryBaud),
            Self::ManualThrustYaw => Requirement::Default(OptionValue::Bool(false)),
            Self::FenceEnabled | Self::GnssAutoReport => {
                Requirement::Default(OptionValue::Bool(true))
            }
            Self::I2cTimeout => {
                Requirement::Default(OptionValue::Duration(Millis::new(I2C_TIMEOUT_MS)))
            }
            Self::FrameType
            | Self::SerialPrimaryBaud
            | Self::OverrideHysteresis
            | Self::SelectorChannel
            | Self::SelectorThreshold
            | Self::ThrustEnableChannel
            | Self::ThrustEnableThreshold
            | Self::AutopilotInputTimeout => Requirement::Required,
        }
    }

    /// Check whether resolution fails when the option is absent
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self.requirement(), Requirement::Required)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OptionKey {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Configuration resolution errors
///
/// All of these are fatal at startup; there is no runtime recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required option is absent
    Missing(OptionKey),
    /// The source delivered a value of the wrong type
    TypeMismatch {
        /// Offending option
        key: OptionKey,
        /// Declared type
        expected: OptionKind,
    },
    /// Enumerated value is not a recognized code
    InvalidEnum(OptionKey),
    /// Threshold, baud rate or timeout is zero or negative
    NonPositive(OptionKey),
    /// Hysteresis is negative
    Negative(OptionKey),
    /// Channel number outside the receiver's channel range
    ChannelOutOfRange(OptionKey),
    /// Value outside the range any RC pulse can take
    OutOfRange(OptionKey),
}

impl ConfigError {
    /// Option that caused the error
    #[must_use]
    pub const fn key(self) -> OptionKey {
        match self {
            Self::Missing(key)
            | Self::TypeMismatch { key, .. }
            | Self::InvalidEnum(key)
            | Self::NonPositive(key)
            | Self::Negative(key)
            | Self::ChannelOutOfRange(key)
            | Self::OutOfRange(key) => key,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required option {}", key.name()),
            Self::TypeMismatch { key, expected } => {
                write!(f, "option {} must be of type {:?}", key.name(), expected)
            }
            Self::InvalidEnum(key) => write!(f, "option {} has an unknown value", key.name()),
            Self::NonPositive(key) => write!(f, "option {} must be positive", key.name()),
            Self::Negative(key) => write!(f, "option {} must not be negative", key.name()),
            Self::ChannelOutOfRange(key) => {
                write!(f, "option {} is not a valid RC channel", key.name())
            }
            Self::OutOfRange(key) => write!(f, "option {} is out of range", key.name()),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Missing(key) => defmt::write!(f, "missing {}", key),
            Self::TypeMismatch { key, expected } => {
                defmt::write!(f, "{} expects {}", key, expected);
            }
            Self::InvalidEnum(key) => defmt::write!(f, "{} unknown value", key),
            Self::NonPositive(key) => defmt::write!(f, "{} not positive", key),
            Self::Negative(key) => defmt::write!(f, "{} negative", key),
            Self::ChannelOutOfRange(key) => defmt::write!(f, "{} bad channel", key),
            Self::OutOfRange(key) => defmt::write!(f, "{} out of range", key),
        }
    }
}

/// Flat key/value namespace of build options
///
/// Sources are assumed to be already parsed; the resolver only checks
/// presence, type and range.
pub trait ConfigSource {
    /// Look up an option by dotted name
    fn lookup(&self, name: &str) -> Option<OptionValue>;

    /// Visit every key the source carries (used to report unknown keys)
    fn for_each_key(&self, _visit: &mut dyn FnMut(&str)) {}
}

/// Configuration source backed by a slice of name/value pairs
///
/// The first entry wins when a name appears more than once.
#[derive(Clone, Copy, Debug)]
pub struct StaticSource<'a> {
    entries: &'a [(&'a str, OptionValue)],
}

impl<'a> StaticSource<'a> {
    /// Wrap a slice of entries
    #[must_use]
    pub const fn new(entries: &'a [(&'a str, OptionValue)]) -> Self {
        Self { entries }
    }
}

impl ConfigSource for StaticSource<'_> {
    fn lookup(&self, name: &str) -> Option<OptionValue> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, value)| *value)
    }

    fn for_each_key(&self, visit: &mut dyn FnMut(&str)) {
        for (name, _) in self.entries {
            visit(name);
        }
    }
}

/// Options compiled into this firmware image
pub static BUILD_OPTIONS: [(&str, OptionValue); OptionKey::COUNT] = [
    ("frame.type", OptionValue::Enum(FRAME_CONFIG.code())),
    ("frame.orientation", OptionValue::Enum(FRAME_ORIENTATION.code())),
    ("aux_channel.function", OptionValue::Enum(AUX_CHANNEL_FUNCTION.code())),
    ("serial.primary_baud", OptionValue::Int(SERIAL_PRIMARY_BAUD)),
    ("serial.fallback_baud", OptionValue::Int(SERIAL_FALLBACK_BAUD)),
    ("manual_override.hysteresis", OptionValue::Int(MANUAL_CONTROL_HYSTERESIS)),
    ("manual_override.selector_channel", OptionValue::Int(MANUAL_CONTROL_SELECTOR_CHANNEL)),
    ("manual_override.selector_threshold", OptionValue::Int(MANUAL_CONTROL_SELECTOR_THRESHOLD)),
    ("manual_override.thrust_enable_channel", OptionValue::Int(MANUAL_CONTROL_THRUSTEN_CHANNEL)),
    ("manual_override.thrust_enable_threshold", OptionValue::Int(MANUAL_CONTROL_THRUSTEN_THRESHOLD)),
    ("manual_override.thrust_yaw", OptionValue::Bool(MANUAL_THRUST_YAW)),
    ("autopilot.input_timeout", OptionValue::Duration(Millis::new(AUTOPILOT_INPUT_TIMEOUT_MS))),
    ("fence.enabled", OptionValue::Bool(FENCE_ENABLED)),
    ("gnss.auto_report", OptionValue::Bool(GNSS_AUTOREPORT)),
    ("bus.i2c_timeout", OptionValue::Duration(Millis::new(I2C_TIMEOUT_MS))),
];

/// Source over the compiled-in build options
#[must_use]
pub fn build_source() -> StaticSource<'static> {
    StaticSource::new(&BUILD_OPTIONS)
}

/// Airframe selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameConfig {
    /// Geometry
    pub frame_type: FrameType,
    /// Arm orientation
    pub orientation: FrameOrientation,
}

/// Console/serial baud rates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SerialConfig {
    /// Rate used while the primary transport is connected
    pub primary_baud: BaudRate,
    /// Rate used when the primary transport is disconnected, and the rate
    /// of the telemetry UART
    pub fallback_baud: BaudRate,
}

impl SerialConfig {
    /// Rate of the telemetry link on UART C
    #[must_use]
    pub const fn telemetry_baud(&self) -> BaudRate {
        self.fallback_baud
    }
}

/// Manual-override switch assignments and thresholds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ManualOverrideConfig {
    /// Channel carrying the selector switch
    pub selector_channel: RcChannel,
    /// Selector switch threshold
    pub selector_threshold: PulseWidth,
    /// Channel carrying the thrust-enable switch
    pub thrust_enable_channel: RcChannel,
    /// Thrust-enable switch threshold
    pub thrust_enable_threshold: PulseWidth,
    /// Width of the dead band centred on each threshold
    pub hysteresis: u16,
    /// Whether flight control applies manual thrust/yaw when overridden
    pub thrust_yaw_enabled: bool,
}

/// Validated, immutable configuration snapshot
///
/// Holds the raw resolved value of every option (for [`ConfigSnapshot::get`])
/// alongside the typed views the rest of the firmware consumes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConfigSnapshot {
    values: [OptionValue; OptionKey::COUNT],
    frame: FrameConfig,
    aux_function: AuxSwitchFunction,
    serial: SerialConfig,
    manual_override: ManualOverrideConfig,
    autopilot_input_timeout: Millis,
    fence_enabled: bool,
    gnss_auto_report: bool,
    i2c_timeout: Millis,
}

impl ConfigSnapshot {
    /// Resolve every recognized option from `source`
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, in [`OptionKey::ALL`] order.
    pub fn resolve<S: ConfigSource + ?Sized>(source: &S) -> Result<Self, ConfigError> {
        let mut values = [OptionValue::Bool(false); OptionKey::COUNT];

        for key in OptionKey::ALL {
            let value = match source.lookup(key.name()) {
                Some(value) => value,
                None => match key.requirement() {
                    Requirement::Required => return Err(ConfigError::Missing(key)),
                    Requirement::Default(value) => value,
                    Requirement::SameAs(other) => values[other.slot()],
                },
            };

            if value.kind() != key.kind() {
                return Err(ConfigError::TypeMismatch {
                    key,
                    expected: key.kind(),
                });
            }
            values[key.slot()] = value;
        }

        source.for_each_key(&mut |name| {
            if OptionKey::from_name(name).is_none() {
                log_warn!("ignoring unknown build option {}", name);
            }
        });

        let snapshot = Self::from_values(values)?;

        if snapshot.manual_override.selector_channel
            == snapshot.manual_override.thrust_enable_channel
        {
            log_warn!("manual override selector and thrust-enable share one channel");
        }

        Ok(snapshot)
    }

    /// Resolve the options compiled into this image
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the build options are inconsistent.
    pub fn from_build() -> Result<Self, ConfigError> {
        Self::resolve(&build_source())
    }

    fn from_values(values: [OptionValue; OptionKey::COUNT]) -> Result<Self, ConfigError> {
        let frame = FrameConfig {
            frame_type: decode_enum(&values, OptionKey::FrameType, FrameType::from_code)?,
            orientation: decode_enum(
                &values,
                OptionKey::FrameOrientation,
                FrameOrientation::from_code,
            )?,
        };
        let aux_function = decode_enum(
            &values,
            OptionKey::AuxChannelFunction,
            AuxSwitchFunction::from_code,
        )?;

        let serial = SerialConfig {
            primary_baud: baud(&values, OptionKey::SerialPrimaryBaud)?,
            fallback_baud: baud(&values, OptionKey::SerialFallbackBaud)?,
        };

        let hysteresis = int(&values, OptionKey::OverrideHysteresis)?;
        if hysteresis < 0 {
            return Err(ConfigError::Negative(OptionKey::OverrideHysteresis));
        }
        let hysteresis = u16::try_from(hysteresis)
            .map_err(|_| ConfigError::OutOfRange(OptionKey::OverrideHysteresis))?;

        let manual_override = ManualOverrideConfig {
            selector_channel: channel(&values, OptionKey::SelectorChannel)?,
            selector_threshold: threshold(&values, OptionKey::SelectorThreshold)?,
            thrust_enable_channel: channel(&values, OptionKey::ThrustEnableChannel)?,
            thrust_enable_threshold: threshold(&values, OptionKey::ThrustEnableThreshold)?,
            hysteresis,
            thrust_yaw_enabled: flag(&values, OptionKey::ManualThrustYaw)?,
        };

        Ok(Self {
            values,
            frame,
            aux_function,
            serial,
            manual_override,
            autopilot_input_timeout: duration(&values, OptionKey::AutopilotInputTimeout)?,
            fence_enabled: flag(&values, OptionKey::FenceEnabled)?,
            gnss_auto_report: flag(&values, OptionKey::GnssAutoReport)?,
            i2c_timeout: duration(&values, OptionKey::I2cTimeout)?,
        })
    }

    /// Resolved raw value of an option
    #[must_use]
    pub const fn get(&self, key: OptionKey) -> OptionValue {
        self.values[key.slot()]
    }

    /// Airframe selection
    #[must_use]
    pub const fn frame(&self) -> FrameConfig {
        self.frame
    }

    /// Auxiliary switch behaviour
    #[must_use]
    pub const fn aux_function(&self) -> AuxSwitchFunction {
        self.aux_function
    }

    /// Serial baud rates
    #[must_use]
    pub const fn serial(&self) -> SerialConfig {
        self.serial
    }

    /// Manual-override parameters
    #[must_use]
    pub const fn manual_override(&self) -> ManualOverrideConfig {
        self.manual_override
    }

    /// Autopilot command timeout
    #[must_use]
    pub const fn autopilot_input_timeout(&self) -> Millis {
        self.autopilot_input_timeout
    }

    /// Per-transaction I2C timeout
    #[must_use]
    pub const fn i2c_timeout(&self) -> Millis {
        self.i2c_timeout
    }

    /// Geofence flag (forwarded to the fence logic)
    #[must_use]
    pub const fn fence_enabled(&self) -> bool {
        self.fence_enabled
    }

    /// GNSS auto-report flag (forwarded to the GNSS driver)
    #[must_use]
    pub const fn gnss_auto_report(&self) -> bool {
        self.gnss_auto_report
    }

    /// Manual thrust/yaw flag (forwarded to flight control)
    #[must_use]
    pub const fn manual_thrust_yaw(&self) -> bool {
        self.manual_override.thrust_yaw_enabled
    }
}

fn mismatch(key: OptionKey) -> ConfigError {
    ConfigError::TypeMismatch {
        key,
        expected: key.kind(),
    }
}

fn int(values: &[OptionValue; OptionKey::COUNT], key: OptionKey) -> Result<i32, ConfigError> {
    match values[key.slot()] {
        OptionValue::Int(v) => Ok(v),
        _ => Err(mismatch(key)),
    }
}

fn flag(values: &[OptionValue; OptionKey::COUNT], key: OptionKey) -> Result<bool, ConfigError> {
    match values[key.slot()] {
        OptionValue::Bool(v) => Ok(v),
        _ => Err(mismatch(key)),
    }
}

fn duration(
    values: &[OptionValue; OptionKey::COUNT],
    key: OptionKey,
) -> Result<Millis, ConfigError> {
    match values[key.slot()] {
        OptionValue::Duration(d) if d.as_ms() == 0 => Err(ConfigError::NonPositive(key)),
        OptionValue::Duration(d) => Ok(d),
        _ => Err(mismatch(key)),
    }
}

fn decode_enum<T>(
    values: &[OptionValue; OptionKey::COUNT],
    key: OptionKey,
    decode: fn(u8) -> Option<T>,
) -> Result<T, ConfigError> {
    match values[key.slot()] {
        OptionValue::Enum(code) => decode(code).ok_or(ConfigError::InvalidEnum(key)),
        _ => Err(mismatch(key)),
    }
}

fn baud(values: &[OptionValue; OptionKey::COUNT], key: OptionKey) -> Result<BaudRate, ConfigError> {
    let raw = int(values, key)?;
    u32::try_from(raw)
        .ok()
        .and_then(BaudRate::new)
        .ok_or(ConfigError::NonPositive(key))
}

fn channel(
    values: &[OptionValue; OptionKey::COUNT],
    key: OptionKey,
) -> Result<RcChannel, ConfigError> {
    let raw = int(values, key)?;
    u8::try_from(raw)
        .ok()
        .and_then(RcChannel::new)
        .ok_or(ConfigError::ChannelOutOfRange(key))
}

fn threshold(
    values: &[OptionValue; OptionKey::COUNT],
    key: OptionKey,
) -> Result<PulseWidth, ConfigError> {
    let raw = int(values, key)?;
    if raw <= 0 {
        return Err(ConfigError::NonPositive(key));
    }
    match u16::try_from(raw) {
        Ok(us) if us <= PulseWidth::MAX_US => Ok(PulseWidth::from_us(us)),
        _ => Err(ConfigError::OutOfRange(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_names_are_unique() {
        for (i, a) in OptionKey::ALL.iter().enumerate() {
            for b in &OptionKey::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test]
    fn slots_follow_resolution_order() {
        for (i, key) in OptionKey::ALL.iter().enumerate() {
            assert_eq!(key.slot(), i);
        }
    }

    #[test]
    fn same_as_points_backwards() {
        for (i, key) in OptionKey::ALL.iter().enumerate() {
            if let Requirement::SameAs(other) = key.requirement() {
                assert!(other.slot() < i, "{:?} depends on a later option", key);
            }
        }
    }

    #[test]
    fn build_options_cover_every_key() {
        for key in OptionKey::ALL {
            assert!(build_source().lookup(key.name()).is_some(), "{:?}", key);
        }
    }

    #[test]
    fn build_option_types_match_declarations() {
        for (name, value) in &BUILD_OPTIONS {
            let key = OptionKey::from_name(name).expect("known key");
            assert_eq!(value.kind(), key.kind(), "{name}");
        }
    }
}
