/*!
 * Device traits and the controller's native state vocabulary.
 *
 * Every device the controller exposes implements [`Device`]. Each device class
 * adds a trait with its state getters and asynchronous commands. The registry
 * hands devices out wrapped in a [`DeviceHandle`], one variant per class.
 */
use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hapbridge_core::{error::Error as CoreError, types::Address};

/// Error type for device operations
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The controller rejected or failed to deliver a command
    #[error("Command {command} failed for device {address}: {reason}")]
    CommandFailed {
        /// The device address
        address: Address,
        /// The command name
        command: String,
        /// Failure description from the controller
        reason: String,
    },

    /// The registry has not finished initializing
    #[error("Device registry not initialized")]
    NotInitialized,

    /// No device is registered under the address
    #[error("Unknown device: {0}")]
    UnknownDevice(Address),

    /// A device with the same address is already registered
    #[error("Device already registered: {0}")]
    AlreadyRegistered(Address),

    /// Registry error
    #[error("Registry error: {0}")]
    Registry(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Device class tag as reported by the controller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// On/off light
    Light,
    /// Light with a dim level
    DimmableLight,
    /// Door lock
    Lock,
    /// Door lock with secure signalling
    SecureLock,
    /// Switched outlet
    Outlet,
    /// Multi-speed fan
    Fan,
    /// Door or window contact sensor
    DoorWindowSensor,
    /// Contact sensor zone of the alarm system
    AlarmDoorWindowSensor,
    /// Alarm system panel
    AlarmPanel,
    /// Any other tag, kept verbatim
    Other(String),
}

impl DeviceKind {
    /// The controller's tag for the class
    pub fn as_str(&self) -> &str {
        match self {
            DeviceKind::Light => "Light",
            DeviceKind::DimmableLight => "DimmableLight",
            DeviceKind::Lock => "Lock",
            DeviceKind::SecureLock => "SecureLock",
            DeviceKind::Outlet => "Outlet",
            DeviceKind::Fan => "Fan",
            DeviceKind::DoorWindowSensor => "DoorWindowSensor",
            DeviceKind::AlarmDoorWindowSensor => "AlarmDoorWindowSensor",
            DeviceKind::AlarmPanel => "AlarmPanel",
            DeviceKind::Other(tag) => tag,
        }
    }

    /// Parse a controller tag; unknown tags become [`DeviceKind::Other`]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Light" => DeviceKind::Light,
            "DimmableLight" => DeviceKind::DimmableLight,
            "Lock" => DeviceKind::Lock,
            "SecureLock" => DeviceKind::SecureLock,
            "Outlet" => DeviceKind::Outlet,
            "Fan" => DeviceKind::Fan,
            "DoorWindowSensor" => DeviceKind::DoorWindowSensor,
            "AlarmDoorWindowSensor" => DeviceKind::AlarmDoorWindowSensor,
            "AlarmPanel" => DeviceKind::AlarmPanel,
            other => DeviceKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// The unique controller address
    pub address: Address,
    /// The user-assigned device name
    pub name: String,
    /// The device class tag
    pub kind: DeviceKind,
    /// Human readable model description
    pub friendly_name: String,
}

impl DeviceInfo {
    /// Create device information
    pub fn new<A, N, F>(address: A, name: N, kind: DeviceKind, friendly_name: F) -> Self
    where
        A: Into<Address>,
        N: Into<String>,
        F: Into<String>,
    {
        Self {
            address: address.into(),
            name: name.into(),
            kind,
            friendly_name: friendly_name.into(),
        }
    }
}

/// The core device trait
pub trait Device: Send + Sync + Debug {
    /// Get the device information
    fn info(&self) -> &DeviceInfo;

    /// Get the device address
    fn address(&self) -> &Address {
        &self.info().address
    }

    /// Get the device name
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Get the device class tag
    fn kind(&self) -> &DeviceKind {
        &self.info().kind
    }

    /// Get the model description
    fn friendly_name(&self) -> &str {
        &self.info().friendly_name
    }
}

/// A light, optionally dimmable
#[async_trait]
pub trait LightDevice: Device {
    /// Whether the light is on
    fn current_light_state(&self) -> bool;

    /// Current dim level, 0-100
    fn current_light_dim_state(&self) -> u8;

    /// Switch the light on or off
    async fn send_light_command(&self, on: bool) -> Result<()>;

    /// Set the dim level, 0-100
    async fn send_light_dim_command(&self, level: u8) -> Result<()>;
}

/// A door lock
#[async_trait]
pub trait LockDevice: Device {
    /// Whether the lock is locked
    fn current_lock_state(&self) -> bool;

    /// Lock (`true`) or unlock (`false`)
    async fn send_lock_command(&self, locked: bool) -> Result<()>;
}

/// A switched outlet
#[async_trait]
pub trait OutletDevice: Device {
    /// Whether the outlet is on
    fn current_outlet_state(&self) -> bool;

    /// Switch the outlet on or off
    async fn send_outlet_command(&self, on: bool) -> Result<()>;
}

/// A multi-speed fan
#[async_trait]
pub trait FanDevice: Device {
    /// Current speed in the controller's vocabulary ("Off", "Low", "Medium", "High")
    ///
    /// The value is passed through untouched, so it may hold words outside
    /// [`FanSpeed`].
    fn current_fan_state(&self) -> String;

    /// Set the fan speed
    async fn send_fan_command(&self, speed: FanSpeed) -> Result<()>;
}

/// A door/window contact sensor
pub trait ContactSensorDevice: Device {
    /// `true` when the door or window is open
    fn current_door_window_state(&self) -> bool;
}

/// An alarm system panel
#[async_trait]
pub trait AlarmPanelDevice: Device {
    /// Current trip state
    fn alarm_trip_state(&self) -> AlarmTripState;

    /// Current arm mode
    fn alarm_mode(&self) -> AlarmMode;

    /// Change the arm mode
    async fn send_set_alarm_mode_command(&self, mode: AlarmMode) -> Result<()>;
}

/// Fan speeds understood by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FanSpeed {
    /// Stopped
    Off,
    /// Low speed
    Low,
    /// Medium speed
    Medium,
    /// High speed
    High,
}

impl FanSpeed {
    /// All speeds, slowest first
    pub const ALL: [FanSpeed; 4] = [FanSpeed::Off, FanSpeed::Low, FanSpeed::Medium, FanSpeed::High];

    /// The controller's word for the speed
    pub fn as_str(&self) -> &'static str {
        match self {
            FanSpeed::Off => "Off",
            FanSpeed::Low => "Low",
            FanSpeed::Medium => "Medium",
            FanSpeed::High => "High",
        }
    }

    /// Parse the controller's word for a speed
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Off" => Some(FanSpeed::Off),
            "Low" => Some(FanSpeed::Low),
            "Medium" => Some(FanSpeed::Medium),
            "High" => Some(FanSpeed::High),
            _ => None,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alarm arm modes, numbered as the panel reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmMode {
    /// Not armed
    Disarmed,
    /// Armed away
    Away,
    /// Armed stay
    Stay,
    /// Armed stay, no entry delay
    StayInstant,
    /// Armed night
    Night,
    /// Armed night, no entry delay
    NightInstant,
    /// Armed vacation
    Vacation,
    /// Any other mode reported by the panel
    Other(u8),
}

impl AlarmMode {
    /// Decode a panel mode number
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => AlarmMode::Disarmed,
            1 => AlarmMode::Away,
            2 => AlarmMode::Stay,
            3 => AlarmMode::StayInstant,
            4 => AlarmMode::Night,
            5 => AlarmMode::NightInstant,
            6 => AlarmMode::Vacation,
            other => AlarmMode::Other(other),
        }
    }

    /// The panel mode number
    pub fn code(self) -> u8 {
        match self {
            AlarmMode::Disarmed => 0,
            AlarmMode::Away => 1,
            AlarmMode::Stay => 2,
            AlarmMode::StayInstant => 3,
            AlarmMode::Night => 4,
            AlarmMode::NightInstant => 5,
            AlarmMode::Vacation => 6,
            AlarmMode::Other(code) => code,
        }
    }
}

/// Alarm trip states, numbered as the panel reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmTripState {
    /// Panel disarmed
    Disarmed,
    /// Exit delay running after arming
    ExitDelay,
    /// Alarm tripped
    Tripped,
    /// Any other state reported by the panel
    Other(u8),
}

impl AlarmTripState {
    /// Decode a panel trip state number
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => AlarmTripState::Disarmed,
            1 => AlarmTripState::ExitDelay,
            2 => AlarmTripState::Tripped,
            other => AlarmTripState::Other(other),
        }
    }
}

/// A registry device, tagged with the class trait it implements
#[derive(Debug, Clone)]
pub enum DeviceHandle {
    /// Light or dimmable light
    Light(Arc<dyn LightDevice>),
    /// Lock or secure lock
    Lock(Arc<dyn LockDevice>),
    /// Outlet
    Outlet(Arc<dyn OutletDevice>),
    /// Fan
    Fan(Arc<dyn FanDevice>),
    /// Door/window sensor, plain or alarm zone
    ContactSensor(Arc<dyn ContactSensorDevice>),
    /// Alarm panel
    AlarmPanel(Arc<dyn AlarmPanelDevice>),
    /// A class the bridge has no adapter for
    Unsupported(Arc<dyn Device>),
}

impl DeviceHandle {
    /// Information of the wrapped device
    pub fn info(&self) -> &DeviceInfo {
        match self {
            DeviceHandle::Light(d) => d.info(),
            DeviceHandle::Lock(d) => d.info(),
            DeviceHandle::Outlet(d) => d.info(),
            DeviceHandle::Fan(d) => d.info(),
            DeviceHandle::ContactSensor(d) => d.info(),
            DeviceHandle::AlarmPanel(d) => d.info(),
            DeviceHandle::Unsupported(d) => d.info(),
        }
    }

    /// Address of the wrapped device
    pub fn address(&self) -> &Address {
        &self.info().address
    }

    /// Name of the wrapped device
    pub fn name(&self) -> &str {
        &self.info().name
    }

    /// Class tag of the wrapped device
    pub fn kind(&self) -> &DeviceKind {
        &self.info().kind
    }
}
