/*!
 * Accessory characteristics and their enumerated values.
 *
 * Characteristic values travel as [`Value`]s. The enumerated characteristics
 * (lock, contact sensor, security system) use the integer codes of the
 * accessory protocol, modelled here as enums with `code`/`from_code`.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

use hapbridge_core::types::Value;

use crate::error::{Error, Result};

/// Whether the host may write a characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// Read and notify only
    ReadOnly,
    /// Read, write and notify
    ReadWrite,
}

impl Access {
    /// Whether writes are allowed
    pub fn is_writable(self) -> bool {
        self == Access::ReadWrite
    }
}

/// The characteristics adapters expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicKind {
    /// Accessory name
    Name,
    /// Manufacturer name
    Manufacturer,
    /// Model description
    Model,
    /// Serial number
    SerialNumber,
    /// Power state
    On,
    /// Light level, 0-100
    Brightness,
    /// Whether something is plugged into an outlet
    OutletInUse,
    /// Requested lock state
    LockTargetState,
    /// Actual lock state
    LockCurrentState,
    /// Fan speed, 0-100
    RotationSpeed,
    /// Contact sensor reading
    ContactSensorState,
    /// Requested security system state
    SecuritySystemTargetState,
    /// Actual security system state
    SecuritySystemCurrentState,
}

impl CharacteristicKind {
    /// Characteristic name
    pub fn as_str(self) -> &'static str {
        match self {
            CharacteristicKind::Name => "Name",
            CharacteristicKind::Manufacturer => "Manufacturer",
            CharacteristicKind::Model => "Model",
            CharacteristicKind::SerialNumber => "SerialNumber",
            CharacteristicKind::On => "On",
            CharacteristicKind::Brightness => "Brightness",
            CharacteristicKind::OutletInUse => "OutletInUse",
            CharacteristicKind::LockTargetState => "LockTargetState",
            CharacteristicKind::LockCurrentState => "LockCurrentState",
            CharacteristicKind::RotationSpeed => "RotationSpeed",
            CharacteristicKind::ContactSensorState => "ContactSensorState",
            CharacteristicKind::SecuritySystemTargetState => "SecuritySystemTargetState",
            CharacteristicKind::SecuritySystemCurrentState => "SecuritySystemCurrentState",
        }
    }

    /// Host access to the characteristic
    pub fn access(self) -> Access {
        match self {
            CharacteristicKind::On
            | CharacteristicKind::Brightness
            | CharacteristicKind::LockTargetState
            | CharacteristicKind::RotationSpeed
            | CharacteristicKind::SecuritySystemTargetState => Access::ReadWrite,
            CharacteristicKind::Name
            | CharacteristicKind::Manufacturer
            | CharacteristicKind::Model
            | CharacteristicKind::SerialNumber
            | CharacteristicKind::OutletInUse
            | CharacteristicKind::LockCurrentState
            | CharacteristicKind::ContactSensorState
            | CharacteristicKind::SecuritySystemCurrentState => Access::ReadOnly,
        }
    }

    /// Extract a boolean written by the host
    ///
    /// Integers 0 and 1 are accepted as well.
    pub fn expect_bool(self, value: &Value) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| Error::invalid_value(self, "a boolean", value))
    }

    /// Extract a 0-100 percentage written by the host, rounding fractions
    pub fn expect_percent(self, value: &Value) -> Result<u8> {
        match value.as_float() {
            Some(pct) if (0.0..=100.0).contains(&pct) => Ok(pct.round() as u8),
            _ => Err(Error::invalid_value(self, "a percentage between 0 and 100", value)),
        }
    }

    /// Extract an enumeration code written by the host
    pub fn expect_code(self, value: &Value) -> Result<u8> {
        value
            .as_integer()
            .and_then(|code| u8::try_from(code).ok())
            .ok_or_else(|| Error::invalid_value(self, "an integer state code", value))
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock target and current state values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// Unlocked
    Unsecured = 0,
    /// Locked
    Secured = 1,
}

impl LockState {
    /// State for a device lock reading
    pub fn from_locked(locked: bool) -> Self {
        if locked {
            LockState::Secured
        } else {
            LockState::Unsecured
        }
    }

    /// Decode a protocol code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(LockState::Unsecured),
            1 => Some(LockState::Secured),
            _ => None,
        }
    }

    /// The protocol code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether the state means locked
    pub fn is_locked(self) -> bool {
        self == LockState::Secured
    }
}

/// Contact sensor state values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactSensorState {
    /// Contact made, the door or window is closed
    ContactDetected = 0,
    /// No contact, the door or window is open
    ContactNotDetected = 1,
}

impl ContactSensorState {
    /// State for a device door/window reading, `true` meaning open
    pub fn from_open(open: bool) -> Self {
        if open {
            ContactSensorState::ContactNotDetected
        } else {
            ContactSensorState::ContactDetected
        }
    }

    /// The protocol code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Security system current state values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecuritySystemCurrentState {
    /// Armed, occupants home
    StayArm = 0,
    /// Armed, nobody home
    AwayArm = 1,
    /// Armed for the night
    NightArm = 2,
    /// Not armed
    Disarmed = 3,
    /// Alarm sounding
    AlarmTriggered = 4,
}

impl SecuritySystemCurrentState {
    /// The protocol code
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Security system target state values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecuritySystemTargetState {
    /// Arm, occupants home
    StayArm = 0,
    /// Arm, nobody home
    AwayArm = 1,
    /// Arm for the night
    NightArm = 2,
    /// Disarm
    Disarm = 3,
}

impl SecuritySystemTargetState {
    /// Decode a protocol code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SecuritySystemTargetState::StayArm),
            1 => Some(SecuritySystemTargetState::AwayArm),
            2 => Some(SecuritySystemTargetState::NightArm),
            3 => Some(SecuritySystemTargetState::Disarm),
            _ => None,
        }
    }

    /// The protocol code
    pub fn code(self) -> u8 {
        self as u8
    }
}
