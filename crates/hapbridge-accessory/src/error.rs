/*!
 * Error types for the hapbridge accessory crate.
 *
 * Only misuse by the accessory host surfaces as an error. Failed device
 * commands are logged by the adapters and never reach the host.
 */
use thiserror::Error;

use hapbridge_core::types::{Address, Value};

use crate::characteristic::CharacteristicKind;

/// Error type for accessory operations
#[derive(Error, Debug)]
pub enum Error {
    /// The accessory has no such characteristic
    #[error("Accessory {address} has no {characteristic} characteristic")]
    UnsupportedCharacteristic {
        /// The accessory's device address
        address: Address,
        /// The requested characteristic
        characteristic: CharacteristicKind,
    },

    /// The characteristic cannot be written
    #[error("Characteristic {characteristic} of accessory {address} is read-only")]
    ReadOnly {
        /// The accessory's device address
        address: Address,
        /// The written characteristic
        characteristic: CharacteristicKind,
    },

    /// The written value has the wrong type or is out of range
    #[error("Invalid value for {characteristic}: expected {expected}, got {value:?}")]
    InvalidValue {
        /// The written characteristic
        characteristic: CharacteristicKind,
        /// Description of the accepted values
        expected: &'static str,
        /// The rejected value
        value: Value,
    },

    /// Device error
    #[error("Device error: {0}")]
    Device(#[from] hapbridge_devices::DeviceError),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] hapbridge_core::error::Error),
}

/// Result type for accessory operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new unsupported characteristic error
    pub fn unsupported(address: &Address, characteristic: CharacteristicKind) -> Self {
        Error::UnsupportedCharacteristic {
            address: address.clone(),
            characteristic,
        }
    }

    /// Create a new read-only error
    pub fn read_only(address: &Address, characteristic: CharacteristicKind) -> Self {
        Error::ReadOnly {
            address: address.clone(),
            characteristic,
        }
    }

    /// Create a new invalid value error
    pub fn invalid_value(
        characteristic: CharacteristicKind,
        expected: &'static str,
        value: &Value,
    ) -> Self {
        Error::InvalidValue {
            characteristic,
            expected,
            value: value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let address = Address::from("12 AB 34 1");
        assert_eq!(
            Error::read_only(&address, CharacteristicKind::ContactSensorState).to_string(),
            "Characteristic ContactSensorState of accessory 12 AB 34 1 is read-only"
        );
        assert_eq!(
            Error::invalid_value(CharacteristicKind::On, "a boolean", &Value::from("yes"))
                .to_string(),
            "Invalid value for On: expected a boolean, got String(\"yes\")"
        );
    }
}
