/*!
 * hapbridge Accessory
 *
 * This crate is the state-translation layer of the bridge. It wraps each
 * controller device in a device-class adapter exposing accessory services and
 * characteristics, suppresses commands that would not change a device, and
 * routes out-of-band device changes back to the adapter that owns the device.
 *
 * The accessory host drives it through [`Platform::enumerate_accessories`],
 * the [`Accessory`] trait and the [`CharacteristicEvent`]s published on the
 * shared event bus.
 */

#![warn(missing_docs)]

// Re-export core types
pub use hapbridge_core::prelude;
pub use hapbridge_core::types::{Address, Value};

pub mod accessory;
pub mod adapters;
pub mod characteristic;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod index;
pub mod platform;
pub mod service;

// Re-export main types for convenience
pub use accessory::{Accessory, AccessoryBase, MANUFACTURER};
pub use adapters::{
    AlarmPanelAccessory, ContactSensorAccessory, FanAccessory, LightAccessory, LockAccessory,
    OutletAccessory,
};
pub use characteristic::{
    Access, CharacteristicKind, ContactSensorState, LockState, SecuritySystemCurrentState,
    SecuritySystemTargetState,
};
pub use dispatch::ChangeDispatcher;
pub use error::{Error, Result};
pub use filter::FilterEngine;
pub use index::AddressIndex;
pub use platform::Platform;
pub use service::{Characteristic, CharacteristicEvent, Service, ServiceKind};

/// hapbridge accessory crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the accessory layer
pub fn init() -> Result<()> {
    tracing::info!("hapbridge accessory {} initialized", VERSION);
    Ok(())
}
