/*!
 * hapbridge Devices
 *
 * This crate describes the controller side of the bridge: the device classes
 * the controller exposes, their native state vocabulary and commands, and the
 * registry that owns the live devices and reports out-of-band changes.
 *
 * The `devices` module holds simulated implementations that keep state in
 * memory and record the commands they receive.
 */

#![warn(missing_docs)]

pub mod device;
pub mod devices;
pub mod registry;

pub use device::{
    AlarmMode, AlarmPanelDevice, AlarmTripState, ContactSensorDevice, Device, DeviceError,
    DeviceHandle, DeviceInfo, DeviceKind, FanDevice, FanSpeed, LightDevice, LockDevice,
    OutletDevice, Result,
};
pub use registry::{DeviceChanged, DeviceRegistry, MemoryRegistry, SharedDeviceRegistry};

/// hapbridge devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
