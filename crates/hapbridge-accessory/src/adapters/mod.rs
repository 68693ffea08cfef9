/*!
 * Device-class adapters.
 *
 * One adapter per device class translates between the controller's state
 * vocabulary and the accessory characteristics, and suppresses commands that
 * would not change the device.
 */

pub mod alarm_panel;
pub mod contact_sensor;
pub mod fan;
pub mod light;
pub mod lock;
pub mod outlet;

pub use alarm_panel::AlarmPanelAccessory;
pub use contact_sensor::ContactSensorAccessory;
pub use fan::FanAccessory;
pub use light::LightAccessory;
pub use lock::LockAccessory;
pub use outlet::OutletAccessory;
