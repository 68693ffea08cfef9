/*!
 * Simulated controller devices.
 *
 * Each device keeps its state in memory, records every command it receives
 * and can simulate an out-of-band change, which is announced through the
 * owning registry's [`ChangeNotifier`](crate::registry::ChangeNotifier).
 */

pub mod alarm;
pub mod fan;
pub mod light;
pub mod simulated;
pub mod switched;

pub use alarm::{AlarmState, SimulatedAlarmPanel};
pub use fan::{FanState, SimulatedFan};
pub use light::{LightState, SimulatedLight};
pub use simulated::{DeviceCommand, SimulatedDevice};
pub use switched::{
    ContactState, LockState, OutletState, SimulatedContactSensor, SimulatedLock, SimulatedOutlet,
};
