/*!
 * Simulated two-state devices: locks, outlets and contact sensors.
 */
use async_trait::async_trait;

use crate::device::{ContactSensorDevice, DeviceInfo, LockDevice, OutletDevice, Result};
use crate::devices::simulated::{DeviceCommand, SimulatedDevice};
use crate::registry::ChangeNotifier;

/// Lock bolt position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockState {
    /// Whether the bolt is thrown
    pub locked: bool,
}

/// Outlet relay position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutletState {
    /// Whether the relay is closed
    pub on: bool,
}

/// Contact sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactState {
    /// Whether the door or window is open
    pub open: bool,
}

/// A simulated lock
pub type SimulatedLock = SimulatedDevice<LockState>;

/// A simulated outlet
pub type SimulatedOutlet = SimulatedDevice<OutletState>;

/// A simulated door/window sensor
pub type SimulatedContactSensor = SimulatedDevice<ContactState>;

impl SimulatedDevice<LockState> {
    /// Create an unlocked lock
    pub fn new(info: DeviceInfo, notifier: ChangeNotifier) -> Self {
        Self::with_state(info, LockState::default(), notifier)
    }

    /// Simulate the lock being operated by hand
    pub fn simulate_lock(&self, locked: bool) -> Result<usize> {
        self.simulate_external_change(|state| state.locked = locked)
    }
}

#[async_trait]
impl LockDevice for SimulatedDevice<LockState> {
    fn current_lock_state(&self) -> bool {
        self.read(|state| state.locked)
    }

    async fn send_lock_command(&self, locked: bool) -> Result<()> {
        self.execute(DeviceCommand::Lock(locked), move |state| state.locked = locked)
            .await
    }
}

impl SimulatedDevice<OutletState> {
    /// Create an outlet that starts off
    pub fn new(info: DeviceInfo, notifier: ChangeNotifier) -> Self {
        Self::with_state(info, OutletState::default(), notifier)
    }

    /// Simulate the outlet's local button being pressed
    pub fn simulate_outlet(&self, on: bool) -> Result<usize> {
        self.simulate_external_change(|state| state.on = on)
    }
}

#[async_trait]
impl OutletDevice for SimulatedDevice<OutletState> {
    fn current_outlet_state(&self) -> bool {
        self.read(|state| state.on)
    }

    async fn send_outlet_command(&self, on: bool) -> Result<()> {
        self.execute(DeviceCommand::Outlet(on), move |state| state.on = on)
            .await
    }
}

impl SimulatedDevice<ContactState> {
    /// Create a sensor reporting closed
    pub fn new(info: DeviceInfo, notifier: ChangeNotifier) -> Self {
        Self::with_state(info, ContactState::default(), notifier)
    }

    /// Simulate the door or window opening or closing
    pub fn simulate_door_window(&self, open: bool) -> Result<usize> {
        self.simulate_external_change(|state| state.open = open)
    }
}

impl ContactSensorDevice for SimulatedDevice<ContactState> {
    fn current_door_window_state(&self) -> bool {
        self.read(|state| state.open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::registry::MemoryRegistry;

    #[tokio::test]
    async fn test_lock_commands() -> Result<()> {
        let registry = MemoryRegistry::new();
        let lock = SimulatedLock::new(
            DeviceInfo::new("1A 2B 3C 1", "Front Door", DeviceKind::Lock, "MorningLinc"),
            registry.notifier(),
        );

        lock.send_lock_command(true).await?;
        assert!(lock.current_lock_state());
        assert_eq!(lock.commands(), vec![DeviceCommand::Lock(true)]);
        Ok(())
    }

    #[test]
    fn test_outlet_external_change() -> Result<()> {
        let registry = MemoryRegistry::new();
        let outlet = SimulatedOutlet::new(
            DeviceInfo::new("1A 2B 3C 2", "Porch", DeviceKind::Outlet, "OutletLinc"),
            registry.notifier(),
        );

        outlet.simulate_outlet(true)?;
        assert!(outlet.current_outlet_state());
        assert_eq!(outlet.command_count(), 0);
        Ok(())
    }

    #[test]
    fn test_contact_sensor_reads_open() -> Result<()> {
        let registry = MemoryRegistry::new();
        let sensor = SimulatedContactSensor::new(
            DeviceInfo::new("1A 2B 3C 3", "Back Door", DeviceKind::DoorWindowSensor, "TriggerLinc"),
            registry.notifier(),
        );

        assert!(!sensor.current_door_window_state());
        sensor.simulate_door_window(true)?;
        assert!(sensor.current_door_window_state());
        Ok(())
    }

    #[test]
    fn test_command_with_block_on() {
        let registry = MemoryRegistry::new();
        let outlet = SimulatedOutlet::new(
            DeviceInfo::new("1A 2B 3C 4", "Lamp Outlet", DeviceKind::Outlet, "OutletLinc"),
            registry.notifier(),
        );
        tokio_test::block_on(outlet.send_outlet_command(true)).unwrap();
        assert!(outlet.current_outlet_state());
    }
}
