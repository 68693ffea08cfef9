/*!
 * Simulated light.
 */
use async_trait::async_trait;

use crate::device::{DeviceInfo, LightDevice, Result};
use crate::devices::simulated::{DeviceCommand, SimulatedDevice};
use crate::registry::ChangeNotifier;

/// Power and dim level of a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightState {
    /// Whether the light is on
    pub on: bool,
    /// Dim level, 0-100
    pub level: u8,
}

/// A simulated light, dimmable when its kind is `DimmableLight`
pub type SimulatedLight = SimulatedDevice<LightState>;

impl SimulatedDevice<LightState> {
    /// Create a light that starts off
    pub fn new(info: DeviceInfo, notifier: ChangeNotifier) -> Self {
        Self::with_state(info, LightState::default(), notifier)
    }

    /// Simulate someone operating the wall switch
    pub fn simulate_light(&self, on: bool, level: u8) -> Result<usize> {
        self.simulate_external_change(|state| {
            state.on = on;
            state.level = level.min(100);
        })
    }
}

#[async_trait]
impl LightDevice for SimulatedDevice<LightState> {
    fn current_light_state(&self) -> bool {
        self.read(|state| state.on)
    }

    fn current_light_dim_state(&self) -> u8 {
        self.read(|state| state.level)
    }

    async fn send_light_command(&self, on: bool) -> Result<()> {
        self.execute(DeviceCommand::Light(on), move |state| {
            state.on = on;
            // The controller restores full brightness when switched on from zero
            state.level = match (on, state.level) {
                (false, _) => 0,
                (true, 0) => 100,
                (true, level) => level,
            };
        })
        .await
    }

    async fn send_light_dim_command(&self, level: u8) -> Result<()> {
        let level = level.min(100);
        self.execute(DeviceCommand::LightDim(level), move |state| {
            state.level = level;
            state.on = level > 0;
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceKind};
    use crate::registry::{DeviceRegistry, MemoryRegistry};

    fn dimmer(registry: &MemoryRegistry) -> SimulatedLight {
        SimulatedLight::new(
            DeviceInfo::new("12 AB 34 1", "Den Lamp", DeviceKind::DimmableLight, "LampLinc"),
            registry.notifier(),
        )
    }

    #[tokio::test]
    async fn test_commands_change_state_and_are_recorded() -> Result<()> {
        let registry = MemoryRegistry::new();
        let light = dimmer(&registry);

        light.send_light_command(true).await?;
        assert!(light.current_light_state());
        assert_eq!(light.current_light_dim_state(), 100);

        light.send_light_dim_command(40).await?;
        assert_eq!(light.current_light_dim_state(), 40);

        light.send_light_dim_command(0).await?;
        assert!(!light.current_light_state());

        assert_eq!(
            light.commands(),
            vec![
                DeviceCommand::Light(true),
                DeviceCommand::LightDim(40),
                DeviceCommand::LightDim(0),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_failure_keeps_state() {
        let registry = MemoryRegistry::new();
        let light = dimmer(&registry);
        light.set_fail_commands(true);

        assert!(light.send_light_command(true).await.is_err());
        assert!(!light.current_light_state());
        assert_eq!(light.command_count(), 1);
    }

    #[tokio::test]
    async fn test_external_change_is_announced() -> Result<()> {
        let registry = MemoryRegistry::new();
        let mut changes = registry.subscribe_changes()?;
        let light = dimmer(&registry);

        assert_eq!(light.simulate_light(true, 55)?, 1);
        assert_eq!(changes.recv().await.unwrap().address, *light.address());
        assert_eq!(light.state(), LightState { on: true, level: 55 });
        assert_eq!(light.command_count(), 0);
        Ok(())
    }
}
