/*!
 * Simulated alarm panel.
 */
use async_trait::async_trait;

use crate::device::{AlarmMode, AlarmPanelDevice, AlarmTripState, DeviceInfo, Result};
use crate::devices::simulated::{DeviceCommand, SimulatedDevice};
use crate::registry::ChangeNotifier;

/// Trip state and arm mode of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmState {
    /// Current trip state
    pub trip_state: AlarmTripState,
    /// Current arm mode
    pub mode: AlarmMode,
}

impl Default for AlarmState {
    fn default() -> Self {
        Self {
            trip_state: AlarmTripState::Disarmed,
            mode: AlarmMode::Disarmed,
        }
    }
}

/// A simulated alarm panel
pub type SimulatedAlarmPanel = SimulatedDevice<AlarmState>;

impl SimulatedDevice<AlarmState> {
    /// Create a disarmed panel
    pub fn new(info: DeviceInfo, notifier: ChangeNotifier) -> Self {
        Self::with_state(info, AlarmState::default(), notifier)
    }

    /// Simulate the panel changing on its own (keypad arming, a zone tripping)
    pub fn simulate_alarm(&self, trip_state: AlarmTripState, mode: AlarmMode) -> Result<usize> {
        self.simulate_external_change(|state| {
            state.trip_state = trip_state;
            state.mode = mode;
        })
    }
}

#[async_trait]
impl AlarmPanelDevice for SimulatedDevice<AlarmState> {
    fn alarm_trip_state(&self) -> AlarmTripState {
        self.read(|state| state.trip_state)
    }

    fn alarm_mode(&self) -> AlarmMode {
        self.read(|state| state.mode)
    }

    async fn send_set_alarm_mode_command(&self, mode: AlarmMode) -> Result<()> {
        self.execute(DeviceCommand::AlarmMode(mode), move |state| state.mode = mode)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::registry::MemoryRegistry;

    #[tokio::test]
    async fn test_arm_mode_command() -> Result<()> {
        let registry = MemoryRegistry::new();
        let panel = SimulatedAlarmPanel::new(
            DeviceInfo::new("ELK 1", "House Alarm", DeviceKind::AlarmPanel, "ELK M1"),
            registry.notifier(),
        );

        panel.send_set_alarm_mode_command(AlarmMode::Night).await?;
        assert_eq!(panel.alarm_mode(), AlarmMode::Night);
        assert_eq!(panel.alarm_trip_state(), AlarmTripState::Disarmed);

        panel.simulate_alarm(AlarmTripState::Tripped, AlarmMode::Night)?;
        assert_eq!(panel.alarm_trip_state(), AlarmTripState::Tripped);
        assert_eq!(panel.command_count(), 1);
        Ok(())
    }
}
