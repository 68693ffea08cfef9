/*!
 * Simulated fan.
 */
use async_trait::async_trait;

use crate::device::{DeviceInfo, FanDevice, FanSpeed, Result};
use crate::devices::simulated::{DeviceCommand, SimulatedDevice};
use crate::registry::ChangeNotifier;

/// Fan speed as the controller reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanState {
    /// Speed word, normally one of [`FanSpeed`]'s words
    pub speed: String,
}

impl Default for FanState {
    fn default() -> Self {
        Self {
            speed: FanSpeed::Off.as_str().to_string(),
        }
    }
}

/// A simulated fan
pub type SimulatedFan = SimulatedDevice<FanState>;

impl SimulatedDevice<FanState> {
    /// Create a fan that starts off
    pub fn new(info: DeviceInfo, notifier: ChangeNotifier) -> Self {
        Self::with_state(info, FanState::default(), notifier)
    }

    /// Simulate the fan being changed at its wall control
    ///
    /// Any word is accepted so that unknown controller values can be simulated.
    pub fn simulate_fan_state<S: Into<String>>(&self, speed: S) -> Result<usize> {
        let speed = speed.into();
        self.simulate_external_change(move |state| state.speed = speed)
    }
}

#[async_trait]
impl FanDevice for SimulatedDevice<FanState> {
    fn current_fan_state(&self) -> String {
        self.read(|state| state.speed.clone())
    }

    async fn send_fan_command(&self, speed: FanSpeed) -> Result<()> {
        self.execute(DeviceCommand::Fan(speed), move |state| {
            state.speed = speed.as_str().to_string()
        })
        .await
    }
}
