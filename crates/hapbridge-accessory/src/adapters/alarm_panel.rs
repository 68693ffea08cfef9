/*!
 * Alarm panel adapter.
 *
 * The current state looks at the trip state first and falls back to the arm
 * mode; the target state is derived from the arm mode alone. A target write
 * is compared against the target derived from the panel's present arm mode.
 */
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{AlarmMode, AlarmPanelDevice, AlarmTripState, Device};

use crate::accessory::{Accessory, AccessoryBase};
use crate::characteristic::{
    CharacteristicKind, SecuritySystemCurrentState, SecuritySystemTargetState,
};
use crate::error::{Error, Result};
use crate::service::{Service, ServiceKind};

/// Current security state of a panel reading
pub fn current_state(trip_state: AlarmTripState, mode: AlarmMode) -> SecuritySystemCurrentState {
    match trip_state {
        AlarmTripState::Tripped => SecuritySystemCurrentState::AlarmTriggered,
        AlarmTripState::Disarmed | AlarmTripState::ExitDelay => {
            SecuritySystemCurrentState::Disarmed
        }
        AlarmTripState::Other(_) => match mode {
            AlarmMode::Stay | AlarmMode::StayInstant => SecuritySystemCurrentState::StayArm,
            AlarmMode::Away | AlarmMode::Vacation => SecuritySystemCurrentState::AwayArm,
            AlarmMode::Night | AlarmMode::NightInstant => SecuritySystemCurrentState::NightArm,
            AlarmMode::Disarmed | AlarmMode::Other(_) => SecuritySystemCurrentState::Disarmed,
        },
    }
}

/// Target security state of an arm mode
pub fn target_state(mode: AlarmMode) -> SecuritySystemTargetState {
    match mode {
        AlarmMode::Stay | AlarmMode::StayInstant => SecuritySystemTargetState::StayArm,
        AlarmMode::Away | AlarmMode::Vacation => SecuritySystemTargetState::AwayArm,
        AlarmMode::Night | AlarmMode::NightInstant => SecuritySystemTargetState::NightArm,
        AlarmMode::Disarmed | AlarmMode::Other(_) => SecuritySystemTargetState::Disarm,
    }
}

/// Arm mode to request for a target state
pub fn target_mode(target: SecuritySystemTargetState) -> AlarmMode {
    match target {
        SecuritySystemTargetState::StayArm => AlarmMode::Stay,
        SecuritySystemTargetState::AwayArm => AlarmMode::Away,
        SecuritySystemTargetState::NightArm => AlarmMode::Night,
        SecuritySystemTargetState::Disarm => AlarmMode::Disarmed,
    }
}

/// Exposes an alarm panel as a security system
#[derive(Debug)]
pub struct AlarmPanelAccessory {
    base: AccessoryBase,
    device: Arc<dyn AlarmPanelDevice>,
}

impl AlarmPanelAccessory {
    /// Wrap an alarm panel
    pub fn new(device: Arc<dyn AlarmPanelDevice>, bus: SharedEventBus) -> Self {
        Self {
            base: AccessoryBase::new("alarm_panel", device.info().clone(), bus),
            device,
        }
    }

    /// The panel's current security state
    pub fn current_state(&self) -> SecuritySystemCurrentState {
        current_state(self.device.alarm_trip_state(), self.device.alarm_mode())
    }

    /// The panel's target security state
    pub fn target_state(&self) -> SecuritySystemTargetState {
        target_state(self.device.alarm_mode())
    }

    async fn set_target_state(&self, target: SecuritySystemTargetState) {
        debug!("Setting alarm target state to {:?}", target);
        if target == self.target_state() {
            debug!("Alarm already targeting {:?}", target);
            return;
        }
        let mode = target_mode(target);
        info!("Changing alarm mode to {:?}", mode);
        self.base.complete(
            "alarm_mode",
            self.device.send_set_alarm_mode_command(mode).await,
        );
    }
}

#[async_trait]
impl Accessory for AlarmPanelAccessory {
    fn address(&self) -> &Address {
        self.base.address()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    async fn identify(&self) -> Result<()> {
        Ok(())
    }

    fn services(&self) -> &[Service] {
        self.base.services_or_init(|| {
            vec![self
                .base
                .service(ServiceKind::SecuritySystem)
                .with_characteristic(
                    CharacteristicKind::SecuritySystemTargetState,
                    self.target_state().code(),
                )
                .with_characteristic(
                    CharacteristicKind::SecuritySystemCurrentState,
                    self.current_state().code(),
                )]
        })
    }

    fn read(&self, characteristic: CharacteristicKind) -> Result<Value> {
        match characteristic {
            CharacteristicKind::SecuritySystemTargetState => {
                Ok(Value::from(self.target_state().code()))
            }
            CharacteristicKind::SecuritySystemCurrentState => {
                Ok(Value::from(self.current_state().code()))
            }
            other => self
                .base
                .read_information(other)
                .ok_or_else(|| self.base.unsupported(other)),
        }
    }

    async fn write(&self, characteristic: CharacteristicKind, value: Value) -> Result<()> {
        self.base.check_writable(self.services(), characteristic)?;
        match characteristic {
            CharacteristicKind::SecuritySystemTargetState => {
                let code = characteristic.expect_code(&value)?;
                let target = SecuritySystemTargetState::from_code(code).ok_or_else(|| {
                    Error::invalid_value(characteristic, "a code from 0 to 3", &value)
                })?;
                self.set_target_state(target)
                    .instrument(self.base.span().clone())
                    .await;
                Ok(())
            }
            other => Err(self.base.unsupported(other)),
        }
    }

    fn handle_external_change(&self) {
        let _entered = self.base.span().enter();
        let services = self.services();
        self.base.push(
            services,
            CharacteristicKind::SecuritySystemTargetState,
            self.target_state().code(),
        );
        self.base.push(
            services,
            CharacteristicKind::SecuritySystemCurrentState,
            self.current_state().code(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hapbridge_devices::devices::{DeviceCommand, SimulatedAlarmPanel};
    use hapbridge_devices::{DeviceInfo, DeviceKind, MemoryRegistry};

    const ALL_MODES: [AlarmMode; 7] = [
        AlarmMode::Disarmed,
        AlarmMode::Away,
        AlarmMode::Stay,
        AlarmMode::StayInstant,
        AlarmMode::Night,
        AlarmMode::NightInstant,
        AlarmMode::Vacation,
    ];

    fn panel() -> Arc<SimulatedAlarmPanel> {
        let registry = MemoryRegistry::new();
        Arc::new(SimulatedAlarmPanel::new(
            DeviceInfo::new("ELK 1", "House Alarm", DeviceKind::AlarmPanel, "ELK M1"),
            registry.notifier(),
        ))
    }

    #[test]
    fn test_tripped_wins_over_every_mode() {
        for mode in ALL_MODES {
            assert_eq!(
                current_state(AlarmTripState::Tripped, mode),
                SecuritySystemCurrentState::AlarmTriggered
            );
        }
    }

    #[test]
    fn test_current_state_mapping() {
        let armed = AlarmTripState::Other(3);
        assert_eq!(current_state(armed, AlarmMode::StayInstant), SecuritySystemCurrentState::StayArm);
        assert_eq!(current_state(armed, AlarmMode::Vacation), SecuritySystemCurrentState::AwayArm);
        assert_eq!(current_state(armed, AlarmMode::NightInstant), SecuritySystemCurrentState::NightArm);
        assert_eq!(current_state(armed, AlarmMode::Disarmed), SecuritySystemCurrentState::Disarmed);
        assert_eq!(
            current_state(AlarmTripState::ExitDelay, AlarmMode::Away),
            SecuritySystemCurrentState::Disarmed
        );
    }

    #[test]
    fn test_unknown_mode_reads_as_disarmed() {
        let unknown = AlarmMode::from_code(9);
        assert_eq!(unknown, AlarmMode::Other(9));
        assert_eq!(
            current_state(AlarmTripState::Other(3), unknown),
            SecuritySystemCurrentState::Disarmed
        );
        assert_eq!(target_state(unknown), SecuritySystemTargetState::Disarm);
        assert_eq!(
            current_state(AlarmTripState::Tripped, unknown),
            SecuritySystemCurrentState::AlarmTriggered
        );
    }

    #[tokio::test]
    async fn test_disarm_write_on_unknown_mode_is_suppressed() -> Result<()> {
        let device = panel();
        device.simulate_alarm(AlarmTripState::Other(3), AlarmMode::Other(9))?;
        let accessory = AlarmPanelAccessory::new(device.clone(), SharedEventBus::new());

        assert_eq!(
            accessory.read(CharacteristicKind::SecuritySystemTargetState)?,
            Value::from(SecuritySystemTargetState::Disarm.code())
        );
        accessory
            .write(
                CharacteristicKind::SecuritySystemTargetState,
                Value::from(SecuritySystemTargetState::Disarm.code()),
            )
            .await?;
        assert_eq!(device.command_count(), 0);
        Ok(())
    }

    #[test]
    fn test_target_round_trip() {
        for code in 0..=3 {
            let target = SecuritySystemTargetState::from_code(code).unwrap();
            assert_eq!(target_state(target_mode(target)), target);
        }
    }

    #[tokio::test]
    async fn test_target_write_uses_requested_state() -> Result<()> {
        let device = panel();
        let accessory = AlarmPanelAccessory::new(device.clone(), SharedEventBus::new());

        accessory
            .write(
                CharacteristicKind::SecuritySystemTargetState,
                Value::from(SecuritySystemTargetState::NightArm.code()),
            )
            .await?;
        assert_eq!(device.commands(), vec![DeviceCommand::AlarmMode(AlarmMode::Night)]);

        // Night-instant already targets night arm
        device.simulate_alarm(AlarmTripState::Other(3), AlarmMode::NightInstant)?;
        accessory
            .write(
                CharacteristicKind::SecuritySystemTargetState,
                Value::from(SecuritySystemTargetState::NightArm.code()),
            )
            .await?;
        assert_eq!(device.command_count(), 1);

        accessory
            .write(
                CharacteristicKind::SecuritySystemTargetState,
                Value::from(SecuritySystemTargetState::Disarm.code()),
            )
            .await?;
        assert_eq!(
            device.commands().last(),
            Some(&DeviceCommand::AlarmMode(AlarmMode::Disarmed))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_target_code() {
        let accessory = AlarmPanelAccessory::new(panel(), SharedEventBus::new());
        assert!(matches!(
            accessory
                .write(CharacteristicKind::SecuritySystemTargetState, Value::Integer(4))
                .await,
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_external_change_pushes_both_states() -> Result<()> {
        let device = panel();
        let accessory = AlarmPanelAccessory::new(device.clone(), SharedEventBus::new());

        device.simulate_alarm(AlarmTripState::Tripped, AlarmMode::Away)?;
        accessory.handle_external_change();

        let service = &accessory.services()[1];
        assert_eq!(
            service.value(CharacteristicKind::SecuritySystemTargetState),
            Some(Value::from(SecuritySystemTargetState::AwayArm.code()))
        );
        assert_eq!(
            service.value(CharacteristicKind::SecuritySystemCurrentState),
            Some(Value::from(SecuritySystemCurrentState::AlarmTriggered.code()))
        );
        Ok(())
    }
}
