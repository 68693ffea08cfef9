/*!
 * Fan adapter.
 *
 * The controller knows four speeds, the accessory protocol a 0-100 rotation
 * speed. Speeds map to fixed percentages and percentages to speed buckets:
 *
 * | Speed  | Percent | Bucket  |
 * |--------|---------|---------|
 * | Off    | 0       | 0       |
 * | Low    | 32      | 1-32    |
 * | Medium | 67      | 33-67   |
 * | High   | 100     | 68-100  |
 */
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, Instrument};

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{Device, FanDevice, FanSpeed};

use crate::accessory::{Accessory, AccessoryBase};
use crate::characteristic::CharacteristicKind;
use crate::error::Result;
use crate::service::{Service, ServiceKind};

/// Rotation speed of a fan speed
pub fn speed_to_percent(speed: FanSpeed) -> u8 {
    match speed {
        FanSpeed::Off => 0,
        FanSpeed::Low => 32,
        FanSpeed::Medium => 67,
        FanSpeed::High => 100,
    }
}

/// Fan speed bucket of a rotation speed
pub fn percent_to_speed(percent: u8) -> FanSpeed {
    match percent {
        0 => FanSpeed::Off,
        1..=32 => FanSpeed::Low,
        33..=67 => FanSpeed::Medium,
        _ => FanSpeed::High,
    }
}

/// Rotation speed of a controller speed word; unknown words read as 0
pub fn word_to_percent(word: &str) -> u8 {
    match FanSpeed::parse(word) {
        Some(speed) => speed_to_percent(speed),
        None => {
            error!("Unknown fan speed: {}", word);
            0
        }
    }
}

/// Exposes a controller fan
#[derive(Debug)]
pub struct FanAccessory {
    base: AccessoryBase,
    device: Arc<dyn FanDevice>,
}

impl FanAccessory {
    /// Wrap a fan
    pub fn new(device: Arc<dyn FanDevice>, bus: SharedEventBus) -> Self {
        Self {
            base: AccessoryBase::new("fan", device.info().clone(), bus),
            device,
        }
    }

    /// Whether the fan is running, anything but "Off" counting as on
    pub fn is_on(&self) -> bool {
        self.device.current_fan_state() != FanSpeed::Off.as_str()
    }

    /// The current rotation speed
    pub fn rotation_speed(&self) -> u8 {
        word_to_percent(&self.device.current_fan_state())
    }

    async fn set_rotation_speed(&self, percent: u8) {
        let speed = percent_to_speed(percent);
        debug!("Setting fan speed to {} ({}%)", speed, percent);
        if speed.as_str() == self.device.current_fan_state() {
            debug!("Fan already at {}", speed);
            return;
        }
        info!("Changing fan speed to {}", speed);
        self.base
            .complete("fan", self.device.send_fan_command(speed).await);
    }

    async fn set_on(&self, on: bool) {
        if on == self.is_on() {
            debug!("Fan already {}", if on { "on" } else { "off" });
            return;
        }
        let speed = if on { FanSpeed::Medium } else { FanSpeed::Off };
        self.set_rotation_speed(speed_to_percent(speed)).await;
    }
}

#[async_trait]
impl Accessory for FanAccessory {
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
                .service(ServiceKind::Fan)
                .with_characteristic(CharacteristicKind::On, self.is_on())
                .with_characteristic(CharacteristicKind::RotationSpeed, self.rotation_speed())]
        })
    }

    fn read(&self, characteristic: CharacteristicKind) -> Result<Value> {
        match characteristic {
            CharacteristicKind::On => Ok(Value::Bool(self.is_on())),
            CharacteristicKind::RotationSpeed => Ok(Value::from(self.rotation_speed())),
            other => self
                .base
                .read_information(other)
                .ok_or_else(|| self.base.unsupported(other)),
        }
    }

    async fn write(&self, characteristic: CharacteristicKind, value: Value) -> Result<()> {
        self.base.check_writable(self.services(), characteristic)?;
        let span = self.base.span().clone();
        match characteristic {
            CharacteristicKind::On => {
                let on = characteristic.expect_bool(&value)?;
                self.set_on(on).instrument(span).await;
            }
            CharacteristicKind::RotationSpeed => {
                let percent = characteristic.expect_percent(&value)?;
                self.set_rotation_speed(percent).instrument(span).await;
            }
            other => return Err(self.base.unsupported(other)),
        }
        Ok(())
    }

    fn handle_external_change(&self) {
        let _entered = self.base.span().enter();
        let services = self.services();
        self.base
            .push(services, CharacteristicKind::On, self.is_on());
        self.base
            .push(services, CharacteristicKind::RotationSpeed, self.rotation_speed());
    }
}
