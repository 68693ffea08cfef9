/*!
 * Door/window contact sensor adapter.
 */
use std::sync::Arc;

use async_trait::async_trait;

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{ContactSensorDevice, Device};

use crate::accessory::{Accessory, AccessoryBase};
use crate::characteristic::{CharacteristicKind, ContactSensorState};
use crate::error::Result;
use crate::service::{Service, ServiceKind};

/// Exposes a door/window sensor as a read-only contact sensor
#[derive(Debug)]
pub struct ContactSensorAccessory {
    base: AccessoryBase,
    device: Arc<dyn ContactSensorDevice>,
}

impl ContactSensorAccessory {
    /// Wrap a door/window sensor
    pub fn new(device: Arc<dyn ContactSensorDevice>, bus: SharedEventBus) -> Self {
        Self {
            base: AccessoryBase::new("contact_sensor", device.info().clone(), bus),
            device,
        }
    }

    /// The sensor reading in protocol terms
    pub fn contact_state(&self) -> ContactSensorState {
        ContactSensorState::from_open(self.device.current_door_window_state())
    }
}

#[async_trait]
impl Accessory for ContactSensorAccessory {
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
                .service(ServiceKind::ContactSensor)
                .with_characteristic(
                    CharacteristicKind::ContactSensorState,
                    self.contact_state().code(),
                )]
        })
    }

    fn read(&self, characteristic: CharacteristicKind) -> Result<Value> {
        match characteristic {
            CharacteristicKind::ContactSensorState => Ok(Value::from(self.contact_state().code())),
            other => self
                .base
                .read_information(other)
                .ok_or_else(|| self.base.unsupported(other)),
        }
    }

    async fn write(&self, characteristic: CharacteristicKind, _value: Value) -> Result<()> {
        self.base.check_writable(self.services(), characteristic)?;
        Err(self.base.unsupported(characteristic))
    }

    fn handle_external_change(&self) {
        let _entered = self.base.span().enter();
        self.base.push(
            self.services(),
            CharacteristicKind::ContactSensorState,
            self.contact_state().code(),
        );
    }
}
