/*!
 * Outlet adapter.
 */
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{Device, OutletDevice};

use crate::accessory::{Accessory, AccessoryBase};
use crate::characteristic::CharacteristicKind;
use crate::error::Result;
use crate::service::{Service, ServiceKind};

/// Exposes a controller outlet
#[derive(Debug)]
pub struct OutletAccessory {
    base: AccessoryBase,
    device: Arc<dyn OutletDevice>,
}

impl OutletAccessory {
    /// Wrap an outlet
    pub fn new(device: Arc<dyn OutletDevice>, bus: SharedEventBus) -> Self {
        Self {
            base: AccessoryBase::new("outlet", device.info().clone(), bus),
            device,
        }
    }

    async fn set_outlet_state(&self, on: bool) {
        if on == self.device.current_outlet_state() {
            debug!("Outlet already {}", if on { "on" } else { "off" });
            return;
        }
        info!("Changing outlet state to {}", on);
        self.base
            .complete("outlet", self.device.send_outlet_command(on).await);
    }
}

#[async_trait]
impl Accessory for OutletAccessory {
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
                .service(ServiceKind::Outlet)
                .with_characteristic(CharacteristicKind::On, self.device.current_outlet_state())
                .with_characteristic(CharacteristicKind::OutletInUse, true)]
        })
    }

    fn read(&self, characteristic: CharacteristicKind) -> Result<Value> {
        match characteristic {
            CharacteristicKind::On => Ok(Value::Bool(self.device.current_outlet_state())),
            // The controller cannot sense a load
            CharacteristicKind::OutletInUse => Ok(Value::Bool(true)),
            other => self
                .base
                .read_information(other)
                .ok_or_else(|| self.base.unsupported(other)),
        }
    }

    async fn write(&self, characteristic: CharacteristicKind, value: Value) -> Result<()> {
        self.base.check_writable(self.services(), characteristic)?;
        match characteristic {
            CharacteristicKind::On => {
                let on = characteristic.expect_bool(&value)?;
                self.set_outlet_state(on)
                    .instrument(self.base.span().clone())
                    .await;
                Ok(())
            }
            other => Err(self.base.unsupported(other)),
        }
    }

    fn handle_external_change(&self) {
        let _entered = self.base.span().enter();
        self.base.push(
            self.services(),
            CharacteristicKind::On,
            self.device.current_outlet_state(),
        );
    }
}
