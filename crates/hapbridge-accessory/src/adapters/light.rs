/*!
 * Light adapter: power, and brightness for dimmable lights.
 */
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{Device, LightDevice};

use crate::accessory::{Accessory, AccessoryBase};
use crate::characteristic::CharacteristicKind;
use crate::error::Result;
use crate::service::{Service, ServiceKind};

/// Exposes a controller light as a light bulb
#[derive(Debug)]
pub struct LightAccessory {
    base: AccessoryBase,
    device: Arc<dyn LightDevice>,
    dimmable: bool,
}

impl LightAccessory {
    /// Wrap a light; Brightness is exposed only when `dimmable`
    pub fn new(device: Arc<dyn LightDevice>, dimmable: bool, bus: SharedEventBus) -> Self {
        Self {
            base: AccessoryBase::new("light", device.info().clone(), bus),
            device,
            dimmable,
        }
    }

    /// Whether Brightness is exposed
    pub fn is_dimmable(&self) -> bool {
        self.dimmable
    }

    async fn set_power(&self, on: bool) {
        debug!("Setting power to {}", on);
        if on == self.device.current_light_state() {
            debug!("Ignoring redundant power change");
            return;
        }
        info!("Changing power to {}", on);
        self.base
            .complete("light", self.device.send_light_command(on).await);
    }

    async fn set_brightness(&self, level: u8) {
        debug!("Setting brightness to {}", level);
        if level == self.device.current_light_dim_state() {
            debug!("Ignoring redundant brightness change");
            return;
        }
        info!("Changing brightness to {}", level);
        self.base
            .complete("light_dim", self.device.send_light_dim_command(level).await);
    }
}

#[async_trait]
impl Accessory for LightAccessory {
    fn address(&self) -> &Address {
        self.base.address()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    async fn identify(&self) -> Result<()> {
        async {
            self.base
                .complete("light", self.device.send_light_command(true).await);
            self.base
                .complete("light", self.device.send_light_command(false).await);
        }
        .instrument(self.base.span().clone())
        .await;
        Ok(())
    }

    fn services(&self) -> &[Service] {
        self.base.services_or_init(|| {
            let mut light = self
                .base
                .service(ServiceKind::Lightbulb)
                .with_characteristic(CharacteristicKind::On, self.device.current_light_state());
            if self.dimmable {
                light = light.with_characteristic(
                    CharacteristicKind::Brightness,
                    self.device.current_light_dim_state(),
                );
            }
            vec![light]
        })
    }

    fn read(&self, characteristic: CharacteristicKind) -> Result<Value> {
        match characteristic {
            CharacteristicKind::On => Ok(Value::Bool(self.device.current_light_state())),
            CharacteristicKind::Brightness if self.dimmable => {
                Ok(Value::from(self.device.current_light_dim_state()))
            }
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
                self.set_power(on).instrument(span).await;
            }
            CharacteristicKind::Brightness => {
                let level = characteristic.expect_percent(&value)?;
                self.set_brightness(level).instrument(span).await;
            }
            other => return Err(self.base.unsupported(other)),
        }
        Ok(())
    }

    fn handle_external_change(&self) {
        let _entered = self.base.span().enter();
        debug!("Handling external change");
        let services = self.services();
        self.base.push(
            services,
            CharacteristicKind::On,
            self.device.current_light_state(),
        );
        if self.dimmable {
            self.base.push(
                services,
                CharacteristicKind::Brightness,
                self.device.current_light_dim_state(),
            );
        }
    }
}
