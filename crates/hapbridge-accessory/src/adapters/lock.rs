/*!
 * Lock adapter.
 *
 * Target and current state both read the device's lock state. A target write
 * sends a command only when it differs from the current state.
 */
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, Instrument};

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{Device, LockDevice};

use crate::accessory::{Accessory, AccessoryBase};
use crate::characteristic::{CharacteristicKind, LockState};
use crate::error::{Error, Result};
use crate::service::{Service, ServiceKind};

/// Exposes a controller lock as a lock mechanism
#[derive(Debug)]
pub struct LockAccessory {
    base: AccessoryBase,
    device: Arc<dyn LockDevice>,
}

impl LockAccessory {
    /// Wrap a lock
    pub fn new(device: Arc<dyn LockDevice>, bus: SharedEventBus) -> Self {
        Self {
            base: AccessoryBase::new("lock", device.info().clone(), bus),
            device,
        }
    }

    /// The device's lock state in protocol terms
    pub fn current_state(&self) -> LockState {
        LockState::from_locked(self.device.current_lock_state())
    }

    async fn set_target_state(&self, target: LockState) {
        debug!("Setting lock state to {:?}", target);
        if target == self.current_state() {
            debug!("Lock already {:?}", target);
            return;
        }
        info!("Changing lock state to {:?}", target);
        self.base
            .complete("lock", self.device.send_lock_command(target.is_locked()).await);
    }
}

#[async_trait]
impl Accessory for LockAccessory {
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
            let state = self.current_state().code();
            vec![self
                .base
                .service(ServiceKind::LockMechanism)
                .with_characteristic(CharacteristicKind::LockTargetState, state)
                .with_characteristic(CharacteristicKind::LockCurrentState, state)]
        })
    }

    fn read(&self, characteristic: CharacteristicKind) -> Result<Value> {
        match characteristic {
            CharacteristicKind::LockTargetState | CharacteristicKind::LockCurrentState => {
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
            CharacteristicKind::LockTargetState => {
                let target = LockState::from_code(characteristic.expect_code(&value)?)
                    .ok_or_else(|| Error::invalid_value(characteristic, "0 or 1", &value))?;
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
        let state = self.current_state().code();
        let services = self.services();
        self.base
            .push(services, CharacteristicKind::LockTargetState, state);
        self.base
            .push(services, CharacteristicKind::LockCurrentState, state);
    }
}
