/*!
 * Accessory services and characteristic change events.
 *
 * A [`Service`] groups the characteristics of one accessory function and
 * caches their last pushed values. Pushing a value through
 * [`Service::update`] stores it and publishes a [`CharacteristicEvent`] on the
 * shared event bus, which is how the accessory host learns about changes.
 */
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::types::{Address, Value};

use crate::characteristic::{Access, CharacteristicKind};
use crate::error::Result;

/// The services adapters expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Name, manufacturer, model and serial number
    AccessoryInformation,
    /// Light bulb
    Lightbulb,
    /// Power outlet
    Outlet,
    /// Lock mechanism
    LockMechanism,
    /// Fan
    Fan,
    /// Contact sensor
    ContactSensor,
    /// Security system
    SecuritySystem,
}

impl ServiceKind {
    /// Service name
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::AccessoryInformation => "AccessoryInformation",
            ServiceKind::Lightbulb => "Lightbulb",
            ServiceKind::Outlet => "Outlet",
            ServiceKind::LockMechanism => "LockMechanism",
            ServiceKind::Fan => "Fan",
            ServiceKind::ContactSensor => "ContactSensor",
            ServiceKind::SecuritySystem => "SecuritySystem",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A characteristic value pushed to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicEvent {
    /// Device address of the accessory
    pub address: Address,
    /// Service holding the characteristic
    pub service: ServiceKind,
    /// The characteristic
    pub characteristic: CharacteristicKind,
    /// The new value
    pub value: Value,
    /// When the value was pushed
    pub timestamp: DateTime<Utc>,
}

/// A characteristic and its cached value
#[derive(Debug, Clone, PartialEq)]
pub struct Characteristic {
    /// Which characteristic
    pub kind: CharacteristicKind,
    /// Host access
    pub access: Access,
    /// Last known value
    pub value: Value,
}

/// An accessory service
#[derive(Debug)]
pub struct Service {
    kind: ServiceKind,
    address: Address,
    characteristics: RwLock<Vec<Characteristic>>,
    bus: SharedEventBus,
}

impl Service {
    /// Create an empty service for the accessory at `address`
    pub fn new(kind: ServiceKind, address: Address, bus: SharedEventBus) -> Self {
        Self {
            kind,
            address,
            characteristics: RwLock::new(Vec::new()),
            bus,
        }
    }

    /// Add a characteristic with its initial value
    pub fn with_characteristic<V: Into<Value>>(self, kind: CharacteristicKind, value: V) -> Self {
        self.characteristics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Characteristic {
                kind,
                access: kind.access(),
                value: value.into(),
            });
        self
    }

    /// Get the service kind
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Get the accessory address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Snapshot of the characteristics, in insertion order
    pub fn characteristics(&self) -> Vec<Characteristic> {
        self.characteristics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the service has the characteristic
    pub fn has(&self, kind: CharacteristicKind) -> bool {
        self.characteristics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|c| c.kind == kind)
    }

    /// Cached value of a characteristic
    pub fn value(&self, kind: CharacteristicKind) -> Option<Value> {
        self.characteristics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.value.clone())
    }

    /// Store a new value and announce it to the host
    ///
    /// The value is always stored and published, even when unchanged. Returns
    /// the number of subscribers the event reached, or `None` when the service
    /// has no such characteristic.
    pub fn update(&self, kind: CharacteristicKind, value: Value) -> Result<Option<usize>> {
        {
            let mut characteristics = self
                .characteristics
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match characteristics.iter_mut().find(|c| c.kind == kind) {
                Some(characteristic) => characteristic.value = value.clone(),
                None => return Ok(None),
            }
        }

        trace!("{} {}.{} = {:?}", self.address, self.kind, kind, value);
        let reached = self.bus.publish(CharacteristicEvent {
            address: self.address.clone(),
            service: self.kind,
            characteristic: kind,
            value,
            timestamp: Utc::now(),
        })?;
        Ok(Some(reached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outlet(bus: &SharedEventBus) -> Service {
        Service::new(ServiceKind::Outlet, Address::from("1A 2B 3C 1"), bus.clone())
            .with_characteristic(CharacteristicKind::On, false)
            .with_characteristic(CharacteristicKind::OutletInUse, true)
    }

    #[test]
    fn test_characteristics_keep_order_and_access() {
        let service = outlet(&SharedEventBus::new());
        let characteristics = service.characteristics();

        assert_eq!(characteristics.len(), 2);
        assert_eq!(characteristics[0].kind, CharacteristicKind::On);
        assert_eq!(characteristics[0].access, Access::ReadWrite);
        assert_eq!(characteristics[1].access, Access::ReadOnly);
        assert!(service.has(CharacteristicKind::OutletInUse));
        assert!(!service.has(CharacteristicKind::Brightness));
    }

    #[tokio::test]
    async fn test_update_stores_and_publishes() -> Result<()> {
        let bus = SharedEventBus::new();
        let mut events = bus.subscribe::<CharacteristicEvent>()?;
        let service = outlet(&bus);

        assert_eq!(service.update(CharacteristicKind::On, Value::Bool(true))?, Some(1));
        assert_eq!(service.value(CharacteristicKind::On), Some(Value::Bool(true)));

        let event = events.recv().await.unwrap();
        assert_eq!(event.address.as_str(), "1A 2B 3C 1");
        assert_eq!(event.service, ServiceKind::Outlet);
        assert_eq!(event.characteristic, CharacteristicKind::On);
        assert_eq!(event.value, Value::Bool(true));
        Ok(())
    }

    #[test]
    fn test_unchanged_value_is_still_published() -> Result<()> {
        let bus = SharedEventBus::new();
        let mut events = bus.subscribe::<CharacteristicEvent>()?;
        let service = outlet(&bus);

        service.update(CharacteristicKind::On, Value::Bool(false))?;
        service.update(CharacteristicKind::On, Value::Bool(false))?;
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_ok());
        Ok(())
    }

    #[test]
    fn test_event_serializes_for_the_host() -> Result<()> {
        let event = CharacteristicEvent {
            address: Address::from("1A 2B 3C 1"),
            service: ServiceKind::Outlet,
            characteristic: CharacteristicKind::On,
            value: Value::Bool(true),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["address"], "1A 2B 3C 1");
        assert_eq!(json["service"], "Outlet");
        assert_eq!(json["characteristic"], "On");
        assert_eq!(json["value"], true);
        Ok(())
    }

    #[test]
    fn test_update_of_missing_characteristic() -> Result<()> {
        let service = outlet(&SharedEventBus::new());
        assert_eq!(service.update(CharacteristicKind::Brightness, Value::Integer(5))?, None);
        assert_eq!(service.value(CharacteristicKind::Brightness), None);
        Ok(())
    }
}
