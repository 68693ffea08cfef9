/*!
 * The accessory contract consumed by the accessory host.
 *
 * Every device-class adapter implements [`Accessory`]. Adapters share their
 * bookkeeping through [`AccessoryBase`]: the device identity, the lazily built
 * service list with its Accessory Information service, the component span and
 * the helpers that validate host writes and push values to services.
 */
use std::fmt::Debug;
use std::sync::OnceLock;

use async_trait::async_trait;
use tracing::{debug, warn};

use hapbridge_core::event::SharedEventBus;
use hapbridge_core::logging::{component_span, Span};
use hapbridge_core::types::{Address, Value};
use hapbridge_devices::device::{DeviceInfo, Result as DeviceResult};

use crate::characteristic::CharacteristicKind;
use crate::error::{Error, Result};
use crate::service::{Service, ServiceKind};

/// Manufacturer reported in the Accessory Information service
pub const MANUFACTURER: &str = "SmartHome";

/// A device surfaced to the accessory host
#[async_trait]
pub trait Accessory: Send + Sync + Debug {
    /// Device address the accessory represents
    fn address(&self) -> &Address;

    /// Accessory name
    fn name(&self) -> &str;

    /// Identify the accessory to the user
    async fn identify(&self) -> Result<()>;

    /// Services in host order, Accessory Information first
    ///
    /// Built on first call and cached.
    fn services(&self) -> &[Service];

    /// Compute the current value of a characteristic from the device
    fn read(&self, characteristic: CharacteristicKind) -> Result<Value>;

    /// Apply a value written by the host
    ///
    /// Failed device commands are logged and reported as success. Errors are
    /// returned only for unknown or read-only characteristics and for values
    /// of the wrong type.
    async fn write(&self, characteristic: CharacteristicKind, value: Value) -> Result<()>;

    /// Push the device's current state into every characteristic
    fn handle_external_change(&self);
}

/// State shared by all adapters
#[derive(Debug)]
pub struct AccessoryBase {
    info: DeviceInfo,
    bus: SharedEventBus,
    services: OnceLock<Vec<Service>>,
    span: Span,
}

impl AccessoryBase {
    /// Create the base for an adapter of `class` wrapping the device `info`
    pub fn new(class: &'static str, info: DeviceInfo, bus: SharedEventBus) -> Self {
        let span = component_span(class, Some(info.address.as_str()));
        Self {
            info,
            bus,
            services: OnceLock::new(),
            span,
        }
    }

    /// Device address
    pub fn address(&self) -> &Address {
        &self.info.address
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Component span to log adapter activity in
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// A new, empty service of `kind` for this accessory
    pub fn service(&self, kind: ServiceKind) -> Service {
        Service::new(kind, self.info.address.clone(), self.bus.clone())
    }

    /// The cached services, built by `build` on first use
    ///
    /// The Accessory Information service is placed in front of the services
    /// `build` returns.
    pub fn services_or_init<F>(&self, build: F) -> &[Service]
    where
        F: FnOnce() -> Vec<Service>,
    {
        self.services.get_or_init(|| {
            let mut services = vec![self.information_service()];
            services.extend(build());
            services
        })
    }

    fn information_service(&self) -> Service {
        self.service(ServiceKind::AccessoryInformation)
            .with_characteristic(CharacteristicKind::Name, self.info.name.as_str())
            .with_characteristic(CharacteristicKind::Manufacturer, MANUFACTURER)
            .with_characteristic(CharacteristicKind::Model, self.info.friendly_name.as_str())
            .with_characteristic(CharacteristicKind::SerialNumber, self.info.address.as_str())
    }

    /// Value of an Accessory Information characteristic
    pub fn read_information(&self, characteristic: CharacteristicKind) -> Option<Value> {
        let value = match characteristic {
            CharacteristicKind::Name => self.info.name.as_str(),
            CharacteristicKind::Manufacturer => MANUFACTURER,
            CharacteristicKind::Model => self.info.friendly_name.as_str(),
            CharacteristicKind::SerialNumber => self.info.address.as_str(),
            _ => return None,
        };
        Some(Value::from(value))
    }

    /// The error for a characteristic this accessory does not have
    pub fn unsupported(&self, characteristic: CharacteristicKind) -> Error {
        Error::unsupported(&self.info.address, characteristic)
    }

    /// Check that the host may write `characteristic` on an accessory with `services`
    pub fn check_writable(
        &self,
        services: &[Service],
        characteristic: CharacteristicKind,
    ) -> Result<()> {
        if !services.iter().any(|s| s.has(characteristic)) {
            return Err(self.unsupported(characteristic));
        }
        if !characteristic.access().is_writable() {
            return Err(Error::read_only(&self.info.address, characteristic));
        }
        Ok(())
    }

    /// Store and announce a characteristic value
    ///
    /// Publishing failures are logged, the cached value is still updated.
    pub fn push<V: Into<Value>>(
        &self,
        services: &[Service],
        characteristic: CharacteristicKind,
        value: V,
    ) {
        let value = value.into();
        let Some(service) = services.iter().find(|s| s.has(characteristic)) else {
            debug!("No service holds {}", characteristic);
            return;
        };
        if let Err(e) = service.update(characteristic, value) {
            warn!("Failed to publish {} change: {}", characteristic, e);
        }
    }

    /// Log the outcome of a device command
    ///
    /// Command failures never reach the host, so this is where they end.
    pub fn complete(&self, command: &str, result: DeviceResult<()>) {
        match result {
            Ok(()) => debug!("{} command completed", command),
            Err(e) => warn!("{} command for {} failed: {}", command, self.info.address, e),
        }
    }
}
