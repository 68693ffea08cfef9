/*!
 * Platform enumerator.
 *
 * Turns the registry's device list into accessories: initialize the registry,
 * drop ignored devices, pick an adapter per device class, add the alarm panel
 * when the secondary system is enabled, and record everything in the
 * [`AddressIndex`].
 */
use std::sync::Arc;

use tracing::{debug, info, warn, Instrument};

use hapbridge_core::config::Config;
use hapbridge_core::event::SharedEventBus;
use hapbridge_core::logging::operation_span;
use hapbridge_devices::{Device, DeviceHandle, DeviceKind, SharedDeviceRegistry};

use crate::accessory::Accessory;
use crate::adapters::{
    AlarmPanelAccessory, ContactSensorAccessory, FanAccessory, LightAccessory, LockAccessory,
    OutletAccessory,
};
use crate::dispatch::ChangeDispatcher;
use crate::error::Result;
use crate::filter::FilterEngine;
use crate::index::AddressIndex;

/// The bridge platform
#[derive(Debug)]
pub struct Platform {
    registry: SharedDeviceRegistry,
    filter: FilterEngine,
    index: Arc<AddressIndex>,
    bus: SharedEventBus,
    elk_enabled: bool,
}

impl Platform {
    /// Create a platform over `registry`, recording adapters in `index`
    ///
    /// Ignore rules and the alarm system switch come from `config`. Adapters
    /// publish their characteristic events on `bus`.
    pub fn new(
        registry: SharedDeviceRegistry,
        config: &Config,
        bus: SharedEventBus,
        index: Arc<AddressIndex>,
    ) -> Self {
        Self {
            registry,
            filter: FilterEngine::new(config.ignore_devices.clone()),
            index,
            bus,
            elk_enabled: config.controller.elk_enabled,
        }
    }

    /// The index the platform records adapters in
    pub fn index(&self) -> &Arc<AddressIndex> {
        &self.index
    }

    /// The ignore-rule engine
    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    /// A dispatcher routing registry changes through this platform's index
    pub fn dispatcher(&self) -> ChangeDispatcher {
        ChangeDispatcher::new(self.index.clone())
    }

    /// Build the accessory list
    ///
    /// The index content is replaced by the returned accessories.
    pub async fn enumerate_accessories(&self) -> Result<Vec<Arc<dyn Accessory>>> {
        self.enumerate()
            .instrument(operation_span("enumerate", "platform"))
            .await
    }

    async fn enumerate(&self) -> Result<Vec<Arc<dyn Accessory>>> {
        let registry = self.registry.registry();
        registry.initialize().await?;

        let mut accessories: Vec<Arc<dyn Accessory>> = Vec::new();
        for device in registry.devices()? {
            if self
                .filter
                .should_ignore(device.name(), device.address().as_str())
            {
                continue;
            }
            if let Some(accessory) = self.adapter_for(device) {
                accessories.push(accessory);
            }
        }

        if self.elk_enabled {
            match registry.alarm_panel() {
                Some(panel) => {
                    debug!("Adding alarm panel {}", panel.address());
                    accessories.push(Arc::new(AlarmPanelAccessory::new(panel, self.bus.clone())));
                }
                None => warn!("Alarm system enabled but the controller has no alarm panel"),
            }
        }

        self.index.replace_all(accessories.iter().cloned()).await;
        info!("Filtered device list has {} devices", accessories.len());
        Ok(accessories)
    }

    fn adapter_for(&self, device: DeviceHandle) -> Option<Arc<dyn Accessory>> {
        let bus = self.bus.clone();
        let dimmable = *device.kind() == DeviceKind::DimmableLight;
        let accessory: Arc<dyn Accessory> = match device {
            DeviceHandle::Light(light) => Arc::new(LightAccessory::new(light, dimmable, bus)),
            DeviceHandle::Lock(lock) => Arc::new(LockAccessory::new(lock, bus)),
            DeviceHandle::Outlet(outlet) => Arc::new(OutletAccessory::new(outlet, bus)),
            DeviceHandle::Fan(fan) => Arc::new(FanAccessory::new(fan, bus)),
            DeviceHandle::ContactSensor(sensor) => {
                Arc::new(ContactSensorAccessory::new(sensor, bus))
            }
            DeviceHandle::AlarmPanel(panel) => Arc::new(AlarmPanelAccessory::new(panel, bus)),
            DeviceHandle::Unsupported(device) => {
                debug!(
                    "No accessory for {} device {} [{}]",
                    device.kind(),
                    device.name(),
                    device.address()
                );
                return None;
            }
        };
        Some(accessory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristic::CharacteristicKind;
    use crate::error::Error;
    use hapbridge_core::config::IgnoreRule;
    use hapbridge_core::event::EventReceiver;
    use hapbridge_devices::devices::{
        SimulatedAlarmPanel, SimulatedContactSensor, SimulatedDevice, SimulatedFan,
        SimulatedLight, SimulatedLock, SimulatedOutlet,
    };
    use hapbridge_devices::{
        AlarmPanelDevice, DeviceChanged, DeviceError, DeviceInfo, DeviceRegistry, MemoryRegistry,
        Result as DeviceResult,
    };

    fn info(address: &str, name: &str, kind: DeviceKind) -> DeviceInfo {
        DeviceInfo::new(address, name, kind, "Model")
    }

    fn populated_registry() -> Arc<MemoryRegistry> {
        let registry = Arc::new(MemoryRegistry::new());
        let notifier = registry.notifier();
        let handles = vec![
            DeviceHandle::Light(Arc::new(SimulatedLight::new(
                info("10 00 00 1", "Kitchen Light", DeviceKind::Light),
                notifier.clone(),
            ))),
            DeviceHandle::Light(Arc::new(SimulatedLight::new(
                info("10 00 00 2", "Den Dimmer", DeviceKind::DimmableLight),
                notifier.clone(),
            ))),
            DeviceHandle::Lock(Arc::new(SimulatedLock::new(
                info("10 00 00 3", "Front Door", DeviceKind::SecureLock),
                notifier.clone(),
            ))),
            DeviceHandle::Outlet(Arc::new(SimulatedOutlet::new(
                info("10 00 00 4", "Porch Outlet", DeviceKind::Outlet),
                notifier.clone(),
            ))),
            DeviceHandle::Fan(Arc::new(SimulatedFan::new(
                info("10 00 00 5", "Hallway Closet Fan", DeviceKind::Fan),
                notifier.clone(),
            ))),
            DeviceHandle::ContactSensor(Arc::new(SimulatedContactSensor::new(
                info("10 00 00 6", "Back Door", DeviceKind::AlarmDoorWindowSensor),
                notifier.clone(),
            ))),
            DeviceHandle::Unsupported(Arc::new(SimulatedDevice::with_state(
                info("10 00 00 7", "Thermostat", DeviceKind::Other("Thermostat".into())),
                (),
                notifier.clone(),
            ))),
        ];
        for handle in handles {
            registry.register_device(handle).unwrap();
        }
        registry
            .set_alarm_panel(Arc::new(SimulatedAlarmPanel::new(
                info("ELK 1", "House Alarm", DeviceKind::AlarmPanel),
                notifier,
            )))
            .unwrap();
        registry
    }

    fn platform(registry: Arc<MemoryRegistry>, config: &Config) -> Platform {
        let registry: Arc<dyn DeviceRegistry> = registry;
        Platform::new(
            SharedDeviceRegistry::from(registry),
            config,
            SharedEventBus::new(),
            Arc::new(AddressIndex::new()),
        )
    }

    fn addresses(accessories: &[Arc<dyn Accessory>]) -> Vec<String> {
        accessories.iter().map(|a| a.address().to_string()).collect()
    }

    #[tokio::test]
    async fn test_every_mapped_class_is_surfaced() -> Result<()> {
        let platform = platform(populated_registry(), &Config::default());
        let accessories = platform.enumerate_accessories().await?;

        assert_eq!(
            addresses(&accessories),
            vec![
                "10 00 00 1",
                "10 00 00 2",
                "10 00 00 3",
                "10 00 00 4",
                "10 00 00 5",
                "10 00 00 6"
            ]
        );
        assert_eq!(platform.index().len().await, 6);
        assert!(!platform.index().contains("10 00 00 7").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_dimmable_light_gets_brightness() -> Result<()> {
        let platform = platform(populated_registry(), &Config::default());
        platform.enumerate_accessories().await?;

        let plain = platform.index().get("10 00 00 1").await.unwrap();
        let dimmer = platform.index().get("10 00 00 2").await.unwrap();
        assert!(!plain.services()[1].has(CharacteristicKind::Brightness));
        assert!(dimmer.services()[1].has(CharacteristicKind::Brightness));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_ignored_devices_are_not_indexed() -> Result<()> {
        let mut config = Config::default();
        config.ignore_devices = vec![
            IgnoreRule::name_contains("Closet"),
            IgnoreRule::last_address_digit("4"),
        ];
        let platform = platform(populated_registry(), &config);
        let accessories = platform.enumerate_accessories().await?;

        assert_eq!(accessories.len(), 4);
        assert!(!platform.index().contains("10 00 00 4").await);
        assert!(!platform.index().contains("10 00 00 5").await);
        assert!(platform.index().contains("10 00 00 1").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_alarm_panel_bypasses_filters() -> Result<()> {
        let mut config = Config::default();
        config.controller.elk_enabled = true;
        config.ignore_devices = vec![IgnoreRule::name_contains("Alarm")];
        let platform = platform(populated_registry(), &config);
        let accessories = platform.enumerate_accessories().await?;

        assert_eq!(accessories.len(), 7);
        assert_eq!(accessories.last().map(|a| a.name().to_string()), Some("House Alarm".into()));
        assert!(platform.index().contains("ELK 1").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_alarm_panel_requires_elk() -> Result<()> {
        let platform = platform(populated_registry(), &Config::default());
        platform.enumerate_accessories().await?;
        assert!(!platform.index().contains("ELK 1").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_reenumeration_replaces_index() -> Result<()> {
        let registry = populated_registry();
        let mut config = Config::default();
        let first = platform(registry.clone(), &config);
        first.enumerate_accessories().await?;

        config.ignore_devices = vec![IgnoreRule::address("10 00 00 1")];
        let second = Platform::new(
            first.registry.clone(),
            &config,
            SharedEventBus::new(),
            first.index().clone(),
        );
        second.enumerate_accessories().await?;

        assert!(!second.index().contains("10 00 00 1").await);
        assert_eq!(second.index().len().await, 5);
        Ok(())
    }

    #[derive(Debug)]
    struct OfflineRegistry;

    #[async_trait::async_trait]
    impl DeviceRegistry for OfflineRegistry {
        async fn initialize(&self) -> DeviceResult<()> {
            Err(DeviceError::Registry("controller unreachable".to_string()))
        }

        fn devices(&self) -> DeviceResult<Vec<DeviceHandle>> {
            Err(DeviceError::NotInitialized)
        }

        fn alarm_panel(&self) -> Option<Arc<dyn AlarmPanelDevice>> {
            None
        }

        fn subscribe_changes(&self) -> DeviceResult<EventReceiver<DeviceChanged>> {
            Err(DeviceError::NotInitialized)
        }
    }

    #[tokio::test]
    async fn test_registry_failure_propagates() {
        let platform = Platform::new(
            SharedDeviceRegistry::new(OfflineRegistry),
            &Config::default(),
            SharedEventBus::new(),
            Arc::new(AddressIndex::new()),
        );
        assert!(matches!(
            platform.enumerate_accessories().await,
            Err(Error::Device(DeviceError::Registry(_)))
        ));
        assert!(platform.index().is_empty().await);
    }
}
