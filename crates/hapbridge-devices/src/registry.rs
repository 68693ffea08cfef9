/*!
 * Device registry for hapbridge.
 *
 * The registry owns the live controller devices. The bridge asks it to
 * initialize, enumerates its devices once, and then listens for
 * [`DeviceChanged`] notifications raised when a device changes outside the
 * bridge (a wall switch, a keypad, a sensor tripping).
 */
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use hapbridge_core::event::{EventReceiver, SharedEventBus};
use hapbridge_core::types::Address;

use crate::device::{AlarmPanelDevice, DeviceError, DeviceHandle, Result};

/// Notification that a device changed state out-of-band
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceChanged {
    /// The device address
    pub address: Address,
    /// When the registry observed the change
    pub timestamp: DateTime<Utc>,
}

impl DeviceChanged {
    /// Create a notification stamped with the current time
    pub fn new<A: Into<Address>>(address: A) -> Self {
        Self {
            address: address.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The controller-side device registry
#[async_trait]
pub trait DeviceRegistry: Send + Sync + Debug {
    /// Connect to the controller and load the device list
    async fn initialize(&self) -> Result<()>;

    /// All devices, in controller order
    fn devices(&self) -> Result<Vec<DeviceHandle>>;

    /// The secondary alarm system panel, if the controller has one
    fn alarm_panel(&self) -> Option<Arc<dyn AlarmPanelDevice>>;

    /// Subscribe to out-of-band change notifications
    fn subscribe_changes(&self) -> Result<EventReceiver<DeviceChanged>>;
}

/// Publishes [`DeviceChanged`] notifications on a registry's event bus
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    bus: SharedEventBus,
}

impl ChangeNotifier {
    /// Create a notifier publishing on `bus`
    pub fn new(bus: SharedEventBus) -> Self {
        Self { bus }
    }

    /// Announce that the device at `address` changed
    pub fn notify(&self, address: &Address) -> Result<usize> {
        debug!("Device {} changed externally", address);
        Ok(self.bus.publish(DeviceChanged::new(address.clone()))?)
    }
}

/// In-memory device registry
///
/// Devices are registered up front and handed out in registration order once
/// the registry is initialized.
#[derive(Debug)]
pub struct MemoryRegistry {
    /// The registered devices
    devices: RwLock<Vec<DeviceHandle>>,
    /// The alarm panel, when present
    alarm_panel: RwLock<Option<Arc<dyn AlarmPanelDevice>>>,
    /// Bus carrying change notifications
    bus: SharedEventBus,
    /// Set once `initialize` has run
    initialized: AtomicBool,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_event_bus(SharedEventBus::new())
    }

    /// Create an empty registry publishing changes on `bus`
    pub fn with_event_bus(bus: SharedEventBus) -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            alarm_panel: RwLock::new(None),
            bus,
            initialized: AtomicBool::new(false),
        }
    }

    /// A notifier for devices owned by this registry
    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier::new(self.bus.clone())
    }

    /// The bus change notifications are published on
    pub fn event_bus(&self) -> &SharedEventBus {
        &self.bus
    }

    /// Register a device
    pub fn register_device(&self, device: DeviceHandle) -> Result<()> {
        let mut devices = self.devices.write().map_err(|_| {
            DeviceError::Registry("Failed to acquire write lock on device registry".to_string())
        })?;

        if devices.iter().any(|d| d.address() == device.address()) {
            return Err(DeviceError::AlreadyRegistered(device.address().clone()));
        }

        debug!("Registered {} device {}", device.kind(), device.address());
        devices.push(device);
        Ok(())
    }

    /// Install the alarm panel
    pub fn set_alarm_panel(&self, panel: Arc<dyn AlarmPanelDevice>) -> Result<()> {
        let mut slot = self.alarm_panel.write().map_err(|_| {
            DeviceError::Registry("Failed to acquire write lock on alarm panel".to_string())
        })?;
        debug!("Registered alarm panel {}", panel.address());
        *slot = Some(panel);
        Ok(())
    }

    /// Get a device by address
    pub fn get_device(&self, address: &str) -> Result<DeviceHandle> {
        let devices = self.devices.read().map_err(|_| {
            DeviceError::Registry("Failed to acquire read lock on device registry".to_string())
        })?;

        devices
            .iter()
            .find(|d| d.address().as_str() == address)
            .cloned()
            .ok_or_else(|| DeviceError::UnknownDevice(Address::from(address)))
    }

    /// Count registered devices
    pub fn count_devices(&self) -> Result<usize> {
        let devices = self.devices.read().map_err(|_| {
            DeviceError::Registry("Failed to acquire read lock on device registry".to_string())
        })?;
        Ok(devices.len())
    }

    /// Whether `initialize` has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    async fn initialize(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Device registry already initialized");
            return Ok(());
        }
        info!("Device registry initialized with {} devices", self.count_devices()?);
        Ok(())
    }

    fn devices(&self) -> Result<Vec<DeviceHandle>> {
        if !self.is_initialized() {
            return Err(DeviceError::NotInitialized);
        }
        let devices = self.devices.read().map_err(|_| {
            DeviceError::Registry("Failed to acquire read lock on device registry".to_string())
        })?;
        Ok(devices.clone())
    }

    fn alarm_panel(&self) -> Option<Arc<dyn AlarmPanelDevice>> {
        self.alarm_panel.read().ok().and_then(|panel| panel.clone())
    }

    fn subscribe_changes(&self) -> Result<EventReceiver<DeviceChanged>> {
        Ok(self.bus.subscribe::<DeviceChanged>()?)
    }
}

/// A shared device registry that can be cloned
#[derive(Debug, Clone)]
pub struct SharedDeviceRegistry(Arc<dyn DeviceRegistry>);

impl SharedDeviceRegistry {
    /// Wrap a registry
    pub fn new<R: DeviceRegistry + 'static>(registry: R) -> Self {
        Self(Arc::new(registry))
    }

    /// Get a reference to the device registry
    pub fn registry(&self) -> &dyn DeviceRegistry {
        self.0.as_ref()
    }
}

impl From<Arc<dyn DeviceRegistry>> for SharedDeviceRegistry {
    fn from(registry: Arc<dyn DeviceRegistry>) -> Self {
        Self(registry)
    }
}

impl AsRef<dyn DeviceRegistry> for SharedDeviceRegistry {
    fn as_ref(&self) -> &(dyn DeviceRegistry + 'static) {
        self.0.as_ref()
    }
}
