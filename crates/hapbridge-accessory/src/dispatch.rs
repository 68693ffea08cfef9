/*!
 * Routing of out-of-band device changes to adapters.
 */
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hapbridge_core::event::EventReceiver;
use hapbridge_core::utils::spawn_and_log;
use hapbridge_devices::DeviceChanged;

use crate::error::Result;
use crate::index::AddressIndex;

/// Delivers registry change notifications to the adapter of the changed device
#[derive(Debug, Clone)]
pub struct ChangeDispatcher {
    index: Arc<AddressIndex>,
}

impl ChangeDispatcher {
    /// Create a dispatcher routing through `index`
    pub fn new(index: Arc<AddressIndex>) -> Self {
        Self { index }
    }

    /// Route one change; returns whether an adapter received it
    pub async fn dispatch(&self, address: &str) -> bool {
        match self.index.get(address).await {
            Some(accessory) => {
                debug!("Dispatching change of {} to {}", address, accessory.name());
                accessory.handle_external_change();
                true
            }
            None => {
                debug!("No accessory for changed device {}", address);
                false
            }
        }
    }

    /// Consume change notifications until the registry closes the stream
    ///
    /// Returns the number of changes delivered to an adapter.
    pub async fn run(&self, mut changes: EventReceiver<DeviceChanged>) -> Result<usize> {
        let mut delivered = 0;
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if self.dispatch(change.address.as_str()).await {
                        delivered += 1;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Change dispatcher lagged behind, {} changes lost", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("Change stream closed after {} deliveries", delivered);
        Ok(delivered)
    }

    /// Run the dispatcher as a background task
    pub fn spawn(self, changes: EventReceiver<DeviceChanged>) -> JoinHandle<()> {
        spawn_and_log("change-dispatcher", async move { self.run(changes).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::Accessory;
    use crate::adapters::OutletAccessory;
    use crate::characteristic::CharacteristicKind;
    use crate::service::CharacteristicEvent;
    use hapbridge_core::event::SharedEventBus;
    use hapbridge_core::types::Value;
    use hapbridge_devices::devices::SimulatedOutlet;
    use hapbridge_devices::{DeviceInfo, DeviceKind, MemoryRegistry};
    use tokio::sync::broadcast;

    fn outlet(registry: &MemoryRegistry, address: &str) -> Arc<SimulatedOutlet> {
        Arc::new(SimulatedOutlet::new(
            DeviceInfo::new(address, "Outlet", DeviceKind::Outlet, "OutletLinc"),
            registry.notifier(),
        ))
    }

    #[tokio::test]
    async fn test_change_reaches_only_its_adapter() -> anyhow::Result<()> {
        let registry = MemoryRegistry::new();
        let bus = SharedEventBus::new();
        let mut events = bus.subscribe::<CharacteristicEvent>()?;

        let a = outlet(&registry, "1A 2B 3C 1");
        let b = outlet(&registry, "1A 2B 3C 2");
        let index = Arc::new(AddressIndex::new());
        index.insert(Arc::new(OutletAccessory::new(a.clone(), bus.clone()))).await;
        index.insert(Arc::new(OutletAccessory::new(b.clone(), bus.clone()))).await;

        let dispatcher = ChangeDispatcher::new(index.clone());
        a.simulate_outlet(true)?;
        assert!(dispatcher.dispatch("1A 2B 3C 1").await);

        let event = events.recv().await?;
        assert_eq!(event.address.as_str(), "1A 2B 3C 1");
        assert_eq!(event.value, Value::Bool(true));
        assert!(events.try_recv().is_err());

        let b_accessory = index.get("1A 2B 3C 2").await.unwrap();
        assert_eq!(
            b_accessory.services()[1].value(CharacteristicKind::On),
            Some(Value::Bool(false))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_address_is_ignored() {
        let dispatcher = ChangeDispatcher::new(Arc::new(AddressIndex::new()));
        assert!(!dispatcher.dispatch("00 00 00 0").await);
    }

    #[test_log::test(tokio::test)]
    async fn test_run_until_closed() -> anyhow::Result<()> {
        let registry = MemoryRegistry::new();
        let device = outlet(&registry, "1A 2B 3C 1");
        let index = Arc::new(AddressIndex::new());
        index
            .insert(Arc::new(OutletAccessory::new(device, SharedEventBus::new())))
            .await;

        let (tx, rx) = broadcast::channel(8);
        tx.send(DeviceChanged::new("1A 2B 3C 1"))?;
        tx.send(DeviceChanged::new("00 00 00 0"))?;
        tx.send(DeviceChanged::new("1A 2B 3C 1"))?;
        drop(tx);

        let delivered = ChangeDispatcher::new(index).run(rx).await?;
        assert_eq!(delivered, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_lagged_receiver_keeps_running() -> anyhow::Result<()> {
        let index = Arc::new(AddressIndex::new());
        let (tx, rx) = broadcast::channel(1);
        tx.send(DeviceChanged::new("A"))?;
        tx.send(DeviceChanged::new("B"))?;
        drop(tx);

        assert_eq!(ChangeDispatcher::new(index).run(rx).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_dispatcher_delivers_registry_changes() -> anyhow::Result<()> {
        let registry = MemoryRegistry::new();
        let bus = SharedEventBus::new();
        let mut events = bus.subscribe::<CharacteristicEvent>()?;
        let device = outlet(&registry, "1A 2B 3C 1");

        let index = Arc::new(AddressIndex::new());
        index
            .insert(Arc::new(OutletAccessory::new(device.clone(), bus)))
            .await;
        let changes = hapbridge_devices::DeviceRegistry::subscribe_changes(&registry)?;
        let handle = ChangeDispatcher::new(index).spawn(changes);

        device.simulate_outlet(true)?;
        let event = events.recv().await?;
        assert_eq!(event.value, Value::Bool(true));

        handle.abort();
        Ok(())
    }
}
