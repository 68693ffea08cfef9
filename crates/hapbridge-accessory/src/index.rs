/*!
 * Device address index.
 *
 * Maps each surfaced device address to the adapter representing it. The
 * platform fills it during enumeration and the change dispatcher reads it to
 * route device notifications.
 */
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use hapbridge_core::types::Address;

use crate::accessory::Accessory;

/// Address → adapter map shared between the platform and the dispatcher
#[derive(Debug, Default)]
pub struct AddressIndex {
    entries: RwLock<HashMap<Address, Arc<dyn Accessory>>>,
}

impl AddressIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the adapter for its address, returning the one it replaces
    pub async fn insert(&self, accessory: Arc<dyn Accessory>) -> Option<Arc<dyn Accessory>> {
        let address = accessory.address().clone();
        debug!("Indexing {} under {}", accessory.name(), address);
        self.entries.write().await.insert(address, accessory)
    }

    /// Replace the whole content with `accessories`
    pub async fn replace_all<I>(&self, accessories: I)
    where
        I: IntoIterator<Item = Arc<dyn Accessory>>,
    {
        let entries: HashMap<_, _> = accessories
            .into_iter()
            .map(|accessory| (accessory.address().clone(), accessory))
            .collect();
        debug!("Index rebuilt with {} entries", entries.len());
        *self.entries.write().await = entries;
    }

    /// The adapter for an address
    pub async fn get(&self, address: &str) -> Option<Arc<dyn Accessory>> {
        self.entries.read().await.get(address).cloned()
    }

    /// Whether an adapter is recorded for an address
    pub async fn contains(&self, address: &str) -> bool {
        self.entries.read().await.contains_key(address)
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the index is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Indexed addresses, sorted
    pub async fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.entries.read().await.keys().cloned().collect();
        addresses.sort();
        addresses
    }
}
