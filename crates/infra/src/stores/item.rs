use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use forgemfg_catalog::{ItemCatalog, ItemRecord};
use forgemfg_core::ItemId;

/// In-memory item master.
///
/// Serves catalog reads; stock mutation happens only through
/// [`super::InMemoryProductionStore`], which takes the write guard for the
/// whole of one deduction transaction.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<ItemId, ItemRecord>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: ItemRecord) {
        if let Ok(mut items) = self.items.write() {
            items.insert(item.id, item);
        }
    }

    /// Current stock of one item, if known.
    pub fn stock(&self, id: ItemId) -> Option<f64> {
        self.items
            .read()
            .ok()
            .and_then(|items| items.get(&id).map(|r| r.current_stock))
    }

    pub(crate) fn write_items(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<ItemId, ItemRecord>>, String> {
        self.items
            .write()
            .map_err(|_| "item store lock poisoned".to_string())
    }
}

impl ItemCatalog for InMemoryItemStore {
    fn get(&self, id: ItemId) -> Option<ItemRecord> {
        self.items
            .read()
            .ok()
            .and_then(|items| items.get(&id).cloned())
    }
}
