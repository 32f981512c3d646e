use serde::{Deserialize, Serialize};

use forgemfg_core::{Entity, ItemId};

/// Position of an item in the manufacturing hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Raw,
    SemiFinished,
    Finished,
}

/// Physical form of the material. `Coil` rows are counted separately on
/// cost summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemForm {
    Coil,
    Sheet,
    Other,
}

/// How the item is sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Procurement {
    InHouse,
    Purchased,
}

/// Item master attributes read by the BOM core.
///
/// Owned by the catalog collaborator. `current_stock` is signed and may go
/// negative (the permissive stock policy records real-world shortages
/// instead of blocking production).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    pub kind: ItemKind,
    pub form: ItemForm,
    pub procurement: Procurement,
    pub current_stock: f64,
    pub unit_price: f64,
    pub scrap_weight: f64,
    pub scrap_unit_price: f64,
    pub active: bool,
}

impl Entity for ItemRecord {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

/// Read access to the item master.
pub trait ItemCatalog: Send + Sync {
    fn get(&self, id: ItemId) -> Option<ItemRecord>;
}

impl<C> ItemCatalog for std::sync::Arc<C>
where
    C: ItemCatalog + ?Sized,
{
    fn get(&self, id: ItemId) -> Option<ItemRecord> {
        (**self).get(id)
    }
}
