use serde::{Deserialize, Serialize};

use forgemfg_catalog::{ItemForm, ItemKind, Procurement};
use forgemfg_core::{EdgeId, ItemId};

/// One flattened BOM entry: an edge joined with catalog attributes.
///
/// Produced by the query service, filtered externally, then fed to
/// [`crate::tree::reconstruct`] and [`crate::cost::summarize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomRow {
    pub edge_id: EdgeId,
    /// Parent edge reference; filled from the stored edge or, failing that,
    /// from the traversal that produced this row.
    pub parent_edge_id: Option<EdgeId>,
    pub parent_item_id: ItemId,
    pub child_item_id: ItemId,
    pub item_code: String,
    pub item_name: String,
    pub kind: ItemKind,
    pub form: ItemForm,
    pub procurement: Procurement,
    /// Display level: 1 for forest roots.
    pub level: u32,
    /// Required quantity of this item per one unit of its parent.
    pub quantity_required: f64,
    /// Cumulative quantity per one unit of the BOM root; callers may
    /// overwrite with a measured actual before cost aggregation.
    pub actual_quantity: f64,
    pub unit_price: f64,
    pub scrap_weight: f64,
    pub scrap_unit_price: f64,
    pub remarks: Option<String>,
}
