//! Flattened BOM query: the read path feeding tree reconstruction and cost
//! roll-up.

use std::collections::{HashMap, HashSet};

use forgemfg_bom::{BomEdge, ChildSource, MAX_DEPTH};
use forgemfg_catalog::{ItemCatalog, ItemKind};
use forgemfg_core::{CustomerId, EdgeId, ItemId};
use forgemfg_view::BomRow;

/// Display-side filter applied to flattened rows.
///
/// Filtering is this layer's concern: the tree reconstructor and cost
/// aggregator only ever see the already-filtered set.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Case-insensitive substring over item code and name.
    pub text: Option<String>,
    /// Exact display level.
    pub level: Option<u32>,
    pub kind: Option<ItemKind>,
}

impl RowFilter {
    pub fn matches(&self, row: &BomRow) -> bool {
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !row.item_code.to_lowercase().contains(&needle)
                && !row.item_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(level) = self.level {
            if row.level != level {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if row.kind != kind {
                return false;
            }
        }
        true
    }
}

/// Produces the flattened, filterable BOM row list for a root item.
///
/// Walks the stored graph with the same bounded-depth, edge-ordered
/// traversal as the resolver and joins each edge with its catalog
/// attributes. One row per reachable edge; `actual_quantity` accumulates
/// the cumulative per-root-unit quantity across every path.
#[derive(Debug)]
pub struct BomQueryService<E, C> {
    edges: E,
    catalog: C,
}

impl<E, C> BomQueryService<E, C>
where
    E: ChildSource,
    C: ItemCatalog,
{
    pub fn new(edges: E, catalog: C) -> Self {
        Self { edges, catalog }
    }

    /// Flattened rows for `root`, scoped to `customer` when given, filtered
    /// by `filter`.
    pub fn rows(
        &self,
        root: ItemId,
        customer: Option<CustomerId>,
        filter: &RowFilter,
    ) -> Vec<BomRow> {
        let mut rows: Vec<BomRow> = Vec::new();
        let mut index_of: HashMap<EdgeId, usize> = HashMap::new();
        let mut path: HashSet<EdgeId> = HashSet::new();

        self.walk(root, None, 1.0, 1, customer, &mut path, &mut rows, &mut index_of);

        rows.retain(|row| filter.matches(row));
        rows
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        node: ItemId,
        parent_edge: Option<EdgeId>,
        cumulative: f64,
        depth: u32,
        customer: Option<CustomerId>,
        path: &mut HashSet<EdgeId>,
        rows: &mut Vec<BomRow>,
        index_of: &mut HashMap<EdgeId, usize>,
    ) {
        if depth > MAX_DEPTH {
            return;
        }

        let mut edges = self.edges.children(node, customer);
        edges.sort_unstable_by_key(|e| e.id);

        for edge in edges {
            if path.contains(&edge.id) {
                continue;
            }
            let quantity = cumulative * edge.quantity_required;

            if let Some(&i) = index_of.get(&edge.id) {
                // Reached again via another path: roll the quantity up into
                // the existing row.
                rows[i].actual_quantity += quantity;
            } else {
                let Some(item) = self.catalog.get(edge.child_item_id) else {
                    tracing::warn!(
                        edge_id = %edge.id,
                        item_id = %edge.child_item_id,
                        "edge references an item missing from the catalog; skipping subtree"
                    );
                    continue;
                };
                index_of.insert(edge.id, rows.len());
                rows.push(Self::row_for(&edge, &item, parent_edge, depth, quantity));
            }

            path.insert(edge.id);
            self.walk(
                edge.child_item_id,
                Some(edge.id),
                quantity,
                depth + 1,
                customer,
                path,
                rows,
                index_of,
            );
            path.remove(&edge.id);
        }
    }

    fn row_for(
        edge: &BomEdge,
        item: &forgemfg_catalog::ItemRecord,
        parent_edge: Option<EdgeId>,
        depth: u32,
        quantity: f64,
    ) -> BomRow {
        BomRow {
            edge_id: edge.id,
            parent_edge_id: edge.parent_edge_id.or(parent_edge),
            parent_item_id: edge.parent_item_id,
            child_item_id: edge.child_item_id,
            item_code: item.code.clone(),
            item_name: item.name.clone(),
            kind: item.kind,
            form: item.form,
            procurement: item.procurement,
            level: depth,
            quantity_required: edge.quantity_required,
            actual_quantity: quantity,
            unit_price: item.unit_price,
            scrap_weight: item.scrap_weight,
            scrap_unit_price: item.scrap_unit_price,
            remarks: edge.remarks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::stores::{InMemoryEdgeStore, InMemoryItemStore};
    use forgemfg_bom::{EdgeStore, NewEdge};
    use forgemfg_catalog::{ItemForm, ItemRecord, Procurement};

    fn item(code: &str, kind: ItemKind, price: f64) -> ItemRecord {
        ItemRecord {
            id: ItemId::new(),
            code: code.to_string(),
            name: format!("{code} name"),
            kind,
            form: ItemForm::Other,
            procurement: Procurement::InHouse,
            current_stock: 0.0,
            unit_price: price,
            scrap_weight: 0.0,
            scrap_unit_price: 0.0,
            active: true,
        }
    }

    fn setup() -> (
        Arc<InMemoryItemStore>,
        Arc<InMemoryEdgeStore<Arc<InMemoryItemStore>>>,
        BomQueryService<Arc<InMemoryEdgeStore<Arc<InMemoryItemStore>>>, Arc<InMemoryItemStore>>,
    ) {
        let catalog = Arc::new(InMemoryItemStore::new());
        let edges = Arc::new(InMemoryEdgeStore::new(catalog.clone()));
        let query = BomQueryService::new(edges.clone(), catalog.clone());
        (catalog, edges, query)
    }

    fn link(
        edges: &InMemoryEdgeStore<Arc<InMemoryItemStore>>,
        parent: ItemId,
        child: ItemId,
        quantity: f64,
        level: u32,
    ) {
        edges
            .upsert(
                NewEdge {
                    id: None,
                    parent_item_id: parent,
                    child_item_id: child,
                    quantity_required: quantity,
                    level_no: level,
                    customer_id: None,
                    parent_edge_id: None,
                    remarks: None,
                },
                Utc::now(),
            )
            .unwrap();
    }

    #[test]
    fn flattens_with_levels_and_cumulative_quantities() {
        let (catalog, edges, query) = setup();
        let root = item("FG-1", ItemKind::Finished, 0.0);
        let mid = item("SF-1", ItemKind::SemiFinished, 2.0);
        let leaf = item("RM-1", ItemKind::Raw, 5.0);
        catalog.insert(root.clone());
        catalog.insert(mid.clone());
        catalog.insert(leaf.clone());
        link(&edges, root.id, mid.id, 3.0, 1);
        link(&edges, mid.id, leaf.id, 2.0, 2);

        let rows = query.rows(root.id, None, &RowFilter::default());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item_code, "SF-1");
        assert_eq!(rows[0].level, 1);
        assert_eq!(rows[0].actual_quantity, 3.0);
        assert_eq!(rows[1].item_code, "RM-1");
        assert_eq!(rows[1].level, 2);
        assert_eq!(rows[1].actual_quantity, 6.0);
        // Traversal fills the parent link even without a stored reference.
        assert_eq!(rows[1].parent_edge_id, Some(rows[0].edge_id));
    }

    #[test]
    fn shared_component_rows_accumulate_quantity() {
        let (catalog, edges, query) = setup();
        let root = item("FG-1", ItemKind::Finished, 0.0);
        let left = item("SF-L", ItemKind::SemiFinished, 0.0);
        let right = item("SF-R", ItemKind::SemiFinished, 0.0);
        let shared = item("RM-S", ItemKind::Raw, 0.0);
        for record in [&root, &left, &right, &shared] {
            catalog.insert((*record).clone());
        }
        link(&edges, root.id, left.id, 2.0, 1);
        link(&edges, root.id, right.id, 3.0, 1);
        link(&edges, left.id, shared.id, 1.0, 2);
        link(&edges, right.id, shared.id, 4.0, 2);

        let rows = query.rows(root.id, None, &RowFilter::default());

        // Two distinct edges into the shared item: one row each.
        let shared_rows: Vec<&BomRow> = rows
            .iter()
            .filter(|r| r.child_item_id == shared.id)
            .collect();
        assert_eq!(shared_rows.len(), 2);
        let total: f64 = shared_rows.iter().map(|r| r.actual_quantity).sum();
        assert_eq!(total, 14.0);
    }

    #[test]
    fn filter_by_text_level_and_kind() {
        let (catalog, edges, query) = setup();
        let root = item("FG-1", ItemKind::Finished, 0.0);
        let mid = item("SF-1", ItemKind::SemiFinished, 0.0);
        let leaf = item("RM-1", ItemKind::Raw, 0.0);
        catalog.insert(root.clone());
        catalog.insert(mid.clone());
        catalog.insert(leaf.clone());
        link(&edges, root.id, mid.id, 1.0, 1);
        link(&edges, mid.id, leaf.id, 1.0, 2);

        let by_text = query.rows(
            root.id,
            None,
            &RowFilter {
                text: Some("rm-".to_string()),
                ..RowFilter::default()
            },
        );
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].item_code, "RM-1");

        let by_level = query.rows(
            root.id,
            None,
            &RowFilter {
                level: Some(1),
                ..RowFilter::default()
            },
        );
        assert_eq!(by_level.len(), 1);
        assert_eq!(by_level[0].item_code, "SF-1");

        let by_kind = query.rows(
            root.id,
            None,
            &RowFilter {
                kind: Some(ItemKind::Raw),
                ..RowFilter::default()
            },
        );
        assert_eq!(by_kind.len(), 1);
        assert_eq!(by_kind[0].item_code, "RM-1");
    }

    #[test]
    fn unknown_root_yields_no_rows() {
        let (_, _, query) = setup();
        assert!(query.rows(ItemId::new(), None, &RowFilter::default()).is_empty());
    }

    #[test]
    fn cycle_does_not_hang_the_query() {
        let (catalog, edges, query) = setup();
        let a = item("A", ItemKind::SemiFinished, 0.0);
        let b = item("B", ItemKind::SemiFinished, 0.0);
        catalog.insert(a.clone());
        catalog.insert(b.clone());
        link(&edges, a.id, b.id, 1.0, 1);
        link(&edges, b.id, a.id, 1.0, 2);

        let rows = query.rows(a.id, None, &RowFilter::default());
        assert!(!rows.is_empty());
        assert!(rows.len() <= MAX_DEPTH as usize);
    }
}
