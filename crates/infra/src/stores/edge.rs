use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use forgemfg_bom::edge::{self, BomEdge, BulkRowResult, BulkUpsertReport, NewEdge};
use forgemfg_bom::store::{BULK_LIMIT, ChildSource, EdgeStore};
use forgemfg_catalog::ItemCatalog;
use forgemfg_core::{CustomerId, DomainError, DomainResult, EdgeId, ItemId};

/// In-memory BOM graph store, validating rows against the item catalog.
///
/// Composed generically over any [`ItemCatalog`], the same way read models
/// compose over their backing stores.
#[derive(Debug)]
pub struct InMemoryEdgeStore<C> {
    catalog: C,
    edges: RwLock<HashMap<EdgeId, BomEdge>>,
}

impl<C> InMemoryEdgeStore<C>
where
    C: ItemCatalog,
{
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            edges: RwLock::new(HashMap::new()),
        }
    }

    /// Active edge count (all customers).
    pub fn active_edges(&self) -> usize {
        self.edges
            .read()
            .map(|edges| edges.values().filter(|e| e.active).count())
            .unwrap_or(0)
    }

    fn row_errors(&self, new: &NewEdge) -> Vec<String> {
        let parent = self.catalog.get(new.parent_item_id);
        let child = self.catalog.get(new.child_item_id);
        edge::validate(new, parent.as_ref(), child.as_ref())
    }

    fn materialize(new: NewEdge, existing: Option<&BomEdge>, now: DateTime<Utc>) -> BomEdge {
        BomEdge {
            id: new.id.unwrap_or_else(EdgeId::new),
            parent_item_id: new.parent_item_id,
            child_item_id: new.child_item_id,
            quantity_required: new.quantity_required,
            level_no: new.level_no,
            customer_id: new.customer_id,
            parent_edge_id: new.parent_edge_id,
            active: true,
            remarks: new.remarks,
            created_at: existing.map(|e| e.created_at).unwrap_or(now),
            updated_at: now,
        }
    }
}

impl<C> ChildSource for InMemoryEdgeStore<C>
where
    C: ItemCatalog,
{
    fn children(&self, parent: ItemId, customer: Option<CustomerId>) -> Vec<BomEdge> {
        let Ok(edges) = self.edges.read() else {
            return Vec::new();
        };
        let mut out: Vec<BomEdge> = edges
            .values()
            .filter(|e| e.active && e.parent_item_id == parent)
            .filter(|e| match customer {
                None => true,
                // A customer variant overlays the shared BOM.
                Some(c) => e.customer_id.is_none() || e.customer_id == Some(c),
            })
            .cloned()
            .collect();
        out.sort_unstable_by_key(|e| e.id);
        out
    }
}

impl<C> EdgeStore for InMemoryEdgeStore<C>
where
    C: ItemCatalog,
{
    fn upsert(&self, new: NewEdge, now: DateTime<Utc>) -> DomainResult<BomEdge> {
        let parent = self.catalog.get(new.parent_item_id);
        let child = self.catalog.get(new.child_item_id);
        edge::validate_strict(&new, parent.as_ref(), child.as_ref())?;

        let mut edges = self
            .edges
            .write()
            .map_err(|_| DomainError::conflict("edge store lock poisoned"))?;
        let existing = new.id.and_then(|id| edges.get(&id)).cloned();
        let row = Self::materialize(new, existing.as_ref(), now);
        edges.insert(row.id, row.clone());
        Ok(row)
    }

    fn deactivate(&self, id: EdgeId, now: DateTime<Utc>) -> DomainResult<()> {
        let mut edges = self
            .edges
            .write()
            .map_err(|_| DomainError::conflict("edge store lock poisoned"))?;
        let row = edges.get_mut(&id).ok_or_else(DomainError::not_found)?;
        row.active = false;
        row.updated_at = now;
        Ok(())
    }

    fn bulk_upsert(&self, rows: Vec<NewEdge>, now: DateTime<Utc>) -> DomainResult<BulkUpsertReport> {
        if rows.len() > BULK_LIMIT {
            return Err(DomainError::validation(format!(
                "bulk upsert accepts at most {BULK_LIMIT} rows (got {})",
                rows.len()
            )));
        }

        // Validate every row before touching storage; each row stands alone.
        let validated: Vec<(NewEdge, Vec<String>)> = rows
            .into_iter()
            .map(|row| {
                let errors = self.row_errors(&row);
                (row, errors)
            })
            .collect();

        let mut edges = self
            .edges
            .write()
            .map_err(|_| DomainError::conflict("edge store lock poisoned"))?;

        let mut report = BulkUpsertReport::default();
        for (index, (row, errors)) in validated.into_iter().enumerate() {
            if errors.is_empty() {
                let existing = row.id.and_then(|id| edges.get(&id)).cloned();
                let stored = Self::materialize(row, existing.as_ref(), now);
                let id = stored.id;
                edges.insert(id, stored);
                report.rows.push(BulkRowResult {
                    index,
                    edge_id: Some(id),
                    errors,
                });
            } else {
                report.rows.push(BulkRowResult {
                    index,
                    edge_id: None,
                    errors,
                });
            }
        }

        tracing::debug!(
            inserted = report.inserted(),
            rejected = report.rejected(),
            "bulk edge upsert"
        );
        Ok(report)
    }

    fn get(&self, id: EdgeId) -> Option<BomEdge> {
        self.edges.read().ok().and_then(|edges| edges.get(&id).cloned())
    }
}
