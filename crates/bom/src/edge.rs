use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgemfg_catalog::ItemRecord;
use forgemfg_core::{CustomerId, DomainError, DomainResult, EdgeId, ItemId};

/// One parent-requires-child relationship in the BOM graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEdge {
    pub id: EdgeId,
    pub parent_item_id: ItemId,
    pub child_item_id: ItemId,
    /// Required quantity of the child per one unit of the parent (> 0).
    pub quantity_required: f64,
    /// Distance from the declared root (>= 1).
    pub level_no: u32,
    /// Scopes the edge to one customer's BOM variant; `None` applies to all.
    pub customer_id: Option<CustomerId>,
    /// Explicit parent edge reference, preferred by tree reconstruction over
    /// level-proximity matching.
    pub parent_edge_id: Option<EdgeId>,
    pub active: bool,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing one edge row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    /// `Some` replaces an existing row (or inserts with a caller-chosen id).
    pub id: Option<EdgeId>,
    pub parent_item_id: ItemId,
    pub child_item_id: ItemId,
    pub quantity_required: f64,
    pub level_no: u32,
    pub customer_id: Option<CustomerId>,
    pub parent_edge_id: Option<EdgeId>,
    pub remarks: Option<String>,
}

/// Row-level validation against the item master.
///
/// Returns every problem with the row, for the per-row error lists of bulk
/// upserts. Self-reference and duplicate (parent, child, customer) tuples
/// are accepted on purpose: duplicate rows are summed by consumers, and
/// cycle safety is the resolver's job.
pub fn validate(
    new: &NewEdge,
    parent: Option<&ItemRecord>,
    child: Option<&ItemRecord>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if !(new.quantity_required.is_finite() && new.quantity_required > 0.0) {
        errors.push(format!(
            "quantity_required must be > 0 (got {})",
            new.quantity_required
        ));
    }
    if new.level_no == 0 {
        errors.push("level_no must be >= 1".to_string());
    }

    match parent {
        None => errors.push(format!("parent item {} not found", new.parent_item_id)),
        Some(p) if !p.active => errors.push(format!("parent item {} is inactive", p.code)),
        Some(_) => {}
    }
    match child {
        None => errors.push(format!("child item {} not found", new.child_item_id)),
        Some(c) if !c.active => errors.push(format!("child item {} is inactive", c.code)),
        Some(_) => {}
    }

    errors
}

/// Single-row variant of [`validate`]: first failure as a `DomainError`.
pub fn validate_strict(
    new: &NewEdge,
    parent: Option<&ItemRecord>,
    child: Option<&ItemRecord>,
) -> DomainResult<()> {
    match validate(new, parent, child).into_iter().next() {
        None => Ok(()),
        Some(msg) => Err(DomainError::validation(msg)),
    }
}

/// Outcome of one row in a bulk upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRowResult {
    /// Position of the row in the submitted batch.
    pub index: usize,
    /// Id of the stored edge when the row was valid.
    pub edge_id: Option<EdgeId>,
    pub errors: Vec<String>,
}

impl BulkRowResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-row report of a bulk upsert (partial-success semantics).
///
/// Every submitted row appears here exactly once; the valid subset commits
/// and the invalid rows carry their reasons. There is no global rollback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkUpsertReport {
    pub rows: Vec<BulkRowResult>,
}

impl BulkUpsertReport {
    pub fn inserted(&self) -> usize {
        self.rows.iter().filter(|r| r.is_valid()).count()
    }

    pub fn rejected(&self) -> usize {
        self.rows.len() - self.inserted()
    }
}
