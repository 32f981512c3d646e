use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgemfg_core::{ItemId, TransactionId};

/// Immutable audit fact: one stock decrement caused by one production event.
///
/// Created exactly once per (transaction, contributing edge) pair; never
/// mutated or deleted afterwards. `stock_before`/`stock_after` are captured
/// inside the same atomic unit that applies the decrement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionLogEntry {
    pub transaction_id: TransactionId,
    pub parent_item_id: ItemId,
    pub child_item_id: ItemId,
    pub bom_level: u32,
    /// Required quantity of the child per one unit of the parent.
    pub quantity_required: f64,
    /// Cumulative parent units this deduction derives from.
    pub parent_quantity: f64,
    pub deducted_quantity: f64,
    pub stock_before: f64,
    pub stock_after: f64,
    pub created_at: DateTime<Utc>,
}
