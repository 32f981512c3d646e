use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgemfg_bom::Resolution;
use forgemfg_core::{EdgeId, ItemId, TransactionId};

use crate::event::ProductionEvent;

/// One planned stock decrement. `stock_before`/`stock_after` are unknown
/// until the store applies the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDeduction {
    pub edge_id: EdgeId,
    pub parent_item_id: ItemId,
    pub child_item_id: ItemId,
    pub bom_level: u32,
    pub quantity_required: f64,
    pub parent_quantity: f64,
    pub deducted_quantity: f64,
}

/// Everything one production event wants to write: per-edge deductions in
/// edge-id order, applied atomically or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionPlan {
    pub transaction_id: TransactionId,
    pub root_item_id: ItemId,
    pub produced_quantity: f64,
    pub deductions: Vec<PlannedDeduction>,
    pub occurred_at: DateTime<Utc>,
}

impl DeductionPlan {
    /// Turn a resolver result into the write set for `event`.
    pub fn from_resolution(event: &ProductionEvent, resolution: &Resolution) -> Self {
        let deductions = resolution
            .contributions
            .iter()
            .map(|c| PlannedDeduction {
                edge_id: c.edge_id,
                parent_item_id: c.parent_item_id,
                child_item_id: c.child_item_id,
                bom_level: c.bom_level,
                quantity_required: c.quantity_required,
                parent_quantity: c.parent_quantity,
                deducted_quantity: c.deducted_quantity,
            })
            .collect();

        Self {
            transaction_id: event.transaction_id,
            root_item_id: event.item_id,
            produced_quantity: event.quantity,
            deductions,
            occurred_at: event.occurred_at,
        }
    }

    /// Net decrement per item (contributions through different edges summed),
    /// in item-id order.
    pub fn item_deltas(&self) -> Vec<(ItemId, f64)> {
        let mut totals: BTreeMap<ItemId, f64> = BTreeMap::new();
        for d in &self.deductions {
            *totals.entry(d.child_item_id).or_insert(0.0) += d.deducted_quantity;
        }
        totals.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty()
    }
}
