//! Cost roll-up over a filtered row set.
//!
//! Per row: `material_cost = quantity_required * unit_price`,
//! `scrap_revenue = actual_quantity * scrap_weight * scrap_unit_price`,
//! `net_cost = material_cost - scrap_revenue`. The summary is one pass over
//! the rows it is given — always the *currently filtered* set, never the
//! whole graph.

use serde::{Deserialize, Serialize};

use forgemfg_catalog::{ItemForm, Procurement};
use forgemfg_core::ValueObject;

use crate::row::BomRow;

/// Per-row cost figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RowCost {
    pub material_cost: f64,
    pub scrap_revenue: f64,
    pub net_cost: f64,
}

impl RowCost {
    pub fn of(row: &BomRow) -> Self {
        let material_cost = row.quantity_required * row.unit_price;
        let scrap_revenue = row.actual_quantity * row.scrap_weight * row.scrap_unit_price;
        Self {
            material_cost,
            scrap_revenue,
            net_cost: material_cost - scrap_revenue,
        }
    }
}

impl ValueObject for RowCost {}

/// Aggregated costs and row counts for one filtered row set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_material_cost: f64,
    pub total_scrap_revenue: f64,
    pub total_net_cost: f64,
    /// Rows whose item form is coil.
    pub coil_rows: usize,
    /// Rows sourced from outside (externally purchased).
    pub purchased_rows: usize,
    pub row_count: usize,
}

impl ValueObject for CostSummary {}

/// Single pass over `rows`.
pub fn summarize(rows: &[BomRow]) -> CostSummary {
    let mut summary = CostSummary::default();
    for row in rows {
        let cost = RowCost::of(row);
        summary.total_material_cost += cost.material_cost;
        summary.total_scrap_revenue += cost.scrap_revenue;
        summary.total_net_cost += cost.net_cost;
        if row.form == ItemForm::Coil {
            summary.coil_rows += 1;
        }
        if row.procurement == Procurement::Purchased {
            summary.purchased_rows += 1;
        }
        summary.row_count += 1;
    }
    summary
}
