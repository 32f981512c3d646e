use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use forgemfg_core::TransactionId;
use forgemfg_production::{
    CommittedDeduction, DeductionLogEntry, DeductionPlan, ProductionStore, ProductionStoreError,
    StockPolicy,
};

use super::item::InMemoryItemStore;

#[derive(Debug, Default)]
struct LedgerState {
    /// Append-only audit trail.
    log: Vec<DeductionLogEntry>,
    /// Committed transaction ids (idempotency markers).
    applied: HashSet<TransactionId>,
}

/// In-memory transactional store for the deduction path.
///
/// One write guard over the ledger state serializes concurrent `execute`
/// calls; the item map's write guard is held for the whole transaction, so
/// stock reads, decrements, audit appends and the applied-marker commit as
/// one unit. Validation runs before the first mutation — a rejected plan
/// leaves no observable effect.
#[derive(Debug)]
pub struct InMemoryProductionStore {
    items: Arc<InMemoryItemStore>,
    state: RwLock<LedgerState>,
}

impl InMemoryProductionStore {
    pub fn new(items: Arc<InMemoryItemStore>) -> Self {
        Self {
            items,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// All audit entries, in insertion order.
    pub fn log_len(&self) -> usize {
        self.state.read().map(|s| s.log.len()).unwrap_or(0)
    }
}

impl ProductionStore for InMemoryProductionStore {
    fn is_applied(&self, transaction_id: TransactionId) -> bool {
        self.state
            .read()
            .map(|s| s.applied.contains(&transaction_id))
            .unwrap_or(false)
    }

    fn execute(
        &self,
        plan: &DeductionPlan,
        policy: StockPolicy,
    ) -> Result<CommittedDeduction, ProductionStoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| ProductionStoreError::Storage("ledger lock poisoned".to_string()))?;

        if state.applied.contains(&plan.transaction_id) {
            return Err(ProductionStoreError::AlreadyApplied(plan.transaction_id));
        }

        let mut items = self
            .items
            .write_items()
            .map_err(ProductionStoreError::Storage)?;

        // Validate before the first write: every item present, and under the
        // strict policy no item may end below zero.
        let deltas = plan.item_deltas();
        for (item_id, delta) in &deltas {
            let record = items
                .get(item_id)
                .ok_or(ProductionStoreError::ItemNotFound(*item_id))?;
            if policy == StockPolicy::Strict && record.current_stock - delta < 0.0 {
                return Err(ProductionStoreError::Shortfall {
                    item_id: *item_id,
                    available: record.current_stock,
                    attempted: *delta,
                });
            }
        }

        // Apply per contributing edge, capturing before/after stock under
        // the same guard.
        let mut entries = Vec::with_capacity(plan.deductions.len());
        for d in &plan.deductions {
            let record = items
                .get_mut(&d.child_item_id)
                .ok_or(ProductionStoreError::ItemNotFound(d.child_item_id))?;
            let stock_before = record.current_stock;
            record.current_stock -= d.deducted_quantity;
            entries.push(DeductionLogEntry {
                transaction_id: plan.transaction_id,
                parent_item_id: d.parent_item_id,
                child_item_id: d.child_item_id,
                bom_level: d.bom_level,
                quantity_required: d.quantity_required,
                parent_quantity: d.parent_quantity,
                deducted_quantity: d.deducted_quantity,
                stock_before,
                stock_after: record.current_stock,
                created_at: plan.occurred_at,
            });
        }

        let shortfalls = deltas
            .iter()
            .filter(|(item_id, _)| {
                items
                    .get(item_id)
                    .is_some_and(|r| r.current_stock < 0.0)
            })
            .count() as u32;

        state.log.extend(entries.iter().cloned());
        state.applied.insert(plan.transaction_id);

        Ok(CommittedDeduction { entries, shortfalls })
    }

    fn log_for(&self, transaction_id: TransactionId) -> Vec<DeductionLogEntry> {
        self.state
            .read()
            .map(|s| {
                s.log
                    .iter()
                    .filter(|e| e.transaction_id == transaction_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
