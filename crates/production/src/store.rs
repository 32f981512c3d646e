//! Transactional write seam of the deduction path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use forgemfg_core::{ItemId, TransactionId};

use crate::log::DeductionLogEntry;
use crate::plan::DeductionPlan;
use crate::policy::StockPolicy;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProductionStoreError {
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// Strict policy only: the plan would drive this item negative.
    #[error("stock shortfall on item {item_id}: deducting {attempted} from {available}")]
    Shortfall {
        item_id: ItemId,
        available: f64,
        attempted: f64,
    },

    /// The transaction has already committed; redelivery must be a no-op.
    #[error("transaction {0} already applied")]
    AlreadyApplied(TransactionId),

    /// Lost-update detected; the engine retries with backoff.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Result of committing one deduction plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommittedDeduction {
    /// Audit entries in edge-id order, before/after stock captured at commit.
    pub entries: Vec<DeductionLogEntry>,
    /// Items whose stock ended below zero under the permissive policy.
    pub shortfalls: u32,
}

/// Transactional write side of the deduction path.
///
/// `execute` applies the whole plan — stock decrements, audit appends and
/// the applied-marker — **atomically**: any failure leaves no observable
/// effect. Concurrent executions serialize their read-modify-write per
/// item, so overlapping plans never lose updates. The applied-marker check
/// happens inside the same atomic section.
pub trait ProductionStore: Send + Sync {
    /// Cheap pre-check; `execute` still refuses applied transactions.
    fn is_applied(&self, transaction_id: TransactionId) -> bool;

    /// Atomically commit `plan` under `policy`.
    fn execute(
        &self,
        plan: &DeductionPlan,
        policy: StockPolicy,
    ) -> Result<CommittedDeduction, ProductionStoreError>;

    /// Audit trail of one transaction, in insertion order.
    fn log_for(&self, transaction_id: TransactionId) -> Vec<DeductionLogEntry>;
}

impl<S> ProductionStore for std::sync::Arc<S>
where
    S: ProductionStore + ?Sized,
{
    fn is_applied(&self, transaction_id: TransactionId) -> bool {
        (**self).is_applied(transaction_id)
    }

    fn execute(
        &self,
        plan: &DeductionPlan,
        policy: StockPolicy,
    ) -> Result<CommittedDeduction, ProductionStoreError> {
        (**self).execute(plan, policy)
    }

    fn log_for(&self, transaction_id: TransactionId) -> Vec<DeductionLogEntry> {
        (**self).log_for(transaction_id)
    }
}
