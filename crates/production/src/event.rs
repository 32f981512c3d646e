use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgemfg_core::{DomainError, DomainResult, ItemId, TransactionId};

/// Completed-production notification from the production subsystem.
///
/// Arrival of one of these is the sole trigger of the deduction engine;
/// this module never originates them. `transaction_id` is the idempotency
/// key: redelivery of an already-committed transaction is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub transaction_id: TransactionId,
    /// The item whose production completed.
    pub item_id: ItemId,
    /// Units produced (> 0).
    pub quantity: f64,
    pub occurred_at: DateTime<Utc>,
}

impl ProductionEvent {
    /// Reject events that must not cause any side effect.
    pub fn validate(&self) -> DomainResult<()> {
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(DomainError::validation(format!(
                "produced quantity must be > 0 (got {})",
                self.quantity
            )));
        }
        Ok(())
    }
}
