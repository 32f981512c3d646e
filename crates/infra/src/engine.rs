//! Deduction pipeline orchestration.
//!
//! The engine is the explicit, synchronous handler for production events —
//! the storage layer never triggers deductions on its own. One call runs
//! the full lifecycle: validate, check idempotency, resolve the BOM, apply
//! the plan atomically through the production store, retrying conflicting
//! writes with bounded backoff.
//!
//! ```text
//! ProductionEvent
//!   |
//! 1. Validate (quantity > 0; no side effects on rejection)
//!   |
//! 2. Idempotency check (committed transaction ids are a no-op)
//!   |
//! 3. Resolve BOM (shallow or deep strategy, bounded depth)
//!   |
//! 4. Execute plan (stock writes + audit trail + marker, one atomic unit)
//! ```
//!
//! This module contains no storage itself; it composes the graph and
//! production store traits.

use thiserror::Error;

use forgemfg_bom::{ChildSource, ResolverStrategy, resolve};
use forgemfg_core::{DomainError, ItemId, TransactionId};
use forgemfg_production::{
    DeductionLogEntry, DeductionPlan, DeductionState, ProductionEvent, ProductionStore,
    ProductionStoreError, RetryPolicy, StockPolicy,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeductionError {
    /// Deterministic rejection before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A deducted item is missing from the catalog.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// Strict stock policy refused the plan.
    #[error("stock shortfall: {0}")]
    Shortfall(String),

    /// Lost-update conflicts survived every retry.
    #[error("write conflict after {attempts} attempt(s): {message}")]
    Conflict { attempts: u32, message: String },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for DeductionError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::StockShortfall(msg) => Self::Shortfall(msg),
            DomainError::NotFound => Self::Validation("referenced entity not found".to_string()),
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => Self::Storage(msg),
        }
    }
}

/// What happened to one accepted production event.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionOutcome {
    pub transaction_id: TransactionId,
    /// Terminal state; always `Committed` for an `Ok` outcome.
    pub state: DeductionState,
    /// True when the transaction had already committed and stock was left
    /// untouched.
    pub already_applied: bool,
    /// Audit entries written by this call, in edge-id order.
    pub entries: Vec<DeductionLogEntry>,
    /// Items left below zero under the permissive policy.
    pub shortfalls: u32,
    /// Resolver paths dropped at the depth bound; non-zero means the
    /// rollup under-counts deep descendants.
    pub truncated_paths: u64,
    pub cycle_skips: u64,
}

impl DeductionOutcome {
    fn already_applied(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            state: DeductionState::Committed,
            already_applied: true,
            entries: Vec::new(),
            shortfalls: 0,
            truncated_paths: 0,
            cycle_skips: 0,
        }
    }
}

/// Reusable execution engine for the deduction path.
///
/// Composes a [`ChildSource`] (the BOM graph) and a [`ProductionStore`]
/// (the transactional write side). Reads run lock-free; all writes go
/// through the store's atomic `execute`.
#[derive(Debug)]
pub struct DeductionEngine<E, P> {
    edges: E,
    store: P,
    strategy: ResolverStrategy,
    stock_policy: StockPolicy,
    retry: RetryPolicy,
}

impl<E, P> DeductionEngine<E, P>
where
    E: ChildSource,
    P: ProductionStore,
{
    pub fn new(edges: E, store: P) -> Self {
        Self {
            edges,
            store,
            strategy: ResolverStrategy::Deep,
            stock_policy: StockPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ResolverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Handle one production event to full commit or full failure.
    pub fn handle(&self, event: &ProductionEvent) -> Result<DeductionOutcome, DeductionError> {
        let mut state = DeductionState::Received;

        event.validate().map_err(DeductionError::from)?;

        if self.store.is_applied(event.transaction_id) {
            tracing::debug!(
                transaction_id = %event.transaction_id,
                "transaction already applied; skipping"
            );
            return Ok(DeductionOutcome::already_applied(event.transaction_id));
        }

        state = self.transition(event, state, DeductionState::Resolving);
        let resolution = resolve(
            &self.edges,
            event.item_id,
            event.quantity,
            None,
            self.strategy,
        );
        let plan = DeductionPlan::from_resolution(event, &resolution);

        state = self.transition(event, state, DeductionState::Applying);
        let mut attempt = 1u32;
        let committed = loop {
            match self.store.execute(&plan, self.stock_policy) {
                Ok(committed) => break committed,
                Err(ProductionStoreError::AlreadyApplied(_)) => {
                    // Lost the race against a concurrent redelivery; stock
                    // is already correct.
                    return Ok(DeductionOutcome::already_applied(event.transaction_id));
                }
                Err(ProductionStoreError::Conflict(message)) => {
                    if attempt >= self.retry.max_attempts {
                        self.fail(event, state);
                        return Err(DeductionError::Conflict {
                            attempts: attempt,
                            message,
                        });
                    }
                    tracing::debug!(
                        transaction_id = %event.transaction_id,
                        attempt,
                        "stock write conflict; backing off"
                    );
                    std::thread::sleep(self.retry.delay_for(attempt));
                    attempt += 1;
                }
                Err(err) => {
                    self.fail(event, state);
                    return Err(map_store_error(err));
                }
            }
        };

        state = self.transition(event, state, DeductionState::Committed);
        tracing::info!(
            transaction_id = %event.transaction_id,
            item_id = %event.item_id,
            entries = committed.entries.len(),
            shortfalls = committed.shortfalls,
            "deduction committed"
        );

        Ok(DeductionOutcome {
            transaction_id: event.transaction_id,
            state,
            already_applied: false,
            entries: committed.entries,
            shortfalls: committed.shortfalls,
            truncated_paths: resolution.truncated_paths,
            cycle_skips: resolution.cycle_skips,
        })
    }

    /// Audit trail of one transaction.
    pub fn audit_trail(&self, transaction_id: TransactionId) -> Vec<DeductionLogEntry> {
        self.store.log_for(transaction_id)
    }

    fn transition(
        &self,
        event: &ProductionEvent,
        from: DeductionState,
        to: DeductionState,
    ) -> DeductionState {
        debug_assert!(from.can_transition_to(to));
        tracing::debug!(
            transaction_id = %event.transaction_id,
            from = ?from,
            to = ?to,
            "deduction state"
        );
        to
    }

    fn fail(&self, event: &ProductionEvent, from: DeductionState) {
        let _ = self.transition(event, from, DeductionState::Failed);
    }
}

fn map_store_error(err: ProductionStoreError) -> DeductionError {
    match err {
        ProductionStoreError::ItemNotFound(id) => DeductionError::ItemNotFound(id),
        ProductionStoreError::Shortfall { .. } => DeductionError::Shortfall(err.to_string()),
        ProductionStoreError::Storage(msg) => DeductionError::Storage(msg),
        // Handled at the call site; kept total for completeness.
        ProductionStoreError::AlreadyApplied(_) | ProductionStoreError::Conflict(_) => {
            DeductionError::Storage(err.to_string())
        }
    }
}
