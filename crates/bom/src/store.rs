//! Storage seam for the BOM graph.

use chrono::{DateTime, Utc};

use forgemfg_core::{CustomerId, DomainResult, EdgeId, ItemId};

use crate::edge::{BomEdge, BulkUpsertReport, NewEdge};

/// Maximum rows accepted by one bulk upsert.
pub const BULK_LIMIT: usize = 100;

/// Read side of the graph needed by the resolver and the flattened query.
pub trait ChildSource: Send + Sync {
    /// Active direct-child edges of `parent`.
    ///
    /// With a customer given, returns that customer's edges **plus** unscoped
    /// edges (a customer variant overlays the shared BOM); without, all
    /// active edges regardless of customer.
    fn children(&self, parent: ItemId, customer: Option<CustomerId>) -> Vec<BomEdge>;
}

/// Persistence seam for BOM edge rows.
///
/// Implementations enforce the row-level validation in [`crate::edge::validate`].
/// Timestamps are passed in by the caller so implementations stay deterministic.
pub trait EdgeStore: ChildSource {
    /// Insert or replace a single edge. Rejected rows leave no effect.
    fn upsert(&self, new: NewEdge, now: DateTime<Utc>) -> DomainResult<BomEdge>;

    /// Soft-delete one edge. Does not cascade to descendants.
    fn deactivate(&self, id: EdgeId, now: DateTime<Utc>) -> DomainResult<()>;

    /// Validate and insert up to [`BULK_LIMIT`] rows, each independently.
    ///
    /// The valid subset commits and every submitted row appears in the
    /// report (partial success, never a global rollback). Oversized batches
    /// are rejected whole before any row is examined.
    fn bulk_upsert(&self, rows: Vec<NewEdge>, now: DateTime<Utc>) -> DomainResult<BulkUpsertReport>;

    /// Single row lookup, active or not.
    fn get(&self, id: EdgeId) -> Option<BomEdge>;
}

impl<S> ChildSource for std::sync::Arc<S>
where
    S: ChildSource + ?Sized,
{
    fn children(&self, parent: ItemId, customer: Option<CustomerId>) -> Vec<BomEdge> {
        (**self).children(parent, customer)
    }
}

impl<S> EdgeStore for std::sync::Arc<S>
where
    S: EdgeStore + ?Sized,
{
    fn upsert(&self, new: NewEdge, now: DateTime<Utc>) -> DomainResult<BomEdge> {
        (**self).upsert(new, now)
    }

    fn deactivate(&self, id: EdgeId, now: DateTime<Utc>) -> DomainResult<()> {
        (**self).deactivate(id, now)
    }

    fn bulk_upsert(&self, rows: Vec<NewEdge>, now: DateTime<Utc>) -> DomainResult<BulkUpsertReport> {
        (**self).bulk_upsert(rows, now)
    }

    fn get(&self, id: EdgeId) -> Option<BomEdge> {
        (**self).get(id)
    }
}
