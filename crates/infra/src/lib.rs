//! Infrastructure layer: in-memory stores, the deduction engine and the
//! flattened BOM query service.

pub mod engine;
pub mod query;
pub mod stores;


pub use engine::{DeductionEngine, DeductionError, DeductionOutcome};
pub use query::{BomQueryService, RowFilter};
pub use stores::{InMemoryEdgeStore, InMemoryItemStore, InMemoryProductionStore};
