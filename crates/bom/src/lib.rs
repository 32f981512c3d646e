//! `forgemfg-bom` — the BOM graph: edge model, storage seam and quantity rollup.
//!
//! The graph is a set of parent-requires-child edges with per-edge required
//! quantities. Self-references, cycles and duplicate (parent, child, customer)
//! tuples are **accepted by design**; duplicate rows are summed by every
//! consumer and cycle safety lives in the resolver's bounded traversal, not
//! in validation.

pub mod edge;
pub mod resolver;
pub mod store;

pub use edge::{BomEdge, BulkRowResult, BulkUpsertReport, NewEdge};
pub use resolver::{Contribution, MAX_DEPTH, Resolution, ResolverStrategy, resolve};
pub use store::{BULK_LIMIT, ChildSource, EdgeStore};
