//! `forgemfg-view` — the display read path: flattened BOM rows, forest
//! reconstruction and cost roll-up.
//!
//! Everything here is pure and single-pass over an already-filtered row
//! set. Filtering (search text, level, item kind) happens upstream in the
//! query service; this crate never touches the graph itself.

pub mod cost;
pub mod row;
pub mod tree;

pub use cost::{CostSummary, RowCost, summarize};
pub use row::BomRow;
pub use tree::{TreeNode, reconstruct};
