//! Forest reconstruction from a flat, filtered row list.
//!
//! Rows at level 1 become roots. A deeper row finds its parent by explicit
//! `parent_edge_id` first, then by level-proximity (a level L-1 row whose
//! item is this row's parent item), then by a weaker same-parent fallback.
//! Rows whose parent cannot be located are promoted to roots — filtering
//! must never silently lose a row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use forgemfg_core::{EdgeId, ItemId};

use crate::row::BomRow;

/// One reconstructed display node: the row plus its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub row: BomRow,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Nodes in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Rebuild the display forest from `rows` in O(n).
///
/// Two passes over the input: one to build the id -> position indexes, one
/// to link each row to its parent. Children keep input order.
pub fn reconstruct(rows: Vec<BomRow>) -> Vec<TreeNode> {
    let mut by_edge: HashMap<EdgeId, usize> = HashMap::with_capacity(rows.len());
    // First row at (level, child item) / (level, parent item).
    let mut by_level_item: HashMap<(u32, ItemId), usize> = HashMap::new();
    let mut by_level_parent: HashMap<(u32, ItemId), usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        by_edge.insert(row.edge_id, i);
        by_level_item.entry((row.level, row.child_item_id)).or_insert(i);
        by_level_parent.entry((row.level, row.parent_item_id)).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        if row.level <= 1 {
            roots.push(i);
            continue;
        }

        let explicit = row
            .parent_edge_id
            .and_then(|parent_edge| by_edge.get(&parent_edge).copied())
            // Parent links must strictly decrease level; guards against a
            // malformed reference forming an unreachable cycle.
            .filter(|&p| rows[p].level < row.level);
        let by_proximity =
            || by_level_item.get(&(row.level - 1, row.parent_item_id)).copied();
        let by_shared_parent =
            || by_level_parent.get(&(row.level - 1, row.parent_item_id)).copied();

        match explicit.or_else(by_proximity).or_else(by_shared_parent) {
            Some(parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let mut slots: Vec<Option<BomRow>> = rows.into_iter().map(Some).collect();
    roots
        .iter()
        .filter_map(|&i| build(i, &mut slots, &children))
        .collect()
}

fn build(i: usize, slots: &mut Vec<Option<BomRow>>, children: &[Vec<usize>]) -> Option<TreeNode> {
    let row = slots[i].take()?;
    let child_nodes = children[i]
        .iter()
        .filter_map(|&c| build(c, slots, children))
        .collect();
    Some(TreeNode {
        row,
        children: child_nodes,
    })
}
