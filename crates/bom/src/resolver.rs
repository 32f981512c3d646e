//! Multi-level quantity rollup over the BOM graph.
//!
//! Given a root item and a produced quantity, the resolver computes the
//! cumulative quantity consumed from every reachable descendant:
//! `cum(child) = cum(parent) * quantity_required(edge)`, **summed** across
//! every path that reaches the node. Traversal is bounded to [`MAX_DEPTH`]
//! levels and guarded by a per-path visited-edge set, so cyclic graphs
//! terminate; dropped contributions are counted, not raised.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use forgemfg_core::{CustomerId, EdgeId, ItemId, ValueObject};

use crate::edge::BomEdge;
use crate::store::ChildSource;

/// Hard bound on traversal depth.
pub const MAX_DEPTH: u32 = 10;

/// Deduction strategy, selectable per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Immediate-child consumption only (depth 1). Used when semi-finished
    /// items are tracked as separate production stages.
    Shallow,
    /// Flatten to leaf items; intermediate nodes are excluded from the
    /// deduction set.
    Deep,
}

/// One contributing edge of a resolution, with the metadata the audit
/// trail records.
///
/// Exactly one `Contribution` exists per contributing edge; when several
/// paths run through the same edge, their quantities are summed into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub edge_id: EdgeId,
    pub parent_item_id: ItemId,
    pub child_item_id: ItemId,
    pub bom_level: u32,
    pub quantity_required: f64,
    /// Cumulative quantity of the parent node, summed across paths.
    pub parent_quantity: f64,
    /// Quantity consumed through this edge (`parent_quantity * quantity_required`).
    pub deducted_quantity: f64,
}

impl ValueObject for Contribution {}

/// Result of one rollup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// Contributing edges in edge-id order.
    pub contributions: Vec<Contribution>,
    /// Paths dropped at the depth bound. Non-zero means the rollup is
    /// truncated and under-counts deep descendants.
    pub truncated_paths: u64,
    /// Edges skipped because they were already on the current path.
    pub cycle_skips: u64,
}

impl Resolution {
    /// Total quantity to deduct per item, in item-id order.
    ///
    /// Duplicate edges and multiple paths to the same item are summed here,
    /// never deduplicated.
    pub fn requirements(&self) -> Vec<(ItemId, f64)> {
        let mut totals: BTreeMap<ItemId, f64> = BTreeMap::new();
        for c in &self.contributions {
            *totals.entry(c.child_item_id).or_insert(0.0) += c.deducted_quantity;
        }
        totals.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

/// Roll up the cumulative requirements for producing `quantity` units of
/// `root`, scoped to `customer` (plus unscoped edges) when given.
///
/// The output is independent of edge insertion order: child edges are
/// always traversed in `EdgeId` order, so even floating-point accumulation
/// happens in a fixed sequence for a fixed graph.
pub fn resolve<S>(
    store: &S,
    root: ItemId,
    quantity: f64,
    customer: Option<CustomerId>,
    strategy: ResolverStrategy,
) -> Resolution
where
    S: ChildSource + ?Sized,
{
    let mut acc = Accumulator::default();

    match strategy {
        ResolverStrategy::Shallow => {
            for edge in sorted_children(store, root, customer) {
                let deducted = quantity * edge.quantity_required;
                acc.record(&edge, quantity, deducted);
            }
        }
        ResolverStrategy::Deep => {
            let mut path = HashSet::new();
            for edge in sorted_children(store, root, customer) {
                walk_deep(store, customer, &edge, quantity, 1, &mut path, &mut acc);
            }
        }
    }

    let resolution = acc.finish();
    if resolution.truncated_paths > 0 {
        tracing::warn!(
            root = %root,
            truncated_paths = resolution.truncated_paths,
            "rollup truncated at depth bound; deep descendants are under-counted"
        );
    }
    resolution
}

/// Depth-first descent through `edge` (the edge we arrived by).
///
/// `depth` is the edge's distance from the root, 1-based. An edge landing
/// beyond [`MAX_DEPTH`] is dropped and counted; an edge already on the
/// current path is skipped and counted. Only leaf edges (child has no
/// in-scope children) record a contribution.
fn walk_deep<S>(
    store: &S,
    customer: Option<CustomerId>,
    edge: &BomEdge,
    parent_quantity: f64,
    depth: u32,
    path: &mut HashSet<EdgeId>,
    acc: &mut Accumulator,
) where
    S: ChildSource + ?Sized,
{
    if depth > MAX_DEPTH {
        acc.truncated_paths += 1;
        return;
    }
    if !path.insert(edge.id) {
        acc.cycle_skips += 1;
        return;
    }

    let child_quantity = parent_quantity * edge.quantity_required;
    let grandchildren = sorted_children(store, edge.child_item_id, customer);
    if grandchildren.is_empty() {
        acc.record(edge, parent_quantity, child_quantity);
    } else {
        for next in &grandchildren {
            walk_deep(store, customer, next, child_quantity, depth + 1, path, acc);
        }
    }

    path.remove(&edge.id);
}

fn sorted_children<S>(store: &S, parent: ItemId, customer: Option<CustomerId>) -> Vec<BomEdge>
where
    S: ChildSource + ?Sized,
{
    let mut edges = store.children(parent, customer);
    edges.sort_unstable_by_key(|e| e.id);
    edges
}

#[derive(Default)]
struct Accumulator {
    contributions: BTreeMap<EdgeId, Contribution>,
    truncated_paths: u64,
    cycle_skips: u64,
}

impl Accumulator {
    fn record(&mut self, edge: &BomEdge, parent_quantity: f64, deducted: f64) {
        self.contributions
            .entry(edge.id)
            .and_modify(|c| {
                c.parent_quantity += parent_quantity;
                c.deducted_quantity += deducted;
            })
            .or_insert_with(|| Contribution {
                edge_id: edge.id,
                parent_item_id: edge.parent_item_id,
                child_item_id: edge.child_item_id,
                bom_level: edge.level_no,
                quantity_required: edge.quantity_required,
                parent_quantity,
                deducted_quantity: deducted,
            });
    }

    fn finish(self) -> Resolution {
        Resolution {
            contributions: self.contributions.into_values().collect(),
            truncated_paths: self.truncated_paths,
            cycle_skips: self.cycle_skips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    /// Minimal in-memory graph for resolver tests: edges in insertion order.
    struct StubGraph {
        edges: Vec<BomEdge>,
    }

    impl StubGraph {
        fn new(edges: Vec<BomEdge>) -> Self {
            Self { edges }
        }
    }

    impl ChildSource for StubGraph {
        fn children(&self, parent: ItemId, customer: Option<CustomerId>) -> Vec<BomEdge> {
            self.edges
                .iter()
                .filter(|e| e.active && e.parent_item_id == parent)
                .filter(|e| match customer {
                    None => true,
                    Some(c) => e.customer_id.is_none() || e.customer_id == Some(c),
                })
                .cloned()
                .collect()
        }
    }

    fn edge(parent: ItemId, child: ItemId, quantity: f64, level: u32) -> BomEdge {
        let now = Utc::now();
        BomEdge {
            id: EdgeId::new(),
            parent_item_id: parent,
            child_item_id: child,
            quantity_required: quantity,
            level_no: level,
            customer_id: None,
            parent_edge_id: None,
            active: true,
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn requirement_of(resolution: &Resolution, item: ItemId) -> Option<f64> {
        resolution
            .requirements()
            .into_iter()
            .find(|(id, _)| *id == item)
            .map(|(_, q)| q)
    }

    #[test]
    fn deep_deducts_leaves_only_shallow_deducts_children() {
        // A -(3)-> B -(2)-> C; produce A x5.
        let (a, b, c) = (ItemId::new(), ItemId::new(), ItemId::new());
        let graph = StubGraph::new(vec![edge(a, b, 3.0, 1), edge(b, c, 2.0, 2)]);

        let deep = resolve(&graph, a, 5.0, None, ResolverStrategy::Deep);
        assert_eq!(requirement_of(&deep, c), Some(30.0));
        assert_eq!(requirement_of(&deep, b), None);

        let shallow = resolve(&graph, a, 5.0, None, ResolverStrategy::Shallow);
        assert_eq!(requirement_of(&shallow, b), Some(15.0));
        assert_eq!(requirement_of(&shallow, c), None);
    }

    #[test]
    fn shared_subcomponent_contributions_are_summed() {
        // Diamond: A -> B (x2), A -> C (x3), B -> D (x1), C -> D (x4).
        let (a, b, c, d) = (ItemId::new(), ItemId::new(), ItemId::new(), ItemId::new());
        let graph = StubGraph::new(vec![
            edge(a, b, 2.0, 1),
            edge(a, c, 3.0, 1),
            edge(b, d, 1.0, 2),
            edge(c, d, 4.0, 2),
        ]);

        let deep = resolve(&graph, a, 1.0, None, ResolverStrategy::Deep);
        // D through B: 2*1 = 2; through C: 3*4 = 12.
        assert_eq!(requirement_of(&deep, d), Some(14.0));
        assert_eq!(deep.contributions.len(), 2);
    }

    #[test]
    fn duplicate_edges_are_summed_not_deduplicated() {
        let (a, b) = (ItemId::new(), ItemId::new());
        let graph = StubGraph::new(vec![edge(a, b, 2.0, 1), edge(a, b, 5.0, 1)]);

        let shallow = resolve(&graph, a, 1.0, None, ResolverStrategy::Shallow);
        assert_eq!(requirement_of(&shallow, b), Some(7.0));
        assert_eq!(shallow.contributions.len(), 2);
    }

    #[test]
    fn multiple_paths_through_one_edge_share_a_contribution() {
        // A -> B twice (duplicate rows), B -> C once: C's edge carries both paths.
        let (a, b, c) = (ItemId::new(), ItemId::new(), ItemId::new());
        let graph = StubGraph::new(vec![
            edge(a, b, 2.0, 1),
            edge(a, b, 3.0, 1),
            edge(b, c, 10.0, 2),
        ]);

        let deep = resolve(&graph, a, 1.0, None, ResolverStrategy::Deep);
        assert_eq!(deep.contributions.len(), 1);
        let contribution = &deep.contributions[0];
        assert_eq!(contribution.parent_quantity, 5.0);
        assert_eq!(contribution.deducted_quantity, 50.0);
        assert_eq!(requirement_of(&deep, c), Some(50.0));
    }

    #[test]
    fn depth_limit_drops_and_counts() {
        // Chain of MAX_DEPTH + 2 items: the last edge sits beyond the bound.
        let items: Vec<ItemId> = (0..=MAX_DEPTH + 1).map(|_| ItemId::new()).collect();
        let edges: Vec<BomEdge> = items
            .windows(2)
            .enumerate()
            .map(|(i, pair)| edge(pair[0], pair[1], 1.0, i as u32 + 1))
            .collect();
        let graph = StubGraph::new(edges);

        let deep = resolve(&graph, items[0], 1.0, None, ResolverStrategy::Deep);
        assert!(deep.is_empty());
        assert_eq!(deep.truncated_paths, 1);
    }

    #[test]
    fn chain_within_depth_limit_reaches_leaf() {
        let items: Vec<ItemId> = (0..=MAX_DEPTH).map(|_| ItemId::new()).collect();
        let edges: Vec<BomEdge> = items
            .windows(2)
            .enumerate()
            .map(|(i, pair)| edge(pair[0], pair[1], 2.0, i as u32 + 1))
            .collect();
        let graph = StubGraph::new(edges);

        let deep = resolve(&graph, items[0], 1.0, None, ResolverStrategy::Deep);
        assert_eq!(deep.truncated_paths, 0);
        let leaf = items[items.len() - 1];
        assert_eq!(requirement_of(&deep, leaf), Some(2f64.powi(MAX_DEPTH as i32)));
    }

    #[test]
    fn self_reference_terminates() {
        let a = ItemId::new();
        let graph = StubGraph::new(vec![edge(a, a, 1.0, 1)]);

        let deep = resolve(&graph, a, 4.0, None, ResolverStrategy::Deep);
        assert!(deep.is_empty());
        assert_eq!(deep.cycle_skips, 1);

        let shallow = resolve(&graph, a, 4.0, None, ResolverStrategy::Shallow);
        assert_eq!(requirement_of(&shallow, a), Some(4.0));
    }

    #[test]
    fn two_node_cycle_terminates() {
        let (a, b) = (ItemId::new(), ItemId::new());
        let graph = StubGraph::new(vec![edge(a, b, 2.0, 1), edge(b, a, 3.0, 2)]);

        let deep = resolve(&graph, a, 1.0, None, ResolverStrategy::Deep);
        assert!(deep.cycle_skips > 0);
    }

    #[test]
    fn customer_scope_overlays_shared_rows() {
        let (a, b, c) = (ItemId::new(), ItemId::new(), ItemId::new());
        let customer = CustomerId::new();
        let other = CustomerId::new();

        let shared = edge(a, b, 1.0, 1);
        let mut variant = edge(a, c, 2.0, 1);
        variant.customer_id = Some(customer);
        let mut foreign = edge(a, c, 9.0, 1);
        foreign.customer_id = Some(other);
        let graph = StubGraph::new(vec![shared, variant, foreign]);

        let scoped = resolve(&graph, a, 1.0, Some(customer), ResolverStrategy::Shallow);
        assert_eq!(requirement_of(&scoped, b), Some(1.0));
        assert_eq!(requirement_of(&scoped, c), Some(2.0));

        let unscoped = resolve(&graph, a, 1.0, None, ResolverStrategy::Shallow);
        assert_eq!(requirement_of(&unscoped, c), Some(11.0));
    }

    #[test]
    fn empty_graph_resolves_to_nothing() {
        let graph = StubGraph::new(vec![]);
        let deep = resolve(&graph, ItemId::new(), 10.0, None, ResolverStrategy::Deep);
        assert!(deep.is_empty());
        assert_eq!(deep.truncated_paths, 0);
        assert_eq!(deep.cycle_skips, 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        /// Random two-level BOM: a root, a band of middles, a band of leaves.
        fn arbitrary_graph() -> impl Strategy<Value = (ItemId, Vec<BomEdge>)> {
            (2usize..6, 2usize..6).prop_flat_map(|(middles, leaves)| {
                let root = ItemId::new();
                let middle_ids: Vec<ItemId> = (0..middles).map(|_| ItemId::new()).collect();
                let leaf_ids: Vec<ItemId> = (0..leaves).map(|_| ItemId::new()).collect();

                let mut edges = Vec::new();
                for (i, m) in middle_ids.iter().enumerate() {
                    edges.push(edge(root, *m, (i + 1) as f64, 1));
                    for (j, l) in leaf_ids.iter().enumerate() {
                        edges.push(edge(*m, *l, (j + 2) as f64, 2));
                    }
                }
                (Just(root), Just(edges))
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: resolution is invariant under permutation of edge
            /// insertion order (bit-identical, including float accumulation).
            #[test]
            fn insertion_order_does_not_matter(
                (root, edges) in arbitrary_graph(),
                quantity in 1.0f64..100.0,
            ) {
                let baseline = resolve(
                    &StubGraph::new(edges.clone()),
                    root,
                    quantity,
                    None,
                    ResolverStrategy::Deep,
                );

                let mut reversed = edges.clone();
                reversed.reverse();
                let permuted = resolve(
                    &StubGraph::new(reversed),
                    root,
                    quantity,
                    None,
                    ResolverStrategy::Deep,
                );

                prop_assert_eq!(baseline, permuted);
            }

            /// Property: every leaf's deduction equals quantity x the sum over
            /// all root-to-leaf paths of the product of edge quantities.
            #[test]
            fn deep_matches_path_products(
                (root, edges) in arbitrary_graph(),
                quantity in 1.0f64..100.0,
            ) {
                let graph = StubGraph::new(edges.clone());
                let deep = resolve(&graph, root, quantity, None, ResolverStrategy::Deep);

                // Brute-force path enumeration for the two-level shape.
                let mut expected: std::collections::HashMap<ItemId, f64> =
                    std::collections::HashMap::new();
                for first in edges.iter().filter(|e| e.parent_item_id == root) {
                    for second in edges.iter().filter(|e| e.parent_item_id == first.child_item_id) {
                        *expected.entry(second.child_item_id).or_insert(0.0) +=
                            quantity * first.quantity_required * second.quantity_required;
                    }
                }

                for (item, deducted) in deep.requirements() {
                    let want = expected.get(&item).copied().unwrap_or(0.0);
                    prop_assert!((deducted - want).abs() < 1e-6 * want.max(1.0));
                }
            }
        }
    }
}
