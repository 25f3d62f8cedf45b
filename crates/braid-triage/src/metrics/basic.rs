//! Phase-1 metrics: degree centrality, topological order, and density.
//!
//! These complete synchronously on every invocation before the caller
//! observes any result envelope.

use std::collections::HashMap;

use petgraph::{algo::toposort, Direction};

use crate::graph::IssueGraph;

/// Per-issue degree scores.
///
/// With edges `u → v` = "u depends on v": in-degree counts dependents
/// (blocker score), out-degree counts dependencies (fragility).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreeCentrality {
    pub in_degree: HashMap<String, usize>,
    pub out_degree: HashMap<String, usize>,
}

/// Compute in/out degree for every node.
#[must_use]
pub fn degree_centrality(g: &IssueGraph) -> DegreeCentrality {
    let mut in_degree = HashMap::with_capacity(g.node_count());
    let mut out_degree = HashMap::with_capacity(g.node_count());

    for idx in g.graph.node_indices() {
        let Some(id) = g.issue_id(idx) else { continue };
        let in_d = g.graph.neighbors_directed(idx, Direction::Incoming).count();
        let out_d = g.graph.neighbors_directed(idx, Direction::Outgoing).count();
        in_degree.insert(id.to_string(), in_d);
        out_degree.insert(id.to_string(), out_d);
    }

    DegreeCentrality {
        in_degree,
        out_degree,
    }
}

/// Roots-first topological order: dependencies before dependents.
///
/// With edges `u → v` = "u depends on v", petgraph's toposort yields
/// dependents first, so the sequence is reversed before returning.
/// `None` when the graph has cycles — the metric is marked skipped.
#[must_use]
pub fn topological_order(g: &IssueGraph) -> Option<Vec<String>> {
    let sorted = toposort(&g.graph, None).ok()?;
    let mut order: Vec<String> = sorted
        .into_iter()
        .rev()
        .filter_map(|idx| g.issue_id(idx).map(str::to_string))
        .collect();
    order.shrink_to_fit();
    Some(order)
}

/// Directed density `E / (V·(V−1))`; 0 when V ≤ 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(g: &IssueGraph) -> f64 {
    let n = g.node_count();
    if n <= 1 {
        return 0.0;
    }
    g.edge_count() as f64 / (n * (n - 1)) as f64
}
