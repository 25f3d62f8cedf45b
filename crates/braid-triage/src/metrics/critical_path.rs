//! Critical-path depth over the dependency DAG.
//!
//! For each issue: how many layers of dependent work stack on top of
//! it, transitively. Issues nothing depends on have depth 1; an issue's
//! depth is `1 + max(depth of its dependents)`. Deep issues anchor long
//! chains — delaying them delays everything above.
//!
//! DAG-only: on a cyclic graph the metric is skipped by the scheduler.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::Direction;
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::metrics::CancelFlag;

/// Result of the depth computation.
#[derive(Debug, Clone)]
pub struct CriticalPathResult {
    pub depths: HashMap<String, i64>,
    pub cancelled: bool,
}

/// Compute per-issue critical-path depth.
///
/// Returns `None` when the graph has cycles. The cancel flag is
/// observed once per node; on cancellation the partial map is returned
/// with `cancelled` set.
#[must_use]
#[instrument(skip_all, fields(n = g.node_count()))]
pub fn critical_path_depth(g: &IssueGraph, cancel: &CancelFlag) -> Option<CriticalPathResult> {
    let sorted = toposort(&g.graph, None).ok()?;

    // With edges u → v = "u depends on v", toposort puts dependents
    // before their dependencies, so every parent (dependent) of a node
    // is processed before the node itself.
    let mut heights: Vec<i64> = vec![0; g.node_count()];
    let mut depths = HashMap::with_capacity(g.node_count());
    let mut cancelled = false;

    for node in sorted {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let max_parent = g
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|p| heights[p.index()])
            .max()
            .unwrap_or(0);

        let height = 1 + max_parent;
        heights[node.index()] = height;
        if let Some(id) = g.issue_id(node) {
            depths.insert(id.to_string(), height);
        }
    }

    Some(CriticalPathResult { depths, cancelled })
}
