//! Eigenvector centrality via power iteration over incoming edges.
//!
//! Issues that are depended on by other influential issues score
//! higher. The iteration count is fixed at 50 (no convergence test) to
//! keep the metric's cost predictable; on a pure DAG the directed
//! variant legitimately decays towards zero away from the sinks, which
//! is the behavior the ranking layer expects.

use std::collections::HashMap;

use petgraph::Direction;
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::metrics::CancelFlag;

const ITERATIONS: usize = 50;

/// Compute eigenvector centrality; returns an empty map when V = 0.
/// `cancel` is observed once per iteration.
#[must_use]
#[instrument(skip_all, fields(n = g.node_count()))]
pub fn eigenvector_centrality(g: &IssueGraph, cancel: &CancelFlag) -> HashMap<String, f64> {
    let n = g.node_count();
    if n == 0 {
        return HashMap::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let mut vec = vec![1.0 / n as f64; n];
    let mut work = vec![0.0_f64; n];

    for _ in 0..ITERATIONS {
        if cancel.is_cancelled() {
            break;
        }

        for w in &mut work {
            *w = 0.0;
        }
        for node in g.graph.node_indices() {
            let i = node.index();
            for incoming in g.graph.neighbors_directed(node, Direction::Incoming) {
                work[i] += vec[incoming.index()];
            }
        }

        let sum: f64 = work.iter().map(|v| v * v).sum();
        if sum == 0.0 {
            break;
        }
        let norm = 1.0 / sum.sqrt();
        for (v, w) in vec.iter_mut().zip(work.iter()) {
            *v = w * norm;
        }
    }

    g.graph
        .node_indices()
        .filter_map(|idx| g.issue_id(idx).map(|id| (id.to_string(), vec[idx.index()])))
        .collect()
}
