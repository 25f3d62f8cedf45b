//! PageRank over the dependency graph.
//!
//! # Overview
//!
//! With edges `u → v` = "u depends on v", rank flows from dependents to
//! their dependencies: a high PageRank marks a fundamental dependency —
//! an issue that deep chains of other work ultimately rest on.
//!
//! # Algorithm
//!
//! Standard power method:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//! ```
//!
//! with damping `d = 0.85`, convergence on the L1 norm of the delta
//! (tolerance 1e-6), and dangling-node mass redistributed uniformly so
//! the scores keep summing to 1.

use std::collections::HashMap;

use petgraph::Direction;
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::metrics::CancelFlag;

/// Configuration for the power iteration.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    pub damping: f64,
    /// Stop when the L1 norm of the rank delta falls below this.
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    pub scores: HashMap<String, f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Set when the cancel flag cut the iteration short; `scores` then
    /// holds the best partial state.
    pub cancelled: bool,
}

/// Compute PageRank, observing `cancel` once per outer iteration.
#[must_use]
#[instrument(skip_all, fields(n = g.node_count()))]
pub fn pagerank(g: &IssueGraph, config: &PageRankConfig, cancel: &CancelFlag) -> PageRankResult {
    let n = g.node_count();
    if n == 0 {
        return PageRankResult {
            scores: HashMap::new(),
            iterations: 0,
            converged: true,
            cancelled: false,
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;
    let mut cancelled = false;

    for _ in 0..config.max_iter {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        iterations += 1;

        for r in &mut new_ranks {
            *r = base;
        }

        for node in g.graph.node_indices() {
            let idx = node.index();
            let out_degree = g
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .count();

            if out_degree == 0 {
                // Dangling node: its rank spreads evenly over all nodes.
                let share = config.damping * ranks[idx] / n_f64;
                for r in &mut new_ranks {
                    *r += share;
                }
            } else {
                #[allow(clippy::cast_precision_loss)]
                let share = config.damping * ranks[idx] / out_degree as f64;
                for neighbor in g.graph.neighbors_directed(node, Direction::Outgoing) {
                    new_ranks[neighbor.index()] += share;
                }
            }
        }

        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    let scores = g
        .graph
        .node_indices()
        .filter_map(|idx| g.issue_id(idx).map(|id| (id.to_string(), ranks[idx.index()])))
        .collect();

    PageRankResult {
        scores,
        iterations,
        converged,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_core::model::{DepType, Dependency, Issue};

    fn graph_of(deps: &[(&str, &str)], extra: &[&str]) -> IssueGraph {
        let mut ids: Vec<&str> = deps.iter().flat_map(|(a, b)| [*a, *b]).collect();
        ids.extend_from_slice(extra);
        ids.sort_unstable();
        ids.dedup();

        let issues: Vec<Issue> = ids
            .iter()
            .map(|id| {
                let mut issue = Issue::new(*id, format!("issue {id}"));
                issue.dependencies = deps
                    .iter()
                    .filter(|(from, _)| from == id)
                    .map(|(from, to)| Dependency {
                        issue_id: (*from).to_string(),
                        depends_on_id: (*to).to_string(),
                        dep_type: DepType::Blocks,
                    })
                    .collect();
                issue
            })
            .collect();

        IssueGraph::build(&issues)
    }

    fn run(deps: &[(&str, &str)], extra: &[&str]) -> PageRankResult {
        pagerank(
            &graph_of(deps, extra),
            &PageRankConfig::default(),
            &CancelFlag::new(),
        )
    }

    #[test]
    fn empty_graph() {
        let result = run(&[], &[]);
        assert!(result.scores.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn single_node_gets_all_rank() {
        let result = run(&[], &["A"]);
        assert!((result.scores["A"] - 1.0).abs() < 1e-4);
        assert!(result.converged);
    }

    #[test]
    fn dependency_accumulates_rank() {
        // B depends on A: rank flows B → A, so A scores higher.
        let result = run(&[("B", "A")], &[]);
        assert!(result.scores["A"] > result.scores["B"]);
    }

    #[test]
    fn chain_root_scores_highest() {
        // C depends on B depends on A.
        let result = run(&[("B", "A"), ("C", "B")], &[]);
        assert!(result.scores["A"] > result.scores["B"]);
        assert!(result.scores["B"] > result.scores["C"]);
    }

    #[test]
    fn scores_sum_to_one() {
        let result = run(&[("B", "A"), ("C", "A"), ("C", "B"), ("D", "C")], &[]);
        let total: f64 = result.scores.values().sum();
        assert!(
            (total - 1.0).abs() < 1e-4,
            "PageRank should sum to ~1.0, got {total}"
        );
    }

    #[test]
    fn symmetric_nodes_get_equal_rank() {
        // B and C both depend only on A.
        let result = run(&[("B", "A"), ("C", "A")], &[]);
        assert!((result.scores["B"] - result.scores["C"]).abs() < 1e-10);
    }

    #[test]
    fn stable_across_runs() {
        let a = run(&[("B", "A"), ("C", "B"), ("D", "B")], &[]);
        let b = run(&[("B", "A"), ("C", "B"), ("D", "B")], &[]);
        for (id, score) in &a.scores {
            assert!((score - b.scores[id]).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn cancellation_returns_partial_state() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = pagerank(
            &graph_of(&[("B", "A")], &[]),
            &PageRankConfig::default(),
            &cancel,
        );
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
        // Partial state still covers every node (uniform init).
        assert_eq!(result.scores.len(), 2);
    }

    #[test]
    fn isolated_nodes_share_rank_evenly() {
        let result = run(&[], &["A", "B", "C", "D"]);
        for score in result.scores.values() {
            assert!((score - 0.25).abs() < 1e-6);
        }
    }
}
