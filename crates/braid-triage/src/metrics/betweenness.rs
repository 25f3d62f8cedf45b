//! Betweenness centrality: exact Brandes' algorithm and a sampled
//! approximation for large graphs.
//!
//! # Overview
//!
//! High-betweenness issues are bridges between clusters of work —
//! bottlenecks whose removal would disconnect parts of the graph.
//!
//! Exact mode runs Brandes (2001) from every source: O(V·E). Approximate
//! mode runs the single-source pass from `k` sampled pivots and scales
//! the partial sums by `V/k` (Bader et al., 2007); with k=100 the
//! ranking error is ~10%. Pivot sampling sorts node ids first so the
//! same seed always picks the same pivots regardless of map iteration
//! order.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::metrics::CancelFlag;

/// Result of a betweenness computation.
#[derive(Debug, Clone)]
pub struct BetweennessOutcome {
    pub scores: HashMap<String, f64>,
    /// Pivots actually used (equals V in exact mode).
    pub sample_size: usize,
    /// True when the sampled approximation ran (vs exact).
    pub approximate: bool,
    /// Set when the cancel flag cut the source loop short.
    pub cancelled: bool,
}

/// Compute betweenness centrality.
///
/// `sample_size >= V` (or `None`... callers pass `Some(k)` for the
/// sampled mode) degrades to the exact algorithm. The cancel flag is
/// observed once per source node.
#[must_use]
#[instrument(skip_all, fields(n = g.node_count(), sample = sample_size))]
pub fn betweenness_centrality(
    g: &IssueGraph,
    sample_size: Option<usize>,
    seed: u64,
    cancel: &CancelFlag,
) -> BetweennessOutcome {
    let n = g.node_count();
    if n == 0 {
        return BetweennessOutcome {
            scores: HashMap::new(),
            sample_size: 0,
            approximate: false,
            cancelled: false,
        };
    }

    // Identifier-sorted node list: the deterministic base ordering for
    // both the exact source loop and pivot sampling.
    let mut nodes: Vec<(&str, NodeIndex)> = g
        .node_map
        .iter()
        .map(|(id, idx)| (id.as_str(), *idx))
        .collect();
    nodes.sort_unstable_by_key(|(id, _)| *id);

    let (sources, approximate) = match sample_size {
        Some(k) if k < n => (sample_pivots(&nodes, k, seed), true),
        _ => (nodes.iter().map(|(_, idx)| *idx).collect(), false),
    };

    let mut cb: Vec<f64> = vec![0.0; n];
    let mut cancelled = false;
    let mut used = 0usize;

    for &source in &sources {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        single_source(g, source, &mut cb);
        used += 1;
    }

    // Extrapolate sampled partial sums to the full graph.
    if approximate && used > 0 {
        #[allow(clippy::cast_precision_loss)]
        let scale = n as f64 / used as f64;
        for score in &mut cb {
            *score *= scale;
        }
    }

    let scores = g
        .graph
        .node_indices()
        .filter_map(|idx| g.issue_id(idx).map(|id| (id.to_string(), cb[idx.index()])))
        .collect();

    BetweennessOutcome {
        scores,
        sample_size: used,
        approximate,
        cancelled,
    }
}

/// Recommended pivot count for a graph of `node_count` nodes.
///
/// V if V < 100; max(50, V/5) if V < 500; 100 if V < 2000; else 200.
#[must_use]
pub fn recommend_sample_size(node_count: usize) -> usize {
    match node_count {
        n if n < 100 => n,
        n if n < 500 => (n / 5).max(50),
        n if n < 2000 => 100,
        _ => 200,
    }
}

/// Pick `k` pivots via a seeded Fisher–Yates partial shuffle of the
/// id-sorted node list.
fn sample_pivots(nodes: &[(&str, NodeIndex)], k: usize, seed: u64) -> Vec<NodeIndex> {
    let mut shuffled: Vec<NodeIndex> = nodes.iter().map(|(_, idx)| *idx).collect();
    let mut rng = StdRng::seed_from_u64(seed);

    for i in 0..k.min(shuffled.len()) {
        let j = rng.gen_range(i..shuffled.len());
        shuffled.swap(i, j);
    }

    shuffled.truncate(k);
    shuffled
}

/// One source pass of Brandes' algorithm: BFS path counting, then
/// dependency accumulation in reverse discovery order.
fn single_source(g: &IssueGraph, source: NodeIndex, cb: &mut [f64]) {
    let n = g.node_count();
    let si = source.index();

    let mut stack: Vec<NodeIndex> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
    let mut sigma: Vec<f64> = vec![0.0; n];
    let mut dist: Vec<i64> = vec![-1; n];

    sigma[si] = 1.0;
    dist[si] = 0;

    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        let vi = v.index();
        stack.push(v);

        for w in g.graph.neighbors_directed(v, Direction::Outgoing) {
            let wi = w.index();

            if dist[wi] < 0 {
                dist[wi] = dist[vi] + 1;
                queue.push_back(w);
            }

            if dist[wi] == dist[vi] + 1 {
                sigma[wi] += sigma[vi];
                predecessors[wi].push(v);
            }
        }
    }

    let mut delta: Vec<f64> = vec![0.0; n];

    while let Some(w) = stack.pop() {
        let wi = w.index();
        for &v in &predecessors[wi] {
            let vi = v.index();
            if sigma[wi] > 0.0 {
                delta[vi] += (sigma[vi] / sigma[wi]) * (1.0 + delta[wi]);
            }
        }
        if wi != si {
            cb[wi] += delta[wi];
        }
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

    fn exact(deps: &[(&str, &str)]) -> BetweennessOutcome {
        betweenness_centrality(&graph_of(deps, &[]), None, 42, &CancelFlag::new())
    }

    #[test]
    fn empty_graph_is_empty() {
        let outcome =
            betweenness_centrality(&graph_of(&[], &[]), None, 42, &CancelFlag::new());
        assert!(outcome.scores.is_empty());
    }

    #[test]
    fn chain_middle_node_scores_one() {
        // C→B→A: B lies on the single shortest path C..A.
        let outcome = exact(&[("B", "A"), ("C", "B")]);
        assert!((outcome.scores["B"] - 1.0).abs() < 1e-10);
        assert!((outcome.scores["A"] - 0.0).abs() < 1e-10);
        assert!((outcome.scores["C"] - 0.0).abs() < 1e-10);
        assert!(!outcome.approximate);
    }

    #[test]
    fn diamond_splits_betweenness() {
        // D→B→A, D→C→A: two shortest D..A paths.
        let outcome = exact(&[("B", "A"), ("C", "A"), ("D", "B"), ("D", "C")]);
        assert!((outcome.scores["B"] - 0.5).abs() < 1e-10);
        assert!((outcome.scores["C"] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn chain_of_four() {
        // D→C→B→A: B on (C,A),(D,A); C on (D,A),(D,B).
        let outcome = exact(&[("B", "A"), ("C", "B"), ("D", "C")]);
        assert!((outcome.scores["B"] - 2.0).abs() < 1e-10);
        assert!((outcome.scores["C"] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn full_sample_matches_exact() {
        let g = graph_of(&[("B", "A"), ("C", "B"), ("D", "C")], &[]);
        let exact = betweenness_centrality(&g, None, 42, &CancelFlag::new());
        // sample_size >= V degrades to exact.
        let full = betweenness_centrality(&g, Some(10), 42, &CancelFlag::new());
        assert!(!full.approximate);
        for (id, score) in &exact.scores {
            assert!((score - full.scores[id]).abs() < 1e-10);
        }
    }

    #[test]
    fn sampling_is_deterministic_for_a_seed() {
        let g = graph_of(
            &[("B", "A"), ("C", "B"), ("D", "C"), ("E", "B"), ("F", "E")],
            &[],
        );
        let one = betweenness_centrality(&g, Some(3), 7, &CancelFlag::new());
        let two = betweenness_centrality(&g, Some(3), 7, &CancelFlag::new());
        assert!(one.approximate);
        assert_eq!(one.sample_size, 3);
        for (id, score) in &one.scores {
            assert!((score - two.scores[id]).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn cancellation_stops_source_loop() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let outcome = betweenness_centrality(
            &graph_of(&[("B", "A"), ("C", "B")], &[]),
            None,
            42,
            &cancel,
        );
        assert!(outcome.cancelled);
        assert_eq!(outcome.sample_size, 0);
    }

    #[test]
    fn recommended_sizes_follow_tiers() {
        assert_eq!(recommend_sample_size(0), 0);
        assert_eq!(recommend_sample_size(99), 99);
        assert_eq!(recommend_sample_size(100), 50);
        assert_eq!(recommend_sample_size(400), 80);
        assert_eq!(recommend_sample_size(1999), 100);
        assert_eq!(recommend_sample_size(50_000), 200);
    }

    #[test]
    fn scores_are_finite() {
        let outcome = exact(&[("B", "A"), ("C", "A"), ("D", "B"), ("D", "C")]);
        assert!(outcome.scores.values().all(|s| s.is_finite()));
    }
}
