//! Dependency graph construction from the validated issue list.
//!
//! # Edge Direction
//!
//! An edge `u → v` means "u **depends on** v". Consequently:
//!
//! - in-degree(v) = number of issues that depend on v (authority /
//!   blocker score),
//! - out-degree(u) = number of issues u depends on (fragility).
//!
//! # Construction contract
//!
//! Nodes are inserted in input order; edges in `(source, target)`
//! declaration order. Tombstone issues are excluded entirely. Only
//! `blocks` dependencies become edges; duplicates collapse; targets that
//! do not resolve to a node are skipped silently. The structure is
//! immutable after construction.
//!
//! The graph carries a BLAKE3 content hash of the sorted node and edge
//! sets so callers can detect structural change between runs.

use std::collections::HashMap;

use braid_core::model::Issue;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

/// The directed blocking graph plus its identifier indices.
#[derive(Debug)]
pub struct IssueGraph {
    /// Nodes are issue ids; an edge `u → v` means u depends on v.
    pub graph: DiGraph<String, ()>,
    /// Issue id → petgraph node index.
    pub node_map: HashMap<String, NodeIndex>,
    /// Issue id → source issue (non-tombstone only).
    pub issues: HashMap<String, Issue>,
    /// BLAKE3 hash of the sorted structure, `blake3:<hex>`.
    pub content_hash: String,
}

impl IssueGraph {
    /// Build the graph from a validated issue list.
    #[must_use]
    #[instrument(skip(issues), fields(n = issues.len()))]
    pub fn build(issues: &[Issue]) -> Self {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(issues.len());
        let mut issue_map: HashMap<String, Issue> = HashMap::with_capacity(issues.len());

        for issue in issues {
            if issue.status.is_tombstone() {
                continue;
            }
            let idx = graph.add_node(issue.id.clone());
            node_map.insert(issue.id.clone(), idx);
            issue_map.insert(issue.id.clone(), issue.clone());
        }

        let mut edges: Vec<(String, String)> = Vec::new();
        for issue in issues {
            let Some(&u) = node_map.get(&issue.id) else {
                continue;
            };
            for dep in issue.blocking_deps() {
                let Some(&v) = node_map.get(dep) else {
                    // Dangling or tombstone target: dropped silently.
                    continue;
                };
                if u == v {
                    continue;
                }
                if !graph.contains_edge(u, v) {
                    graph.add_edge(u, v, ());
                    edges.push((issue.id.clone(), dep.to_string()));
                }
            }
        }

        let content_hash = compute_content_hash(&node_map, &edges);

        Self {
            graph,
            node_map,
            issues: issue_map,
            content_hash,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, issue_id: &str) -> Option<NodeIndex> {
        self.node_map.get(issue_id).copied()
    }

    #[must_use]
    pub fn issue_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Issue ids sorted ascending. Metrics that sample or iterate in an
    /// order that affects output start from this list.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.node_map.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Hash the sorted node and edge sets.
fn compute_content_hash(
    node_map: &HashMap<String, NodeIndex>,
    edges: &[(String, String)],
) -> String {
    let mut nodes: Vec<&str> = node_map.keys().map(String::as_str).collect();
    nodes.sort_unstable();

    let mut sorted_edges: Vec<&(String, String)> = edges.iter().collect();
    sorted_edges.sort();

    let mut hasher = blake3::Hasher::new();
    for id in nodes {
        hasher.update(id.as_bytes());
        hasher.update(b"\x00");
    }
    for (from, to) in sorted_edges {
        hasher.update(from.as_bytes());
        hasher.update(b"\x01");
        hasher.update(to.as_bytes());
        hasher.update(b"\x01");
    }
    format!("blake3:{}", hasher.finalize())
}
