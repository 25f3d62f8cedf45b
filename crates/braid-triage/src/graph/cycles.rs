//! Elementary-cycle enumeration over the blocking graph.
//!
//! Uses Johnson's algorithm (1975): every simple directed cycle is
//! reported exactly once, as the identifier sequence along its path.
//! Nodes are ranked by identifier before the search, so each cycle
//! starts at its smallest member and the whole output is a pure
//! function of the graph. The result list is ordered lexicographically
//! on each cycle's sorted identifier tuple.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// Find all elementary cycles.
///
/// Each entry is one cycle: the ids along its path, beginning at the
/// cycle's smallest identifier, with no repeats. Self-loops are
/// reported as one-element cycles.
#[must_use]
pub fn find_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
    let mut order: Vec<NodeIndex> = graph.node_indices().collect();
    order.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

    let rank: HashMap<NodeIndex, usize> =
        order.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    // Out-neighbors sorted by rank for deterministic traversal.
    let adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = graph
        .node_indices()
        .map(|v| {
            let mut neighbors: Vec<NodeIndex> =
                graph.neighbors_directed(v, Direction::Outgoing).collect();
            neighbors.sort_by_key(|w| rank[w]);
            (v, neighbors)
        })
        .collect();

    let mut finder = CycleFinder {
        graph,
        rank,
        adjacency,
        root: 0,
        blocked: HashSet::new(),
        block_lists: HashMap::new(),
        stack: Vec::new(),
        cycles: Vec::new(),
    };

    // One pass per start vertex, restricted to the subgraph of nodes
    // ranked at or above it: each cycle surfaces exactly once, rooted
    // at its smallest member.
    for root in 0..order.len() {
        let start = order[root];
        finder.root = root;
        finder.blocked.clear();
        finder.block_lists.clear();
        finder.circuit(start, start);
    }

    let mut cycles = finder.cycles;
    cycles.sort_by_cached_key(|cycle| {
        let mut key = cycle.clone();
        key.sort_unstable();
        key
    });
    cycles
}

/// True when the graph contains at least one cycle.
#[must_use]
pub fn has_cycles(graph: &DiGraph<String, ()>) -> bool {
    petgraph::algo::is_cyclic_directed(graph)
}

struct CycleFinder<'a> {
    graph: &'a DiGraph<String, ()>,
    rank: HashMap<NodeIndex, usize>,
    adjacency: HashMap<NodeIndex, Vec<NodeIndex>>,
    /// Rank of the current start vertex; lower-ranked nodes are outside
    /// the current subgraph.
    root: usize,
    blocked: HashSet<NodeIndex>,
    /// v → nodes waiting to be unblocked when v unblocks.
    block_lists: HashMap<NodeIndex, HashSet<NodeIndex>>,
    stack: Vec<NodeIndex>,
    cycles: Vec<Vec<String>>,
}

impl CycleFinder<'_> {
    fn circuit(&mut self, v: NodeIndex, start: NodeIndex) -> bool {
        let mut found = false;
        self.stack.push(v);
        self.blocked.insert(v);

        let neighbors = self.adjacency[&v].clone();
        for &w in &neighbors {
            if self.rank[&w] < self.root {
                continue;
            }
            if w == start {
                let cycle: Vec<String> =
                    self.stack.iter().map(|n| self.graph[*n].clone()).collect();
                self.cycles.push(cycle);
                found = true;
            } else if !self.blocked.contains(&w) && self.circuit(w, start) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            // No cycle through v from here: defer unblocking until a
            // neighbor on some future cycle unblocks.
            for &w in &neighbors {
                if self.rank[&w] >= self.root {
                    self.block_lists.entry(w).or_default().insert(v);
                }
            }
        }

        self.stack.pop();
        found
    }

    fn unblock(&mut self, v: NodeIndex) {
        self.blocked.remove(&v);
        if let Some(waiting) = self.block_lists.remove(&v) {
            for w in waiting {
                if self.blocked.contains(&w) {
                    self.unblock(w);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_graph(nodes: &[&str], edges: &[(&str, &str)]) -> DiGraph<String, ()> {
        let mut graph = DiGraph::new();
        let mut map = HashMap::new();
        for node in nodes {
            map.insert(*node, graph.add_node((*node).to_string()));
        }
        for (from, to) in edges {
            graph.add_edge(map[from], map[to], ());
        }
        graph
    }

    fn cycles(nodes: &[&str], edges: &[(&str, &str)]) -> Vec<Vec<String>> {
        find_cycles(&make_graph(nodes, edges))
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let g = make_graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        assert!(find_cycles(&g).is_empty());
        assert!(!has_cycles(&g));
    }

    #[test]
    fn two_cycle_reported_once() {
        let found = cycles(&["B", "A"], &[("A", "B"), ("B", "A")]);
        assert_eq!(found, vec![vec!["A".to_string(), "B".to_string()]]);
    }

    #[test]
    fn triangle_reported_in_path_order() {
        // A → C → B → A: the sequence follows the edges, starting at
        // the smallest member, so it is not id-sorted.
        let found = cycles(&["A", "B", "C"], &[("A", "C"), ("C", "B"), ("B", "A")]);
        assert_eq!(
            found,
            vec![vec!["A".to_string(), "C".to_string(), "B".to_string()]]
        );
    }

    #[test]
    fn shared_edge_cycles_listed_individually() {
        // One SCC {A, B, C} holding two distinct cycles: A→B→A and
        // A→B→C→A.
        let found = cycles(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("B", "C"), ("C", "A")],
        );
        assert_eq!(
            found,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["A".to_string(), "B".to_string(), "C".to_string()],
            ]
        );
    }

    #[test]
    fn nested_cycle_inside_larger_one() {
        // 4-node SCC with a 2-cycle and a 4-cycle.
        let found = cycles(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A"), ("B", "A")],
        );
        assert_eq!(
            found,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec![
                    "A".to_string(),
                    "B".to_string(),
                    "C".to_string(),
                    "D".to_string(),
                ],
            ]
        );
    }

    #[test]
    fn disjoint_cycles_sorted_lexicographically() {
        let found = cycles(
            &["X", "Y", "A", "B"],
            &[("X", "Y"), ("Y", "X"), ("A", "B"), ("B", "A")],
        );
        assert_eq!(
            found,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["X".to_string(), "Y".to_string()],
            ]
        );
    }

    #[test]
    fn self_loop_is_a_one_element_cycle() {
        let mut g = make_graph(&["A"], &[]);
        let a = g.node_indices().next().unwrap();
        g.add_edge(a, a, ());
        assert_eq!(find_cycles(&g), vec![vec!["A".to_string()]]);
    }

    #[test]
    fn insertion_order_does_not_change_output() {
        let forward = cycles(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("B", "C"), ("C", "A")],
        );
        let reversed = cycles(
            &["C", "B", "A"],
            &[("C", "A"), ("B", "C"), ("B", "A"), ("A", "B")],
        );
        assert_eq!(forward, reversed);
    }

    #[test]
    fn no_repeats_within_a_cycle() {
        let found = cycles(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D"), ("D", "B")],
        );
        for cycle in &found {
            let mut unique = cycle.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), cycle.len(), "repeat in {cycle:?}");
        }
        // Two cycles: A→B→C→A and B→C→D→B.
        assert_eq!(found.len(), 2);
    }
}
