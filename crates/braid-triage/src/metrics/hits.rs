//! HITS (Hyperlink-Induced Topic Search) hub and authority scores.
//!
//! With edges `u → v` = "u depends on v": a hub is an issue that depends
//! on important foundations; an authority is a foundation that important
//! issues depend on.
//!
//! Iterative power method (Kleinberg, 1999): authority(v) = Σ hub(u)
//! over u → v, hub(v) = Σ auth(w) over v → w, both L2-normalized each
//! round until the authority vector moves less than the tolerance.

use std::collections::HashMap;

use petgraph::Direction;
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::metrics::CancelFlag;

/// Result of the HITS computation.
#[derive(Debug, Clone)]
pub struct HitsResult {
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    pub iterations: usize,
    pub converged: bool,
    pub cancelled: bool,
}

/// Compute hub and authority scores; `cancel` is observed once per
/// iteration.
#[must_use]
#[instrument(skip_all, fields(n = g.node_count()))]
pub fn hits(g: &IssueGraph, max_iter: usize, tolerance: f64, cancel: &CancelFlag) -> HitsResult {
    let n = g.node_count();
    if n == 0 {
        return HitsResult {
            hubs: HashMap::new(),
            authorities: HashMap::new(),
            iterations: 0,
            converged: true,
            cancelled: false,
        };
    }

    let mut hub: Vec<f64> = vec![1.0; n];
    let mut auth: Vec<f64> = vec![1.0; n];

    let mut converged = false;
    let mut cancelled = false;
    let mut iterations = 0;

    for _ in 0..max_iter {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        iterations += 1;

        let mut new_auth = vec![0.0; n];
        for v in g.graph.node_indices() {
            let vi = v.index();
            for u in g.graph.neighbors_directed(v, Direction::Incoming) {
                new_auth[vi] += hub[u.index()];
            }
        }

        let mut new_hub = vec![0.0; n];
        for v in g.graph.node_indices() {
            let vi = v.index();
            for w in g.graph.neighbors_directed(v, Direction::Outgoing) {
                new_hub[vi] += new_auth[w.index()];
            }
        }

        normalize_l2(&mut new_auth);
        normalize_l2(&mut new_hub);

        let diff: f64 = auth
            .iter()
            .zip(new_auth.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();

        auth = new_auth;
        hub = new_hub;

        if diff < tolerance {
            converged = true;
            break;
        }
    }

    let mut hubs = HashMap::with_capacity(n);
    let mut authorities = HashMap::with_capacity(n);
    for idx in g.graph.node_indices() {
        if let Some(id) = g.issue_id(idx) {
            hubs.insert(id.to_string(), hub[idx.index()]);
            authorities.insert(id.to_string(), auth[idx.index()]);
        }
    }

    HitsResult {
        hubs,
        authorities,
        iterations,
        converged,
        cancelled,
    }
}

fn normalize_l2(values: &mut [f64]) {
    let norm: f64 = values.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in values {
            *v /= norm;
        }
    }
}
