//! Structural metrics over the blocking graph.
//!
//! Phase-1 metrics (degree, topological order, density, cycles) are
//! synchronous and cheap. Phase-2 metrics (PageRank, betweenness, HITS,
//! eigenvector, critical path) accept a [`CancelFlag`] and observe it at
//! well-defined checkpoints so the scheduler can cut them off at the
//! budget deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod basic;
pub mod betweenness;
pub mod critical_path;
pub mod eigenvector;
pub mod hits;
pub mod pagerank;

pub use basic::{degree_centrality, density, topological_order, DegreeCentrality};
pub use betweenness::{
    betweenness_centrality, recommend_sample_size, BetweennessOutcome,
};
pub use critical_path::critical_path_depth;
pub use eigenvector::eigenvector_centrality;
pub use hits::{hits, HitsResult};
pub use pagerank::{pagerank, PageRankConfig, PageRankResult};

/// Shared cooperative-cancellation flag.
///
/// Iterative metrics check it once per outer iteration; single-source
/// metrics once per source. On observation the metric returns its best
/// partial state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
