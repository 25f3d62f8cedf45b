//! Two-phase metric scheduling.
//!
//! # Phase 1 — instant
//!
//! Degree, topological order, density, and cycles run synchronously on
//! the calling thread and are always present before any caller observes
//! the result envelope.
//!
//! # Phase 2 — budgeted
//!
//! PageRank, betweenness, HITS, eigenvector, and critical-path depth
//! each run on their own worker thread over the shared immutable graph.
//! Workers own their output maps and send `(name, result, elapsed)` on
//! a channel when done. The orchestrator collects completions until the
//! budget deadline, then sets the shared cancel flag and drains whatever
//! is already in flight without waiting. Each metric always ends in one
//! of four states: `computed`, `approx`, `timeout`, or `skipped`.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use braid_core::config::{BetweennessMode, EngineConfig};
use braid_core::envelope::MetricStatus;
use tracing::{debug, instrument};

use crate::graph::{cycles::find_cycles, IssueGraph};
use crate::metrics::{
    betweenness_centrality, critical_path_depth, degree_centrality, density,
    eigenvector_centrality, hits, pagerank, recommend_sample_size, topological_order,
    CancelFlag, DegreeCentrality, PageRankConfig,
};

/// Synchronous metrics, available immediately.
#[derive(Debug, Clone)]
pub struct Phase1 {
    pub degree: DegreeCentrality,
    /// Roots-first linearization; `None` when the graph is cyclic.
    pub topological_order: Option<Vec<String>>,
    pub density: f64,
    pub cycles: Vec<Vec<String>>,
}

/// The full metrics bundle with per-metric status.
#[derive(Debug, Clone)]
pub struct GraphInsights {
    pub phase1: Phase1,
    pub pagerank: HashMap<String, f64>,
    pub betweenness: HashMap<String, f64>,
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    pub eigenvector: HashMap<String, f64>,
    pub critical_path: HashMap<String, i64>,
    /// One entry per Phase-2 metric, always populated.
    pub status: BTreeMap<String, MetricStatus>,
}

/// Metric names as they appear in the status block.
pub const PHASE2_METRICS: [&str; 5] = [
    "pagerank",
    "betweenness",
    "hits",
    "eigenvector",
    "critical_path",
];

enum MetricPayload {
    PageRank(HashMap<String, f64>),
    Betweenness {
        scores: HashMap<String, f64>,
        approximate: bool,
    },
    Hits {
        hubs: HashMap<String, f64>,
        authorities: HashMap<String, f64>,
    },
    Eigenvector(HashMap<String, f64>),
    CriticalPath(HashMap<String, i64>),
}

struct Completion {
    name: &'static str,
    payload: MetricPayload,
    elapsed: Duration,
}

/// Run Phase 1 only.
#[must_use]
pub fn phase1(graph: &IssueGraph) -> Phase1 {
    Phase1 {
        degree: degree_centrality(graph),
        topological_order: topological_order(graph),
        density: density(graph),
        cycles: find_cycles(&graph.graph),
    }
}

/// Run both phases and assemble the insights bundle.
#[must_use]
#[instrument(skip_all, fields(n = graph.node_count(), budget_ms = config.phase2_budget_ms))]
pub fn analyze(graph: &Arc<IssueGraph>, config: &EngineConfig) -> GraphInsights {
    let p1 = phase1(graph);
    let cyclic = !p1.cycles.is_empty();

    let mut insights = GraphInsights {
        phase1: p1,
        pagerank: HashMap::new(),
        betweenness: HashMap::new(),
        hubs: HashMap::new(),
        authorities: HashMap::new(),
        eigenvector: HashMap::new(),
        critical_path: HashMap::new(),
        status: BTreeMap::new(),
    };

    let cancel = CancelFlag::new();
    let (tx, rx) = mpsc::channel::<Completion>();
    let mut pending = 0usize;

    // PageRank.
    spawn_metric(graph, &cancel, &tx, "pagerank", &mut pending, {
        let config = PageRankConfig::default();
        move |g, flag| MetricPayload::PageRank(pagerank(g, &config, flag).scores)
    });

    // Betweenness: skip / approximate / exact per configuration.
    if config.betweenness == BetweennessMode::Skip {
        insights.status.insert(
            "betweenness".to_string(),
            MetricStatus::skipped("disabled by configuration"),
        );
    } else {
        let sample = match config.betweenness {
            BetweennessMode::Approximate => Some(
                config
                    .betweenness_sample_size
                    .unwrap_or_else(|| recommend_sample_size(graph.node_count())),
            ),
            _ => None,
        };
        let seed = config.approx_seed;
        spawn_metric(graph, &cancel, &tx, "betweenness", &mut pending, move |g, flag| {
            let outcome = betweenness_centrality(g, sample, seed, flag);
            MetricPayload::Betweenness {
                scores: outcome.scores,
                approximate: outcome.approximate,
            }
        });
    }

    // HITS.
    spawn_metric(graph, &cancel, &tx, "hits", &mut pending, |g, flag| {
        let result = hits(g, 100, 1e-8, flag);
        MetricPayload::Hits {
            hubs: result.hubs,
            authorities: result.authorities,
        }
    });

    // Eigenvector.
    spawn_metric(graph, &cancel, &tx, "eigenvector", &mut pending, |g, flag| {
        MetricPayload::Eigenvector(eigenvector_centrality(g, flag))
    });

    // Critical path: DAG-only precondition checked up front.
    if cyclic {
        insights.status.insert(
            "critical_path".to_string(),
            MetricStatus::skipped("graph has cycles"),
        );
    } else {
        spawn_metric(graph, &cancel, &tx, "critical_path", &mut pending, |g, flag| {
            let depths = critical_path_depth(g, flag).map(|r| r.depths).unwrap_or_default();
            MetricPayload::CriticalPath(depths)
        });
    }

    drop(tx);

    let budget = Duration::from_millis(config.phase2_budget_ms);
    let deadline = Instant::now() + budget;

    // Collect until every worker reported or the budget expired.
    while pending > 0 {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        match rx.recv_timeout(deadline - now) {
            Ok(completion) => {
                pending -= 1;
                merge(&mut insights, completion, false);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Budget expired: cancel cooperatively, drain what is already in
    // flight, but do not wait for stragglers.
    if pending > 0 {
        cancel.cancel();
        debug!(pending, "phase-2 budget expired, cancelling");
        while let Ok(completion) = rx.try_recv() {
            pending -= 1;
            merge(&mut insights, completion, true);
        }
    }

    // Workers that never reported: timeout with no retained result.
    let budget_ms = config.phase2_budget_ms;
    for name in PHASE2_METRICS {
        insights
            .status
            .entry(name.to_string())
            .or_insert_with(|| MetricStatus::timeout(budget_ms));
    }

    insights
}

fn spawn_metric<F>(
    graph: &Arc<IssueGraph>,
    cancel: &CancelFlag,
    tx: &mpsc::Sender<Completion>,
    name: &'static str,
    pending: &mut usize,
    compute: F,
) where
    F: FnOnce(&IssueGraph, &CancelFlag) -> MetricPayload + Send + 'static,
{
    let graph = Arc::clone(graph);
    let cancel = cancel.clone();
    let tx = tx.clone();
    *pending += 1;

    thread::spawn(move || {
        let start = Instant::now();
        let payload = compute(&graph, &cancel);
        // Receiver may be gone if the orchestrator already returned.
        let _ = tx.send(Completion {
            name,
            payload,
            elapsed: start.elapsed(),
        });
    });
}

fn merge(insights: &mut GraphInsights, completion: Completion, after_deadline: bool) {
    #[allow(clippy::cast_possible_truncation)]
    let elapsed_ms = completion.elapsed.as_millis() as u64;

    let status = if after_deadline {
        MetricStatus::timeout(elapsed_ms)
    } else {
        match &completion.payload {
            MetricPayload::Betweenness { approximate: true, .. } => {
                MetricStatus::approx(elapsed_ms)
            }
            _ => MetricStatus::computed(elapsed_ms),
        }
    };
    insights.status.insert(completion.name.to_string(), status);

    match completion.payload {
        MetricPayload::PageRank(scores) => insights.pagerank = scores,
        MetricPayload::Betweenness { scores, .. } => insights.betweenness = scores,
        MetricPayload::Hits { hubs, authorities } => {
            insights.hubs = hubs;
            insights.authorities = authorities;
        }
        MetricPayload::Eigenvector(scores) => insights.eigenvector = scores,
        MetricPayload::CriticalPath(depths) => insights.critical_path = depths,
    }
}
