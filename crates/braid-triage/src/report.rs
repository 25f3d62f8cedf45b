//! Machine-readable report payloads.
//!
//! Each top-level command output is one serializable struct wrapping the
//! shared envelope. The shapes here are the engine's public contract:
//! field names are stable and every array is emitted in a deterministic
//! order.

use std::collections::BTreeMap;
use std::sync::Arc;

use braid_core::config::EngineConfig;
use braid_core::envelope::Envelope;
use braid_core::model::Issue;
use braid_search::TriageWeights;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::alerts::{
    filter_alerts, generate_alerts, summarize, Alert, AlertSummary, AlertType, Baseline, Severity,
};
use crate::graph::IssueGraph;
use crate::plan::{actionable_issues, execution_plan, ExecutionPlan};
use crate::schedule::{analyze, GraphInsights};
use crate::triage::{
    blockers_to_clear, priority_misalignments, project_health, quick_wins, recommend,
    PriorityProposal, ProjectHealth, QuickWin, Recommendation,
};

/// Everything one engine invocation derives from the issue set. Built
/// once, then sliced into the individual report payloads.
pub struct EngineRun {
    pub graph: Arc<IssueGraph>,
    pub insights: GraphInsights,
    pub envelope: Envelope,
    config: EngineConfig,
}

impl EngineRun {
    /// Validate, build the graph, and run both metric phases.
    #[must_use]
    #[instrument(skip_all, fields(n = issues.len()))]
    pub fn execute(issues: Vec<Issue>, config: EngineConfig) -> Self {
        let (valid, warnings) = braid_core::model::validate_issues(issues);
        let graph = Arc::new(IssueGraph::build(&valid));
        let insights = analyze(&graph, &config);

        let envelope = Envelope::new(&valid)
            .with_warnings(warnings)
            .with_status(insights.status.clone());

        Self {
            graph,
            insights,
            envelope,
            config,
        }
    }

    fn weights(&self) -> TriageWeights {
        if let Some(map) = &self.config.search_weights {
            return TriageWeights::from_map(map).normalized();
        }
        TriageWeights::preset(&self.config.search_preset).unwrap_or_default()
    }

    fn recommendations(&self) -> Vec<Recommendation> {
        recommend(&self.graph, &self.insights, self.weights(), Utc::now())
    }

    /// The `insights` payload: the full metrics bundle.
    #[must_use]
    pub fn insights_report(&self) -> InsightsReport {
        InsightsReport {
            envelope: self.envelope.clone(),
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            density: self.insights.phase1.density,
            cycles: self.insights.phase1.cycles.clone(),
            topological_order: self.insights.phase1.topological_order.clone(),
            in_degree: sorted(&self.insights.phase1.degree.in_degree),
            out_degree: sorted(&self.insights.phase1.degree.out_degree),
            pagerank: sorted(&self.insights.pagerank),
            betweenness: sorted(&self.insights.betweenness),
            hubs: sorted(&self.insights.hubs),
            authorities: sorted(&self.insights.authorities),
            eigenvector: sorted(&self.insights.eigenvector),
            critical_path: sorted(&self.insights.critical_path),
        }
    }

    /// The `triage` payload: ranked recommendations plus derived lists.
    #[must_use]
    pub fn triage_report(&self) -> TriageReport {
        let recommendations = self.recommendations();
        let actionable = actionable_issues(&self.graph);
        let actionable_ids: Vec<&str> = actionable.iter().map(|i| i.id.as_str()).collect();

        let quick_ref = QuickRef {
            total_issues: self.graph.node_count(),
            actionable: actionable.len(),
            top: recommendations.iter().take(3).map(|r| r.id.clone()).collect(),
        };

        let quick_wins = quick_wins(&self.graph, &recommendations, &actionable_ids);
        let blockers = blockers_to_clear(
            &self.graph,
            self.config.alerts.blocking_cascade_info_threshold,
        )
        .into_iter()
        .map(|(id, unblocks)| BlockerEntry {
            unblocks_count: unblocks.len(),
            id,
            unblocks,
        })
        .collect();

        let suggested_commands = recommendations
            .first()
            .map(|top| {
                vec![
                    format!("claim {}", top.id),
                    "plan".to_string(),
                    "alerts".to_string(),
                ]
            })
            .unwrap_or_default();

        TriageReport {
            envelope: self.envelope.clone(),
            quick_ref,
            recommendations,
            quick_wins,
            blockers_to_clear: blockers,
            health: project_health(&self.graph),
            suggested_commands,
        }
    }

    /// The `next` payload: the single top recommendation.
    #[must_use]
    pub fn next_report(&self) -> NextReport {
        let top = self.recommendations().into_iter().next();
        NextReport {
            envelope: self.envelope.clone(),
            claim_command: top.as_ref().map(|r| format!("claim {}", r.id)),
            recommendation: top,
        }
    }

    /// The `plan` payload: parallel execution tracks.
    #[must_use]
    pub fn plan_report(&self) -> PlanReport {
        PlanReport {
            envelope: self.envelope.clone(),
            plan: execution_plan(&self.graph),
        }
    }

    /// The `priority` payload: misalignment proposals.
    #[must_use]
    pub fn priority_report(&self) -> PriorityReport {
        let recommendations = self.recommendations();
        PriorityReport {
            envelope: self.envelope.clone(),
            proposals: priority_misalignments(&self.graph, &recommendations),
        }
    }

    /// The `alerts` payload, optionally filtered and compared against a
    /// baseline.
    #[must_use]
    pub fn alerts_report(
        &self,
        baseline: Option<&Baseline>,
        alert_type: Option<AlertType>,
        severity: Option<Severity>,
    ) -> AlertsReport {
        let alerts = generate_alerts(
            &self.graph,
            &self.insights,
            &self.config.alerts,
            baseline,
            Utc::now(),
        );
        let alerts = filter_alerts(alerts, alert_type, severity);
        let summary = summarize(&alerts);
        AlertsReport {
            envelope: self.envelope.clone(),
            alerts,
            summary,
        }
    }

    /// Capture the summary counts a baseline store persists for later
    /// drift comparison.
    #[must_use]
    pub fn snapshot_baseline(&self) -> Baseline {
        let actionable = actionable_issues(&self.graph).len();
        let open = self
            .graph
            .issues
            .values()
            .filter(|issue| !issue.status.is_closed())
            .count();

        Baseline {
            data_hash: self.envelope.data_hash.clone(),
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            density: self.insights.phase1.density,
            actionable_count: actionable,
            blocked_count: open - actionable,
            cycles: self.insights.phase1.cycles.clone(),
            pagerank: sorted(&self.insights.pagerank),
        }
    }
}

fn sorted<V: Clone>(map: &std::collections::HashMap<String, V>) -> BTreeMap<String, V> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub cycles: Vec<Vec<String>>,
    pub topological_order: Option<Vec<String>>,
    pub in_degree: BTreeMap<String, usize>,
    pub out_degree: BTreeMap<String, usize>,
    pub pagerank: BTreeMap<String, f64>,
    pub betweenness: BTreeMap<String, f64>,
    pub hubs: BTreeMap<String, f64>,
    pub authorities: BTreeMap<String, f64>,
    pub eigenvector: BTreeMap<String, f64>,
    pub critical_path: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickRef {
    pub total_issues: usize,
    pub actionable: usize,
    /// Top-3 recommendation ids.
    pub top: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerEntry {
    pub id: String,
    pub unblocks_count: usize,
    pub unblocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub quick_ref: QuickRef,
    pub recommendations: Vec<Recommendation>,
    pub quick_wins: Vec<QuickWin>,
    pub blockers_to_clear: Vec<BlockerEntry>,
    pub health: ProjectHealth,
    pub suggested_commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextReport {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub recommendation: Option<Recommendation>,
    pub claim_command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReport {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub plan: ExecutionPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityReport {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub proposals: Vec<PriorityProposal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsReport {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
}
