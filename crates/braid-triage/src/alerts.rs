//! Alert generation: staleness, blocking cascades, and drift against a
//! saved baseline.
//!
//! Alerts are advisory — they never mutate anything. Tombstone issues
//! never generate alerts (they are excluded from the graph up front),
//! and individual alert types can be disabled by name in the config.

use std::collections::BTreeMap;
use std::fmt;

use braid_core::config::AlertConfig;
use braid_core::model::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::plan::{actionable_issues, compute_unblocks};
use crate::schedule::GraphInsights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    StaleIssue,
    BlockingCascade,
    NewCycle,
    NodeCountChange,
    EdgeCountChange,
    DensityChange,
    PagerankChange,
    ActionableChange,
    BlockedIncrease,
}

impl AlertType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StaleIssue => "stale_issue",
            Self::BlockingCascade => "blocking_cascade",
            Self::NewCycle => "new_cycle",
            Self::NodeCountChange => "node_count_change",
            Self::EdgeCountChange => "edge_count_change",
            Self::DensityChange => "density_change",
            Self::PagerankChange => "pagerank_change",
            Self::ActionableChange => "actionable_change",
            Self::BlockedIncrease => "blocked_increase",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One typed alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,
    pub message: String,
}

/// Counts by severity for the alerts payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Summary counts captured from a previous run, supplied by the
/// external baseline store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub data_hash: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub actionable_count: usize,
    pub blocked_count: usize,
    pub cycles: Vec<Vec<String>>,
    pub pagerank: BTreeMap<String, f64>,
}

/// Generate all alerts for the current graph, optionally comparing
/// against a baseline. Output order: issue alerts by (type, id), then
/// drift alerts in a fixed sequence.
#[must_use]
#[instrument(skip_all, fields(n = graph.node_count(), baseline = baseline.is_some()))]
pub fn generate_alerts(
    graph: &IssueGraph,
    insights: &GraphInsights,
    config: &AlertConfig,
    baseline: Option<&Baseline>,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    stale_alerts(graph, config, now, &mut alerts);
    cascade_alerts(graph, config, &mut alerts);
    if let Some(baseline) = baseline {
        drift_alerts(graph, insights, config, baseline, &mut alerts);
    }

    alerts.retain(|alert| !config.is_alert_disabled(alert.alert_type.as_str()));
    alerts
}

/// Keep only alerts matching the given type/severity filters.
#[must_use]
pub fn filter_alerts(
    alerts: Vec<Alert>,
    alert_type: Option<AlertType>,
    severity: Option<Severity>,
) -> Vec<Alert> {
    alerts
        .into_iter()
        .filter(|alert| alert_type.is_none_or(|t| alert.alert_type == t))
        .filter(|alert| severity.is_none_or(|s| alert.severity == s))
        .collect()
}

#[must_use]
pub fn summarize(alerts: &[Alert]) -> AlertSummary {
    let mut summary = AlertSummary {
        total: alerts.len(),
        ..AlertSummary::default()
    };
    for alert in alerts {
        match alert.severity {
            Severity::Critical => summary.critical += 1,
            Severity::Warning => summary.warning += 1,
            Severity::Info => summary.info += 1,
        }
    }
    summary
}

fn stale_alerts(
    graph: &IssueGraph,
    config: &AlertConfig,
    now: DateTime<Utc>,
    alerts: &mut Vec<Alert>,
) {
    let mut ids: Vec<&String> = graph.issues.keys().collect();
    ids.sort_unstable();

    for id in ids {
        let issue = &graph.issues[id];
        if matches!(
            issue.status,
            Status::Closed | Status::Deferred | Status::Pinned
        ) {
            continue;
        }

        let (warn_days, crit_days, multiplier) = config.staleness_thresholds(&issue.labels);
        let (warn_days, crit_days) = if issue.status == Status::InProgress {
            (
                scale_days(warn_days, multiplier),
                scale_days(crit_days, multiplier),
            )
        } else {
            (warn_days as f64, crit_days as f64)
        };

        let idle_days = (now - issue.updated_at).num_seconds() as f64 / 86_400.0;

        let severity = if idle_days >= crit_days {
            Severity::Critical
        } else if idle_days >= warn_days {
            Severity::Warning
        } else {
            continue;
        };

        alerts.push(Alert {
            alert_type: AlertType::StaleIssue,
            severity,
            issue_id: Some(issue.id.clone()),
            message: format!(
                "{} has been inactive for {} days",
                issue.id, idle_days as i64
            ),
        });
    }
}

fn cascade_alerts(graph: &IssueGraph, config: &AlertConfig, alerts: &mut Vec<Alert>) {
    let mut ids: Vec<&String> = graph.issues.keys().collect();
    ids.sort_unstable();

    for id in ids {
        let issue = &graph.issues[id];
        if issue.status.is_closed() {
            continue;
        }

        let unblocks = compute_unblocks(graph, id);
        let severity = if unblocks.len() >= config.blocking_cascade_warning_threshold {
            Severity::Warning
        } else if unblocks.len() >= config.blocking_cascade_info_threshold {
            Severity::Info
        } else {
            continue;
        };

        alerts.push(Alert {
            alert_type: AlertType::BlockingCascade,
            severity,
            issue_id: Some(issue.id.clone()),
            message: format!("closing {} would unblock {} issues", issue.id, unblocks.len()),
        });
    }
}

fn drift_alerts(
    graph: &IssueGraph,
    insights: &GraphInsights,
    config: &AlertConfig,
    baseline: &Baseline,
    alerts: &mut Vec<Alert>,
) {
    // New cycles: present now, absent from the baseline.
    for cycle in &insights.phase1.cycles {
        if !baseline.cycles.contains(cycle) {
            alerts.push(Alert {
                alert_type: AlertType::NewCycle,
                severity: Severity::Warning,
                issue_id: cycle.first().cloned(),
                message: format!("new dependency cycle: {}", cycle.join(" -> ")),
            });
        }
    }

    if let Some(pct) = pct_change(baseline.node_count as f64, graph.node_count() as f64) {
        if pct.abs() >= config.node_growth_info_pct {
            alerts.push(Alert {
                alert_type: AlertType::NodeCountChange,
                severity: Severity::Info,
                issue_id: None,
                message: format!(
                    "node count changed {:+.0}% ({} -> {})",
                    pct,
                    baseline.node_count,
                    graph.node_count()
                ),
            });
        }
    }

    if let Some(pct) = pct_change(baseline.edge_count as f64, graph.edge_count() as f64) {
        if pct.abs() >= config.edge_growth_info_pct {
            alerts.push(Alert {
                alert_type: AlertType::EdgeCountChange,
                severity: Severity::Info,
                issue_id: None,
                message: format!(
                    "edge count changed {:+.0}% ({} -> {})",
                    pct,
                    baseline.edge_count,
                    graph.edge_count()
                ),
            });
        }
    }

    if let Some(pct) = pct_change(baseline.density, insights.phase1.density) {
        if pct >= config.density_warning_pct {
            alerts.push(density_alert(Severity::Warning, pct, baseline, insights));
        } else if pct >= config.density_info_pct {
            alerts.push(density_alert(Severity::Info, pct, baseline, insights));
        }
    }

    // Largest per-issue PageRank swing, scanned in id order.
    let mut worst: Option<(String, f64)> = None;
    for (id, old_score) in &baseline.pagerank {
        let Some(new_score) = insights.pagerank.get(id) else {
            continue;
        };
        let Some(pct) = pct_change(*old_score, *new_score) else {
            continue;
        };
        if pct.abs() >= config.pagerank_change_warning_pct
            && worst.as_ref().is_none_or(|(_, w)| pct.abs() > w.abs())
        {
            worst = Some((id.clone(), pct));
        }
    }
    if let Some((id, pct)) = worst {
        alerts.push(Alert {
            alert_type: AlertType::PagerankChange,
            severity: Severity::Warning,
            issue_id: Some(id.clone()),
            message: format!("pagerank of {id} changed {pct:+.0}% against baseline"),
        });
    }

    let actionable_now = actionable_issues(graph).len();
    if let Some(pct) = pct_change(baseline.actionable_count as f64, actionable_now as f64) {
        if pct <= -config.actionable_decrease_warning_pct {
            alerts.push(Alert {
                alert_type: AlertType::ActionableChange,
                severity: Severity::Warning,
                issue_id: None,
                message: format!(
                    "actionable issues dropped {:.0}% ({} -> {actionable_now})",
                    -pct, baseline.actionable_count
                ),
            });
        } else if pct.abs() >= config.actionable_increase_info_pct {
            alerts.push(Alert {
                alert_type: AlertType::ActionableChange,
                severity: Severity::Info,
                issue_id: None,
                message: format!(
                    "actionable issues changed {pct:+.0}% ({} -> {actionable_now})",
                    baseline.actionable_count
                ),
            });
        }
    }

    let open_now = graph
        .issues
        .values()
        .filter(|issue| !issue.status.is_closed())
        .count();
    let blocked_now = open_now - actionable_now;
    if blocked_now > baseline.blocked_count
        && blocked_now - baseline.blocked_count >= config.blocked_increase_threshold
    {
        alerts.push(Alert {
            alert_type: AlertType::BlockedIncrease,
            severity: Severity::Warning,
            issue_id: None,
            message: format!(
                "blocked issues rose from {} to {blocked_now}",
                baseline.blocked_count
            ),
        });
    }
}

fn density_alert(
    severity: Severity,
    pct: f64,
    baseline: &Baseline,
    insights: &GraphInsights,
) -> Alert {
    Alert {
        alert_type: AlertType::DensityChange,
        severity,
        issue_id: None,
        message: format!(
            "graph density rose {pct:.0}% ({:.4} -> {:.4})",
            baseline.density, insights.phase1.density
        ),
    }
}

fn scale_days(days: i64, multiplier: f64) -> f64 {
    days as f64 * multiplier
}

fn pct_change(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 {
        // No baseline magnitude to compare against.
        return (new != 0.0).then_some(100.0);
    }
    Some((new - old) / old * 100.0)
}
