//! Triage: fuse graph metrics with issue metadata into ranked
//! recommendations.
//!
//! The recommendation score for an open issue is the weighted sum of
//! its normalized PageRank, blocker impact, priority, and recency,
//! scaled by the status normalizer (in-progress work keeps momentum,
//! blocked work is discounted). Every entry exposes its component
//! values so downstream consumers can reproduce the composite.

use std::collections::BTreeMap;

use braid_core::model::{Issue, IssueType, Status};
use braid_search::{
    normalize_impact, normalize_priority, normalize_recency, normalize_status, ScoreComponents,
    TriageWeights,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::graph::IssueGraph;
use crate::plan::compute_unblocks;
use crate::schedule::GraphInsights;

/// One ranked triage recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: u8,
    pub score: f64,
    /// Normalized inputs behind `score`.
    pub components: ScoreComponents,
    /// Issues that become actionable if this one closes.
    pub unblocks: Vec<String>,
    pub reason: String,
}

/// An actionable issue cheap enough to knock out quickly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickWin {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub reason: String,
}

/// A proposal to raise an issue's priority. Downgrades are never
/// proposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityProposal {
    pub id: String,
    pub title: String,
    pub current_priority: u8,
    pub suggested_priority: u8,
    pub reason: String,
    /// In `[0, 1]`: how far past the threshold the score sits.
    pub confidence: f64,
}

/// Counts by status, type, and priority for the project-health block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHealth {
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

/// Quick-win effort proxies: an explicit small estimate, or a short
/// description when no estimate exists.
const QUICK_WIN_MAX_ESTIMATE_MINUTES: u32 = 60;
const QUICK_WIN_MAX_DESCRIPTION_CHARS: usize = 280;
/// Floor below which a cheap issue still is not worth surfacing.
const QUICK_WIN_MIN_SCORE: f64 = 0.3;

/// Misalignment score thresholds: `(threshold, implied priority)`.
const PRIORITY_THRESHOLDS: [(f64, u8); 3] = [(0.25, 0), (0.18, 1), (0.12, 2)];

/// Rank all open (non-closed) issues.
#[must_use]
#[instrument(skip_all, fields(n = graph.node_count()))]
pub fn recommend(
    graph: &IssueGraph,
    insights: &GraphInsights,
    weights: TriageWeights,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let max_pagerank = insights
        .pagerank
        .values()
        .copied()
        .fold(0.0_f64, f64::max);
    let max_blockers = insights
        .phase1
        .degree
        .in_degree
        .values()
        .copied()
        .max()
        .unwrap_or(0);

    let mut recommendations: Vec<Recommendation> = graph
        .issues
        .values()
        .filter(|issue| !issue.status.is_closed())
        .map(|issue| {
            let components = score_components(issue, insights, max_pagerank, max_blockers, now);
            let score = composite(components, weights) * normalize_status(issue.status);
            let unblocks = compute_unblocks(graph, &issue.id);

            Recommendation {
                id: issue.id.clone(),
                title: issue.title.clone(),
                status: issue.status,
                priority: issue.priority,
                score,
                components,
                reason: describe(issue, &components, unblocks.len()),
                unblocks,
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    recommendations
}

/// Actionable issues with a low effort proxy and a non-trivial score.
#[must_use]
pub fn quick_wins(
    graph: &IssueGraph,
    recommendations: &[Recommendation],
    actionable_ids: &[&str],
) -> Vec<QuickWin> {
    recommendations
        .iter()
        .filter(|rec| actionable_ids.contains(&rec.id.as_str()))
        .filter(|rec| rec.score >= QUICK_WIN_MIN_SCORE)
        .filter_map(|rec| {
            let issue = graph.issues.get(&rec.id)?;
            let reason = low_effort_reason(issue)?;
            Some(QuickWin {
                id: rec.id.clone(),
                title: rec.title.clone(),
                score: rec.score,
                reason,
            })
        })
        .collect()
}

/// Issues whose triage score implies a priority at least one level
/// above the current one.
#[must_use]
pub fn priority_misalignments(
    graph: &IssueGraph,
    recommendations: &[Recommendation],
) -> Vec<PriorityProposal> {
    let mut proposals: Vec<PriorityProposal> = recommendations
        .iter()
        .filter_map(|rec| {
            let issue = graph.issues.get(&rec.id)?;
            let (threshold, implied) = PRIORITY_THRESHOLDS
                .iter()
                .find(|(threshold, _)| rec.score >= *threshold)
                .copied()?;

            // Upgrades only: the implied priority must be strictly more
            // urgent than the current one.
            if implied >= issue.priority {
                return None;
            }

            let confidence = ((rec.score - threshold) / threshold).clamp(0.0, 1.0);
            Some(PriorityProposal {
                id: issue.id.clone(),
                title: issue.title.clone(),
                current_priority: issue.priority,
                suggested_priority: implied,
                reason: format!(
                    "triage score {:.2} implies P{implied} (currently P{})",
                    rec.score, issue.priority
                ),
                confidence,
            })
        })
        .collect();

    proposals.sort_by(|a, b| {
        a.suggested_priority
            .cmp(&b.suggested_priority)
            .then_with(|| a.id.cmp(&b.id))
    });
    proposals
}

/// Non-closed issues whose unblocks count meets the threshold, ranked
/// by unblocks count descending with id tie-break.
#[must_use]
pub fn blockers_to_clear(graph: &IssueGraph, threshold: usize) -> Vec<(String, Vec<String>)> {
    let mut blockers: Vec<(String, Vec<String>)> = graph
        .issues
        .values()
        .filter(|issue| !issue.status.is_closed())
        .map(|issue| (issue.id.clone(), compute_unblocks(graph, &issue.id)))
        .filter(|(_, unblocks)| unblocks.len() >= threshold)
        .collect();

    blockers.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    blockers
}

/// Counts by status, type, and priority over the non-tombstone corpus.
#[must_use]
pub fn project_health(graph: &IssueGraph) -> ProjectHealth {
    let mut health = ProjectHealth::default();
    for issue in graph.issues.values() {
        *health
            .by_status
            .entry(issue.status.as_str().to_string())
            .or_default() += 1;
        *health
            .by_type
            .entry(issue.issue_type.as_str().to_string())
            .or_default() += 1;
        *health
            .by_priority
            .entry(format!("p{}", issue.priority))
            .or_default() += 1;
    }
    health
}

fn score_components(
    issue: &Issue,
    insights: &GraphInsights,
    max_pagerank: f64,
    max_blockers: usize,
    now: DateTime<Utc>,
) -> ScoreComponents {
    let pagerank = insights.pagerank.get(&issue.id).copied().unwrap_or(0.0);
    let pagerank = if max_pagerank > 0.0 {
        pagerank / max_pagerank
    } else {
        0.0
    };

    let blockers = insights
        .phase1
        .degree
        .in_degree
        .get(&issue.id)
        .copied()
        .unwrap_or(0);

    ScoreComponents {
        text: 0.0,
        pagerank,
        status: normalize_status(issue.status),
        impact: normalize_impact(blockers, max_blockers),
        priority: normalize_priority(issue.priority),
        recency: normalize_recency(Some(issue.updated_at), now),
    }
}

/// Weighted sum over the metric components; the text weight has nothing
/// to land on here, so the remaining weights are re-normalized.
fn composite(c: ScoreComponents, weights: TriageWeights) -> f64 {
    let w = TriageWeights {
        text: 0.0,
        ..weights
    }
    .normalized();

    w.pagerank * c.pagerank
        + w.status * c.status
        + w.impact * c.impact
        + w.priority * c.priority
        + w.recency * c.recency
}

fn describe(issue: &Issue, components: &ScoreComponents, unblocks: usize) -> String {
    if unblocks > 1 {
        return format!("unblocks {unblocks} issues when closed");
    }
    if unblocks == 1 {
        return "unblocks 1 issue when closed".to_string();
    }
    if components.pagerank > 0.7 {
        return "deep dependency many chains rest on".to_string();
    }
    if issue.priority == 0 {
        return "highest priority".to_string();
    }
    if issue.issue_type == IssueType::Bug && components.recency > 0.8 {
        return "recently active bug".to_string();
    }
    "ready to work".to_string()
}

fn low_effort_reason(issue: &Issue) -> Option<String> {
    if let Some(estimate) = issue.estimate_minutes {
        if estimate <= QUICK_WIN_MAX_ESTIMATE_MINUTES {
            return Some(format!("estimated {estimate}m"));
        }
        return None;
    }
    if issue.description.chars().count() < QUICK_WIN_MAX_DESCRIPTION_CHARS {
        return Some("small scope".to_string());
    }
    None
}
