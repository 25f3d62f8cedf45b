//! Dependency-respecting execution planning.
//!
//! The plan groups actionable issues into parallel tracks — one per
//! connected component of the blocking graph — so independent streams of
//! work surface as independently schedulable. Each actionable issue also
//! carries the set of issues that would become actionable the moment it
//! closes.

use std::collections::HashMap;

use braid_core::model::{Issue, Status};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::graph::IssueGraph;

/// A single actionable item in the execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: String,
    pub title: String,
    pub priority: u8,
    pub status: Status,
    /// Issues that become actionable when this one closes.
    pub unblocks: Vec<String>,
}

/// A group of related actionable items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTrack {
    pub track_id: String,
    pub items: Vec<PlanItem>,
    pub reason: String,
}

/// Quick insight into where to push first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub highest_impact: String,
    pub impact_reason: String,
    pub unblocks_count: usize,
}

/// The complete work plan with parallel tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub tracks: Vec<ExecutionTrack>,
    pub total_actionable: usize,
    pub total_blocked: usize,
    pub summary: PlanSummary,
}

/// An issue is actionable when it is not closed and has no open blocker.
#[must_use]
pub fn actionable_issues(graph: &IssueGraph) -> Vec<&Issue> {
    let mut actionable: Vec<&Issue> = graph
        .issues
        .values()
        .filter(|issue| !issue.status.is_closed())
        .filter(|issue| {
            issue.blocking_deps().all(|dep| {
                graph
                    .issues
                    .get(dep)
                    .is_none_or(|blocker| blocker.status.is_closed())
            })
        })
        .collect();
    actionable.sort_by(|a, b| a.id.cmp(&b.id));
    actionable
}

/// Issues that become actionable if `issue_id` closes: they depend on
/// it, and no *other* open blocker remains on them.
#[must_use]
pub fn compute_unblocks(graph: &IssueGraph, issue_id: &str) -> Vec<String> {
    let mut unblocks = Vec::new();

    for issue in graph.issues.values() {
        if issue.status.is_closed() {
            continue;
        }

        let mut has_this_blocker = false;
        let mut would_stay_blocked = false;

        for dep in issue.blocking_deps() {
            if dep == issue_id {
                has_this_blocker = true;
                continue;
            }
            if let Some(blocker) = graph.issues.get(dep) {
                if !blocker.status.is_closed() {
                    would_stay_blocked = true;
                    break;
                }
            }
        }

        if has_this_blocker && !would_stay_blocked {
            unblocks.push(issue.id.clone());
        }
    }

    unblocks.sort_unstable();
    unblocks
}

/// Generate the execution plan.
#[must_use]
#[instrument(skip(graph), fields(n = graph.node_count()))]
pub fn execution_plan(graph: &IssueGraph) -> ExecutionPlan {
    let actionable = actionable_issues(graph);
    let actionable_ids: Vec<&str> = actionable.iter().map(|i| i.id.as_str()).collect();

    let unblocks_map: HashMap<String, Vec<String>> = actionable_ids
        .iter()
        .map(|id| ((*id).to_string(), compute_unblocks(graph, id)))
        .collect();

    let components = connected_components(graph);
    let tracks = build_tracks(graph, &components, &actionable_ids, &unblocks_map);

    let total_open = graph
        .issues
        .values()
        .filter(|issue| !issue.status.is_closed())
        .count();

    let summary = plan_summary(&actionable_ids, &unblocks_map);

    ExecutionPlan {
        tracks,
        total_actionable: actionable.len(),
        total_blocked: total_open - actionable.len(),
        summary,
    }
}

/// Connected components over the undirected projection of the blocking
/// graph, via union-find. Returns root → sorted members, roots sorted.
fn connected_components(graph: &IssueGraph) -> Vec<Vec<String>> {
    let mut parent: HashMap<String, String> = graph
        .issues
        .keys()
        .map(|id| (id.clone(), id.clone()))
        .collect();

    fn find(parent: &mut HashMap<String, String>, x: &str) -> String {
        let p = parent.get(x).cloned().unwrap_or_else(|| x.to_string());
        if p == x {
            return p;
        }
        let root = find(parent, &p);
        parent.insert(x.to_string(), root.clone());
        root
    }

    let edges: Vec<(String, String)> = graph
        .issues
        .values()
        .flat_map(|issue| {
            issue
                .blocking_deps()
                .filter(|dep| graph.issues.contains_key(*dep))
                .map(|dep| (issue.id.clone(), dep.to_string()))
                .collect::<Vec<_>>()
        })
        .collect();

    for (a, b) in edges {
        let ra = find(&mut parent, &a);
        let rb = find(&mut parent, &b);
        if ra != rb {
            parent.insert(ra, rb);
        }
    }

    let mut components: HashMap<String, Vec<String>> = HashMap::new();
    let ids: Vec<String> = graph.issues.keys().cloned().collect();
    for id in ids {
        let root = find(&mut parent, &id);
        components.entry(root).or_default().push(id);
    }

    let mut grouped: Vec<Vec<String>> = components
        .into_values()
        .map(|mut members| {
            members.sort_unstable();
            members
        })
        .collect();
    // Order components by their smallest member for stable track labels.
    grouped.sort_by(|a, b| a.first().cmp(&b.first()));
    grouped
}

fn build_tracks(
    graph: &IssueGraph,
    components: &[Vec<String>],
    actionable_ids: &[&str],
    unblocks_map: &HashMap<String, Vec<String>>,
) -> Vec<ExecutionTrack> {
    let mut tracks = Vec::new();
    let mut track_num = 1;

    for members in components {
        let mut items: Vec<&Issue> = members
            .iter()
            .filter(|id| actionable_ids.contains(&id.as_str()))
            .filter_map(|id| graph.issues.get(id))
            .collect();

        if items.is_empty() {
            continue;
        }

        // Priority ascending (0 is most urgent), then id.
        items.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        let plan_items: Vec<PlanItem> = items
            .iter()
            .map(|issue| PlanItem {
                id: issue.id.clone(),
                title: issue.title.clone(),
                priority: issue.priority,
                status: issue.status,
                unblocks: unblocks_map.get(&issue.id).cloned().unwrap_or_default(),
            })
            .collect();

        let reason = if plan_items.len() == 1 {
            "Single actionable item".to_string()
        } else if components.len() == 1 {
            "All issues in connected graph".to_string()
        } else {
            "Independent work stream".to_string()
        };

        tracks.push(ExecutionTrack {
            track_id: track_label(track_num),
            items: plan_items,
            reason,
        });
        track_num += 1;
    }

    tracks
}

fn plan_summary(
    actionable_ids: &[&str],
    unblocks_map: &HashMap<String, Vec<String>>,
) -> PlanSummary {
    if actionable_ids.is_empty() {
        return PlanSummary::default();
    }

    // actionable_ids is already id-sorted, so ties go to the smallest id.
    let mut highest_id = "";
    let mut highest_count = 0usize;
    let mut first = true;

    for id in actionable_ids {
        let count = unblocks_map.get(*id).map_or(0, Vec::len);
        if first || count > highest_count {
            first = false;
            highest_count = count;
            highest_id = id;
        }
    }

    let impact_reason = match highest_count {
        0 => "No downstream dependencies".to_string(),
        1 => "Unblocks 1 task".to_string(),
        _ => "Unblocks multiple tasks".to_string(),
    };

    PlanSummary {
        highest_impact: highest_id.to_string(),
        impact_reason,
        unblocks_count: highest_count,
    }
}

/// 1-based base-26 track labels: `A, B, … Z, AA, AB, …`.
#[must_use]
pub fn track_label(n: usize) -> String {
    if n == 0 {
        return "?".to_string();
    }

    let mut n = n as i64 - 1;
    let mut letters = Vec::new();
    while n >= 0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        letters.insert(0, (b'A' + (n % 26) as u8) as char);
        n = n / 26 - 1;
    }
    letters.into_iter().collect()
}
