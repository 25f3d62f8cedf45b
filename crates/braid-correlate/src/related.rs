//! Related-work discovery for a target issue.
//!
//! Four candidate sets, each with its own relevance scale, deduplicated
//! in order: file overlap, commit overlap, dependency cluster (≤2 hops
//! in the blocking graph), and concurrent activity windows. Every
//! category filters by a minimum relevance and caps its results.

use std::collections::{BTreeMap, BTreeSet};

use braid_core::model::Status;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::file_index::{normalize_path, FileLookup};
use crate::history::{BeadHistory, HistoryReport};

/// How two beads are related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    FileOverlap,
    CommitOverlap,
    DependencyCluster,
    Concurrent,
}

/// One related bead with its relevance and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedWorkBead {
    pub bead_id: String,
    pub title: String,
    pub status: Status,
    pub relation_type: RelationType,
    /// 0–100.
    pub relevance: u32,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_commits: Vec<String>,
}

/// All related beads grouped by relationship type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedWorkResult {
    pub target_bead_id: String,
    pub target_title: String,
    pub file_overlap: Vec<RelatedWorkBead>,
    pub commit_overlap: Vec<RelatedWorkBead>,
    pub dependency_cluster: Vec<RelatedWorkBead>,
    pub concurrent: Vec<RelatedWorkBead>,
    pub total_related: usize,
}

/// Discovery configuration.
#[derive(Debug, Clone)]
pub struct RelatedWorkOptions {
    /// Minimum relevance (0–100) to include.
    pub min_relevance: u32,
    /// Maximum results per category; 0 = unlimited.
    pub max_results: usize,
    /// Expansion applied to the target's activity window for the
    /// concurrent check.
    pub concurrency_window: Duration,
    pub include_closed: bool,
}

impl Default for RelatedWorkOptions {
    fn default() -> Self {
        Self {
            min_relevance: 20,
            max_results: 10,
            concurrency_window: Duration::days(7),
            include_closed: false,
        }
    }
}

/// Discover work related to `target_id`. Returns `None` when the target
/// has no history entry.
#[must_use]
#[instrument(skip_all, fields(target = target_id))]
pub fn find_related_work(
    report: &HistoryReport,
    lookup: &FileLookup<'_>,
    target_id: &str,
    dependency_graph: Option<&BTreeMap<String, Vec<String>>>,
    opts: &RelatedWorkOptions,
    now: DateTime<Utc>,
) -> Option<RelatedWorkResult> {
    let target = report.histories.get(target_id)?;

    let mut target_files: BTreeSet<String> = BTreeSet::new();
    let mut target_commits: BTreeSet<&str> = BTreeSet::new();
    for correlated in &target.commits {
        target_commits.insert(correlated.commit.sha.as_str());
        for file in &correlated.commit.files {
            target_files.insert(normalize_path(&file.path));
        }
    }

    // Dedup across categories, earlier categories winning.
    let mut seen: BTreeSet<String> = BTreeSet::new();
    seen.insert(target_id.to_string());

    let file_overlap = find_file_overlap(report, lookup, &target_files, opts, &mut seen);
    let commit_overlap = find_commit_overlap(report, target_id, &target_commits, opts, &mut seen);
    let dependency_cluster = dependency_graph
        .map(|deps| find_dependency_cluster(report, target_id, deps, opts, &mut seen))
        .unwrap_or_default();
    let concurrent = find_concurrent(report, target, opts, &seen, now);

    let total_related = file_overlap.len()
        + commit_overlap.len()
        + dependency_cluster.len()
        + concurrent.len();

    Some(RelatedWorkResult {
        target_bead_id: target_id.to_string(),
        target_title: target.title.clone(),
        file_overlap,
        commit_overlap,
        dependency_cluster,
        concurrent,
        total_related,
    })
}

fn find_file_overlap(
    report: &HistoryReport,
    lookup: &FileLookup<'_>,
    target_files: &BTreeSet<String>,
    opts: &RelatedWorkOptions,
    seen: &mut BTreeSet<String>,
) -> Vec<RelatedWorkBead> {
    if target_files.is_empty() {
        return Vec::new();
    }

    let mut overlap: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in target_files {
        let result = lookup.lookup(file);
        for reference in result
            .open_beads
            .iter()
            .chain(opts.include_closed.then_some(&result.closed_beads).into_iter().flatten())
        {
            if seen.contains(&reference.bead_id) {
                continue;
            }
            overlap
                .entry(reference.bead_id.clone())
                .or_default()
                .push(file.clone());
        }
    }

    let total = target_files.len();
    let mut results: Vec<RelatedWorkBead> = overlap
        .into_iter()
        .filter_map(|(bead_id, mut shared)| {
            let history = report.histories.get(&bead_id)?;
            if skip_status(history.status, opts.include_closed) {
                return None;
            }

            let relevance = pct(shared.len(), total).min(100);
            if relevance < opts.min_relevance {
                return None;
            }

            shared.sort_unstable();
            shared.dedup();
            let reason = overlap_reason(shared.len(), total, "shared file", "shared files");
            Some(RelatedWorkBead {
                bead_id,
                title: history.title.clone(),
                status: history.status,
                relation_type: RelationType::FileOverlap,
                relevance,
                reason,
                shared_files: limited(shared, 5),
                shared_commits: Vec::new(),
            })
        })
        .collect();

    finalize(&mut results, opts, seen);
    results
}

fn find_commit_overlap(
    report: &HistoryReport,
    target_id: &str,
    target_commits: &BTreeSet<&str>,
    opts: &RelatedWorkOptions,
    seen: &mut BTreeSet<String>,
) -> Vec<RelatedWorkBead> {
    if target_commits.is_empty() {
        return Vec::new();
    }

    let mut shared: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for sha in target_commits {
        let Some(bead_ids) = report.commit_index.get(*sha) else {
            continue;
        };
        for bead_id in bead_ids {
            if seen.contains(bead_id) || bead_id == target_id {
                continue;
            }
            shared
                .entry(bead_id.clone())
                .or_default()
                .insert((*sha).to_string());
        }
    }

    let total = target_commits.len();
    let mut results: Vec<RelatedWorkBead> = shared
        .into_iter()
        .filter_map(|(bead_id, shas)| {
            let history = report.histories.get(&bead_id)?;
            if skip_status(history.status, opts.include_closed) {
                return None;
            }

            let relevance = pct(shas.len(), total).min(100);
            if relevance < opts.min_relevance {
                return None;
            }

            let reason = overlap_reason(shas.len(), total, "shared commit", "shared commits");
            let short: Vec<String> = shas
                .into_iter()
                .map(|sha| braid_core::model::Commit::shorten(&sha))
                .collect();
            Some(RelatedWorkBead {
                bead_id,
                title: history.title.clone(),
                status: history.status,
                relation_type: RelationType::CommitOverlap,
                relevance,
                reason,
                shared_files: Vec::new(),
                shared_commits: limited(short, 5),
            })
        })
        .collect();

    finalize(&mut results, opts, seen);
    results
}

fn find_dependency_cluster(
    report: &HistoryReport,
    target_id: &str,
    dependency_graph: &BTreeMap<String, Vec<String>>,
    opts: &RelatedWorkOptions,
    seen: &mut BTreeSet<String>,
) -> Vec<RelatedWorkBead> {
    // bead → hop distance (1 = direct, 2 = dependency of a dependency).
    let mut cluster: BTreeMap<String, u8> = BTreeMap::new();

    if let Some(deps) = dependency_graph.get(target_id) {
        for dep in deps {
            if !seen.contains(dep) {
                cluster.insert(dep.clone(), 1);
            }
        }
    }
    for (bead_id, deps) in dependency_graph {
        if seen.contains(bead_id) {
            continue;
        }
        if deps.iter().any(|d| d == target_id) {
            cluster.entry(bead_id.clone()).or_insert(1);
        }
    }

    let first_hop: Vec<String> = cluster.keys().cloned().collect();
    for hop in &first_hop {
        if let Some(deps) = dependency_graph.get(hop) {
            for dep in deps {
                if dep != target_id && !seen.contains(dep) {
                    cluster.entry(dep.clone()).or_insert(2);
                }
            }
        }
    }

    let mut results: Vec<RelatedWorkBead> = cluster
        .into_iter()
        .filter_map(|(bead_id, hops)| {
            let history = report.histories.get(&bead_id)?;
            if skip_status(history.status, opts.include_closed) {
                return None;
            }

            let (relevance, reason) = if hops == 1 {
                (80, "Direct dependency".to_string())
            } else {
                (40, "Indirect dependency (2 hops)".to_string())
            };
            if relevance < opts.min_relevance {
                return None;
            }

            Some(RelatedWorkBead {
                bead_id,
                title: history.title.clone(),
                status: history.status,
                relation_type: RelationType::DependencyCluster,
                relevance,
                reason,
                shared_files: Vec::new(),
                shared_commits: Vec::new(),
            })
        })
        .collect();

    finalize(&mut results, opts, seen);
    results
}

fn find_concurrent(
    report: &HistoryReport,
    target: &BeadHistory,
    opts: &RelatedWorkOptions,
    seen: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> Vec<RelatedWorkBead> {
    let Some((target_start, target_end)) = activity_window(target, now) else {
        return Vec::new();
    };

    let window_start = target_start - opts.concurrency_window;
    let window_end = target_end + opts.concurrency_window;

    let mut results: Vec<RelatedWorkBead> = report
        .histories
        .iter()
        .filter(|(bead_id, _)| !seen.contains(*bead_id))
        .filter_map(|(bead_id, history)| {
            if skip_status(history.status, opts.include_closed) {
                return None;
            }
            let (start, end) = activity_window(history, now)?;
            if start > window_end || end < window_start {
                return None;
            }

            let overlap_start = start.max(window_start);
            let overlap_end = end.min(window_end);
            let overlap = overlap_end - overlap_start;
            let target_span = target_end - target_start;

            let mut relevance = 30u32;
            if target_span > Duration::zero() {
                let fraction =
                    overlap.num_seconds() as f64 / target_span.num_seconds() as f64;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let bonus = (fraction * 50.0).max(0.0) as u32;
                relevance = (relevance + bonus).min(100);
            }
            if relevance < opts.min_relevance {
                return None;
            }

            let days = overlap.num_days();
            let reason = if days < 1 {
                "Active in same time window".to_string()
            } else if days == 1 {
                "1 day of overlapping activity".to_string()
            } else {
                format!("{days} days of overlapping activity")
            };

            Some(RelatedWorkBead {
                bead_id: bead_id.clone(),
                title: history.title.clone(),
                status: history.status,
                relation_type: RelationType::Concurrent,
                relevance,
                reason,
                shared_files: Vec::new(),
                shared_commits: Vec::new(),
            })
        })
        .collect();

    sort_related(&mut results);
    if opts.max_results > 0 {
        results.truncate(opts.max_results);
    }
    results
}

/// An issue's activity span: created milestone (or first commit) up to
/// the close milestone (or now).
fn activity_window(
    history: &BeadHistory,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = history
        .milestones
        .created
        .as_ref()
        .map(|e| e.timestamp)
        .or_else(|| history.commits.first().map(|c| c.commit.timestamp))?;
    let end = history
        .milestones
        .closed
        .as_ref()
        .map_or(now, |e| e.timestamp);
    Some((start, end))
}

fn skip_status(status: Status, include_closed: bool) -> bool {
    if status.is_tombstone() {
        return true;
    }
    !include_closed && status.is_closed()
}

fn sort_related(results: &mut [RelatedWorkBead]) {
    results.sort_by(|a, b| {
        b.relevance
            .cmp(&a.relevance)
            .then_with(|| a.bead_id.cmp(&b.bead_id))
    });
}

fn finalize(
    results: &mut Vec<RelatedWorkBead>,
    opts: &RelatedWorkOptions,
    seen: &mut BTreeSet<String>,
) {
    sort_related(results);
    if opts.max_results > 0 {
        results.truncate(opts.max_results);
    }
    for bead in results.iter() {
        seen.insert(bead.bead_id.clone());
    }
}

#[allow(clippy::cast_possible_truncation)]
fn pct(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 100) / total) as u32
}

fn overlap_reason(shared: usize, total: usize, singular: &str, plural: &str) -> String {
    if shared == 1 {
        return format!("1 {singular}");
    }
    let p = pct(shared, total);
    if p > 0 {
        format!("{shared} {plural} ({p}%)")
    } else {
        format!("{shared} {plural}")
    }
}

fn limited(mut items: Vec<String>, max: usize) -> Vec<String> {
    items.truncate(max);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{commit, report_of};

    fn related(
        report: &HistoryReport,
        target: &str,
        deps: Option<&BTreeMap<String, Vec<String>>>,
    ) -> RelatedWorkResult {
        let lookup = FileLookup::new(report);
        find_related_work(
            report,
            &lookup,
            target,
            deps,
            &RelatedWorkOptions::default(),
            Utc::now(),
        )
        .expect("target exists")
    }

    #[test]
    fn unknown_target_returns_none() {
        let report = report_of(&[]);
        let lookup = FileLookup::new(&report);
        assert!(find_related_work(
            &report,
            &lookup,
            "ghost",
            None,
            &RelatedWorkOptions::default(),
            Utc::now(),
        )
        .is_none());
    }

    #[test]
    fn file_overlap_found_with_percentage() {
        let report = report_of(&[
            ("br-1", Status::Open, vec![commit("s1", 1, &["shared.rs", "only1.rs"])]),
            ("br-2", Status::Open, vec![commit("s2", 2, &["shared.rs"])]),
        ]);
        let result = related(&report, "br-1", None);

        assert_eq!(result.file_overlap.len(), 1);
        let bead = &result.file_overlap[0];
        assert_eq!(bead.bead_id, "br-2");
        // 1 of br-1's 2 files is shared.
        assert_eq!(bead.relevance, 50);
        assert_eq!(bead.shared_files, vec!["shared.rs"]);
    }

    #[test]
    fn commit_overlap_uses_commit_index() {
        let shared = commit("s1", 1, &["a.rs"]);
        let report = report_of(&[
            ("br-1", Status::Open, vec![shared.clone()]),
            ("br-2", Status::Open, vec![shared]),
        ]);
        let result = related(&report, "br-1", None);

        // br-2 dedupes into file_overlap (checked first) or commit
        // overlap; either way it appears exactly once.
        let total = result.file_overlap.len() + result.commit_overlap.len();
        assert_eq!(total, 1);
        assert_eq!(result.total_related, 1);
    }

    #[test]
    fn dependency_cluster_scores_by_hops() {
        let report = report_of(&[
            ("br-1", Status::Open, vec![]),
            ("br-2", Status::Open, vec![]),
            ("br-3", Status::Open, vec![]),
        ]);
        let mut deps = BTreeMap::new();
        deps.insert("br-1".to_string(), vec!["br-2".to_string()]);
        deps.insert("br-2".to_string(), vec!["br-3".to_string()]);

        let result = related(&report, "br-1", Some(&deps));
        assert_eq!(result.dependency_cluster.len(), 2);
        assert_eq!(result.dependency_cluster[0].bead_id, "br-2");
        assert_eq!(result.dependency_cluster[0].relevance, 80);
        assert_eq!(result.dependency_cluster[1].bead_id, "br-3");
        assert_eq!(result.dependency_cluster[1].relevance, 40);
    }

    #[test]
    fn reverse_dependencies_are_direct() {
        let report = report_of(&[
            ("br-1", Status::Open, vec![]),
            ("br-2", Status::Open, vec![]),
        ]);
        let mut deps = BTreeMap::new();
        // br-2 depends on br-1: related from br-1's point of view.
        deps.insert("br-2".to_string(), vec!["br-1".to_string()]);

        let result = related(&report, "br-1", Some(&deps));
        assert_eq!(result.dependency_cluster.len(), 1);
        assert_eq!(result.dependency_cluster[0].bead_id, "br-2");
        assert_eq!(result.dependency_cluster[0].relevance, 80);
    }

    #[test]
    fn concurrent_windows_overlap() {
        // Both beads have commits around the same epoch hours and no
        // close milestone, so both windows run to `now` and overlap.
        let report = report_of(&[
            ("br-1", Status::Open, vec![commit("s1", 1, &["a.rs"])]),
            ("br-2", Status::Open, vec![commit("s2", 5, &["b.rs"])]),
        ]);
        let result = related(&report, "br-1", None);

        assert_eq!(result.concurrent.len(), 1);
        let bead = &result.concurrent[0];
        assert_eq!(bead.bead_id, "br-2");
        assert!(bead.relevance >= 30);
    }

    #[test]
    fn closed_beads_excluded_by_default() {
        let report = report_of(&[
            ("br-1", Status::Open, vec![commit("s1", 1, &["shared.rs"])]),
            ("br-2", Status::Closed, vec![commit("s2", 2, &["shared.rs"])]),
        ]);
        let result = related(&report, "br-1", None);
        assert_eq!(result.total_related, 0);

        let lookup = FileLookup::new(&report);
        let opts = RelatedWorkOptions {
            include_closed: true,
            ..RelatedWorkOptions::default()
        };
        let with_closed =
            find_related_work(&report, &lookup, "br-1", None, &opts, Utc::now()).unwrap();
        assert!(with_closed.total_related >= 1);
    }

    #[test]
    fn min_relevance_filters() {
        // 1 of 10 target files shared: 10% relevance, below default 20.
        let target_files: Vec<String> = (0..10).map(|i| format!("f{i}.rs")).collect();
        let refs: Vec<&str> = target_files.iter().map(String::as_str).collect();
        let report = report_of(&[
            ("br-1", Status::Open, vec![commit("s1", 1, &refs)]),
            ("br-2", Status::Open, vec![commit("s2", 2, &["f0.rs"])]),
        ]);
        let result = related(&report, "br-1", None);
        assert!(result.file_overlap.is_empty());
    }
}
