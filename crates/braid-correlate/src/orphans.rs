//! Orphan-commit detection: commits with no confirmed correlation to
//! any issue, plus best-guess suggestions for where they belong.
//!
//! Suggestions come from the shared-file heuristic (the orphan touches
//! files some bead's commits also touch) and temporal proximity (the
//! bead was active when the commit landed). Confidence is reported on a
//! 0–100 scale and never reaches the certainty of a real correlation.

use std::collections::BTreeSet;

use braid_core::model::Commit;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::file_index::normalize_path;
use crate::history::HistoryReport;

/// A guessed issue for one orphan commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbableBead {
    pub bead_id: String,
    /// 0–100.
    pub confidence: u32,
    pub reasons: Vec<String>,
}

/// One uncorrelated commit with its suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanCandidate {
    pub sha: String,
    pub short_sha: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub message: String,
    pub probable_beads: Vec<ProbableBead>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrphanStats {
    pub total_commits: usize,
    pub correlated_count: usize,
    pub orphan_count: usize,
    pub orphan_ratio: f64,
}

/// The `orphans` payload body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub candidates: Vec<OrphanCandidate>,
    pub stats: OrphanStats,
}

const SHARED_FILE_BASE: u32 = 40;
const SHARED_FILE_PER_EXTRA: u32 = 10;
const SHARED_FILE_CAP: u32 = 70;
const TEMPORAL_BONUS: u32 = 20;
/// How far around a bead's activity window a commit still counts as
/// temporally close.
const TEMPORAL_SLACK_DAYS: i64 = 3;
const MAX_SUGGESTIONS: usize = 5;

/// Find orphan commits and suggest probable beads for each.
#[must_use]
#[instrument(skip_all, fields(commits = report.commits.len()))]
pub fn find_orphans(report: &HistoryReport, now: DateTime<Utc>) -> OrphanReport {
    let total = report.commits.len();
    let correlated = report
        .commits
        .iter()
        .filter(|c| report.commit_index.contains_key(&c.sha))
        .count();

    let candidates: Vec<OrphanCandidate> = report
        .commits
        .iter()
        .filter(|c| !report.commit_index.contains_key(&c.sha))
        .map(|commit| OrphanCandidate {
            sha: commit.sha.clone(),
            short_sha: commit.short_sha.clone(),
            timestamp: commit.timestamp,
            author: commit.author.clone(),
            message: commit.message.clone(),
            probable_beads: probable_beads(report, commit, now),
        })
        .collect();

    let orphan_count = candidates.len();
    #[allow(clippy::cast_precision_loss)]
    let orphan_ratio = if total == 0 {
        0.0
    } else {
        orphan_count as f64 / total as f64
    };

    OrphanReport {
        candidates,
        stats: OrphanStats {
            total_commits: total,
            correlated_count: correlated,
            orphan_count,
            orphan_ratio,
        },
    }
}

fn probable_beads(report: &HistoryReport, commit: &Commit, now: DateTime<Utc>) -> Vec<ProbableBead> {
    let orphan_files: BTreeSet<String> = commit
        .files
        .iter()
        .map(|f| normalize_path(&f.path))
        .filter(|p| !p.is_empty())
        .collect();

    let mut suggestions = Vec::new();

    for (bead_id, history) in &report.histories {
        if history.status.is_tombstone() {
            continue;
        }

        let mut confidence = 0u32;
        let mut reasons = Vec::new();

        // Shared files between the orphan and the bead's commits.
        let bead_files: BTreeSet<String> = history
            .commits
            .iter()
            .flat_map(|c| c.commit.files.iter())
            .map(|f| normalize_path(&f.path))
            .collect();
        let shared = orphan_files.intersection(&bead_files).count();
        if shared > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let bump = SHARED_FILE_BASE + (shared as u32 - 1) * SHARED_FILE_PER_EXTRA;
            confidence += bump.min(SHARED_FILE_CAP);
            reasons.push(if shared == 1 {
                "shares 1 file".to_string()
            } else {
                format!("shares {shared} files")
            });
        }

        // Temporal proximity to the bead's activity window.
        let start = history
            .milestones
            .created
            .as_ref()
            .map(|e| e.timestamp)
            .or_else(|| history.commits.first().map(|c| c.commit.timestamp));
        if let Some(start) = start {
            let end = history
                .milestones
                .closed
                .as_ref()
                .map_or(now, |e| e.timestamp);
            let slack = Duration::days(TEMPORAL_SLACK_DAYS);
            if commit.timestamp >= start - slack && commit.timestamp <= end + slack {
                confidence += TEMPORAL_BONUS;
                reasons.push("active at commit time".to_string());
            }
        }

        if confidence > 0 {
            suggestions.push(ProbableBead {
                bead_id: bead_id.clone(),
                confidence: confidence.min(100),
                reasons,
            });
        }
    }

    suggestions.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.bead_id.cmp(&b.bead_id))
    });
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{commit, report_of};
    use braid_core::model::{FileChange, Status};
    use chrono::Duration;

    fn plain_commit(sha: &str, offset_hours: i64, files: &[&str]) -> Commit {
        Commit {
            sha: sha.to_string(),
            short_sha: Commit::shorten(sha),
            timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::hours(offset_hours),
            author: "test".to_string(),
            author_email: "test@example.com".to_string(),
            message: format!("orphan {sha}"),
            files: files
                .iter()
                .map(|path| FileChange {
                    path: (*path).to_string(),
                    insertions: 1,
                    deletions: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_report_has_no_orphans() {
        let report = find_orphans(&report_of(&[]), Utc::now());
        assert!(report.candidates.is_empty());
        assert_eq!(report.stats.total_commits, 0);
        assert!((report.stats.orphan_ratio - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn correlated_commits_are_not_orphans() {
        let report = report_of(&[("br-1", Status::Open, vec![commit("s1", 1, &["a.rs"])])]);
        let orphans = find_orphans(&report, Utc::now());
        assert_eq!(orphans.stats.total_commits, 1);
        assert_eq!(orphans.stats.correlated_count, 1);
        assert_eq!(orphans.stats.orphan_count, 0);
    }

    #[test]
    fn uncorrelated_commit_becomes_candidate_with_shared_file_guess() {
        let mut report = report_of(&[("br-1", Status::Open, vec![commit("s1", 1, &["a.rs"])])]);
        report.commits.push(plain_commit("s2", 2, &["a.rs", "new.rs"]));

        let orphans = find_orphans(&report, Utc::now());
        assert_eq!(orphans.stats.orphan_count, 1);
        assert!((orphans.stats.orphan_ratio - 0.5).abs() < 1e-12);

        let candidate = &orphans.candidates[0];
        assert_eq!(candidate.sha, "s2");
        assert_eq!(candidate.probable_beads.len(), 1);
        let guess = &candidate.probable_beads[0];
        assert_eq!(guess.bead_id, "br-1");
        assert!(guess.confidence <= 100);
        // Shared file plus temporal proximity to the open bead.
        assert!(guess.reasons.iter().any(|r| r.contains("shares 1 file")));
        assert!(guess.reasons.iter().any(|r| r.contains("active")));
    }

    #[test]
    fn no_overlap_means_no_suggestions() {
        let mut report = report_of(&[("br-1", Status::Open, vec![commit("s1", 1, &["a.rs"])])]);
        // Out of the activity slack and sharing nothing.
        let mut stray = plain_commit("s0", 0, &["unrelated.rs"]);
        stray.timestamp = DateTime::<Utc>::UNIX_EPOCH - Duration::days(365);
        report.commits.insert(0, stray);

        let orphans = find_orphans(&report, Utc::now());
        assert_eq!(orphans.stats.orphan_count, 1);
        assert!(orphans.candidates[0].probable_beads.is_empty());
    }

    #[test]
    fn suggestions_rank_by_confidence_then_id() {
        let mut report = report_of(&[
            ("br-many", Status::Open, vec![commit("s1", 1, &["a.rs", "b.rs", "c.rs"])]),
            ("br-one", Status::Open, vec![commit("s2", 1, &["a.rs"])]),
        ]);
        report.commits.push(plain_commit("s3", 2, &["a.rs", "b.rs", "c.rs"]));

        let orphans = find_orphans(&report, Utc::now());
        let guesses = &orphans.candidates[0].probable_beads;
        assert_eq!(guesses.len(), 2);
        // Three shared files beat one.
        assert_eq!(guesses[0].bead_id, "br-many");
        assert!(guesses[0].confidence > guesses[1].confidence);
    }

    #[test]
    fn tombstone_beads_never_suggested() {
        let mut report =
            report_of(&[("br-dead", Status::Tombstone, vec![commit("s1", 1, &["a.rs"])])]);
        report.commits.push(plain_commit("s2", 2, &["a.rs"]));

        let orphans = find_orphans(&report, Utc::now());
        // The tombstone's own commit still counts as correlated, but no
        // suggestions point at it.
        let with_guesses: Vec<_> = orphans
            .candidates
            .iter()
            .flat_map(|c| &c.probable_beads)
            .collect();
        assert!(with_guesses.is_empty());
    }
}
