//! File co-change analysis.
//!
//! Two files co-change when the same commit touches both. Correlation is
//! asymmetric: `corr(A, B) = #(A∩B) / #A`, so a utility file edited in
//! every commit correlates weakly *from* everything else's perspective
//! while everything correlates strongly from its own.
//!
//! The matrix is built single-threaded: the inner loop is small-constant
//! work per file pair and never dominates an invocation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::file_index::{normalize_path, PathCache};
use crate::history::HistoryReport;

/// A file that frequently co-changes with the queried one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoChangeEntry {
    pub file_path: String,
    /// Commits where both files changed.
    pub co_change_count: usize,
    /// Commits touching the queried file.
    pub total_commits: usize,
    /// `co_change_count / total_commits`, in `[0, 1]`.
    pub correlation: f64,
    /// Up to three short shas where both files changed together.
    pub sample_commits: Vec<String>,
}

/// Result of a related-files query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoChangeResult {
    pub file_path: String,
    pub total_commits: usize,
    pub related_files: Vec<CoChangeEntry>,
    pub threshold: f64,
}

/// Symmetric co-change counts plus per-file commit totals.
#[derive(Debug, Default)]
pub struct CoChangeMatrix {
    /// file → related file → commits touching both.
    pub matrix: BTreeMap<String, BTreeMap<String, usize>>,
    /// file → commits touching it.
    pub file_commit_counts: BTreeMap<String, usize>,
    /// short sha → normalized files in that commit (for sampling).
    commit_files: BTreeMap<String, Vec<String>>,
}

impl CoChangeMatrix {
    /// Build the matrix from a history report. A commit appearing in
    /// several bead histories is counted once.
    #[must_use]
    #[instrument(skip_all, fields(beads = report.histories.len()))]
    pub fn build(report: &HistoryReport) -> Self {
        let mut matrix = Self::default();
        let mut paths = PathCache::new();
        let mut processed: BTreeSet<&str> = BTreeSet::new();

        for history in report.histories.values() {
            for correlated in &history.commits {
                let commit = &correlated.commit;
                if !processed.insert(commit.sha.as_str()) {
                    continue;
                }

                let mut files: Vec<String> = commit
                    .files
                    .iter()
                    .map(|f| paths.normalize(&f.path))
                    .filter(|p| !p.is_empty())
                    .collect();
                files.sort_unstable();
                files.dedup();

                matrix
                    .commit_files
                    .insert(commit.short_sha.clone(), files.clone());

                for file in &files {
                    *matrix.file_commit_counts.entry(file.clone()).or_default() += 1;
                }

                for a in &files {
                    for b in &files {
                        if a == b {
                            continue;
                        }
                        *matrix
                            .matrix
                            .entry(a.clone())
                            .or_default()
                            .entry(b.clone())
                            .or_default() += 1;
                    }
                }
            }
        }

        matrix
    }

    /// Files that co-change with `file_path` at or above `threshold`
    /// (default 0.5 when ≤ 0), capped at `limit` (default 10 when 0),
    /// sorted by correlation descending with path tie-break.
    #[must_use]
    pub fn related_files(&self, file_path: &str, threshold: f64, limit: usize) -> CoChangeResult {
        let threshold = if threshold <= 0.0 { 0.5 } else { threshold };
        let limit = if limit == 0 { 10 } else { limit };

        let normalized = normalize_path(file_path);
        let total_commits = self
            .file_commit_counts
            .get(&normalized)
            .copied()
            .unwrap_or(0);

        let mut result = CoChangeResult {
            file_path: file_path.to_string(),
            total_commits,
            related_files: Vec::new(),
            threshold,
        };

        if total_commits == 0 {
            return result;
        }
        let Some(related) = self.matrix.get(&normalized) else {
            return result;
        };

        #[allow(clippy::cast_precision_loss)]
        let mut entries: Vec<CoChangeEntry> = related
            .iter()
            .filter_map(|(file, &count)| {
                let correlation = count as f64 / total_commits as f64;
                (correlation >= threshold).then(|| CoChangeEntry {
                    file_path: file.clone(),
                    co_change_count: count,
                    total_commits,
                    correlation,
                    sample_commits: self.sample_commits(&normalized, file),
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.correlation
                .partial_cmp(&a.correlation)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        entries.truncate(limit);

        result.related_files = entries;
        result
    }

    /// Up to three commits where both files changed, scanned in sorted
    /// sha order so the samples are reproducible.
    fn sample_commits(&self, a: &str, b: &str) -> Vec<String> {
        let mut samples = Vec::with_capacity(3);
        for (sha, files) in &self.commit_files {
            if samples.len() >= 3 {
                break;
            }
            if files.iter().any(|f| f == a) && files.iter().any(|f| f == b) {
                samples.push(sha.clone());
            }
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{commit, report_of};
    use braid_core::model::Status;

    #[test]
    fn empty_report_builds_empty_matrix() {
        let matrix = CoChangeMatrix::build(&report_of(&[]));
        assert!(matrix.matrix.is_empty());
        assert!(matrix.file_commit_counts.is_empty());
    }

    #[test]
    fn matrix_is_symmetric_and_bounded() {
        let report = report_of(&[(
            "br-1",
            Status::Open,
            vec![
                commit("s1", 1, &["a.rs", "b.rs"]),
                commit("s2", 2, &["a.rs", "b.rs", "c.rs"]),
                commit("s3", 3, &["a.rs"]),
            ],
        )]);
        let matrix = CoChangeMatrix::build(&report);

        assert_eq!(matrix.matrix["a.rs"]["b.rs"], 2);
        assert_eq!(matrix.matrix["b.rs"]["a.rs"], 2);
        assert_eq!(matrix.file_commit_counts["a.rs"], 3);
        assert_eq!(matrix.file_commit_counts["b.rs"], 2);
        // matrix[A][B] <= min(count[A], count[B]).
        assert!(matrix.matrix["a.rs"]["b.rs"] <= 2);
    }

    #[test]
    fn commit_shared_by_beads_counted_once() {
        let shared = commit("s1", 1, &["a.rs", "b.rs"]);
        let report = report_of(&[
            ("br-1", Status::Open, vec![shared.clone()]),
            ("br-2", Status::Open, vec![shared]),
        ]);
        let matrix = CoChangeMatrix::build(&report);
        assert_eq!(matrix.file_commit_counts["a.rs"], 1);
        assert_eq!(matrix.matrix["a.rs"]["b.rs"], 1);
    }

    #[test]
    fn correlation_is_asymmetric() {
        let report = report_of(&[(
            "br-1",
            Status::Open,
            vec![
                commit("s1", 1, &["a.rs", "b.rs"]),
                commit("s2", 2, &["a.rs"]),
            ],
        )]);
        let matrix = CoChangeMatrix::build(&report);

        // From a's perspective: 1 of 2 commits co-change with b.
        let from_a = matrix.related_files("a.rs", 0.4, 10);
        assert_eq!(from_a.related_files.len(), 1);
        assert!((from_a.related_files[0].correlation - 0.5).abs() < 1e-12);

        // From b's perspective: its single commit always includes a.
        let from_b = matrix.related_files("b.rs", 0.4, 10);
        assert!((from_b.related_files[0].correlation - 1.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_filters_weak_correlations() {
        let report = report_of(&[(
            "br-1",
            Status::Open,
            vec![
                commit("s1", 1, &["a.rs", "rare.rs"]),
                commit("s2", 2, &["a.rs"]),
                commit("s3", 3, &["a.rs"]),
                commit("s4", 4, &["a.rs"]),
            ],
        )]);
        let matrix = CoChangeMatrix::build(&report);

        // rare.rs correlates at 0.25 from a.rs: below the default 0.5.
        let result = matrix.related_files("a.rs", 0.0, 0);
        assert!((result.threshold - 0.5).abs() < f64::EPSILON);
        assert!(result.related_files.is_empty());

        let loose = matrix.related_files("a.rs", 0.2, 10);
        assert_eq!(loose.related_files.len(), 1);
    }

    #[test]
    fn sample_commits_capped_at_three() {
        let commits: Vec<_> = (0..5)
            .map(|i| commit(&format!("s{i}"), i, &["a.rs", "b.rs"]))
            .collect();
        let report = report_of(&[("br-1", Status::Open, commits)]);
        let matrix = CoChangeMatrix::build(&report);

        let result = matrix.related_files("a.rs", 0.5, 10);
        assert_eq!(result.related_files[0].sample_commits.len(), 3);
        // Sorted-sha scan keeps samples reproducible.
        assert_eq!(result.related_files[0].sample_commits, vec!["s0", "s1", "s2"]);
    }

    #[test]
    fn unknown_file_returns_empty_result() {
        let matrix = CoChangeMatrix::build(&report_of(&[]));
        let result = matrix.related_files("ghost.rs", 0.5, 10);
        assert_eq!(result.total_commits, 0);
        assert!(result.related_files.is_empty());
    }
}
