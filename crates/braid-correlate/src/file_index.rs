//! File→issue reverse index, lookups, hotspots, and impact analysis.
//!
//! Built by scanning every commit of every bead history. Lookups read
//! issue status from the live history map rather than the index, so a
//! status change between index build and query is reflected.

use std::collections::{BTreeMap, HashMap};

use braid_core::model::Status;
use chrono::{DateTime, Duration, Utc};
use globset::Glob;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cochange::CoChangeMatrix;
use crate::history::HistoryReport;

/// Links one bead to one file via the commits that touched both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeadReference {
    pub bead_id: String,
    pub title: String,
    pub status: Status,
    /// Short shas of the linking commits, in first-seen order.
    pub commit_shas: Vec<String>,
    /// Most recent linking commit timestamp.
    pub last_touch: DateTime<Utc>,
    /// Insertions + deletions accumulated across the linking commits.
    pub total_changes: u64,
}

/// Aggregate statistics about the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndexStats {
    pub total_files: usize,
    pub total_bead_links: usize,
    pub files_with_multiple_beads: usize,
}

/// Result of a path / prefix / glob lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBeadLookupResult {
    pub file_path: String,
    pub open_beads: Vec<BeadReference>,
    pub closed_beads: Vec<BeadReference>,
    pub total_beads: usize,
}

/// A file touched by many distinct beads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHotspot {
    pub file_path: String,
    pub total_beads: usize,
    pub open_beads: usize,
    pub closed_beads: usize,
}

/// A bead touching one or more files of a proposed edit set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedBead {
    pub bead_id: String,
    pub title: String,
    pub status: Status,
    pub overlap_files: Vec<String>,
    pub overlap_count: usize,
    pub last_activity: DateTime<Utc>,
    pub relevance: f64,
    pub total_changes: u64,
}

/// Impact analysis of a proposed edit set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub files: Vec<String>,
    pub affected_beads: Vec<AffectedBead>,
    pub risk_level: String,
    pub risk_score: f64,
    pub warnings: Vec<String>,
    pub summary: String,
}

/// Normalize a path for consistent lookup: backslashes become forward
/// slashes, repeated separators collapse, leading `./` and trailing `/`
/// are stripped.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let forward = path.replace('\\', "/");

    let mut collapsed = String::with_capacity(forward.len());
    let mut prev_slash = false;
    for ch in forward.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(ch);
    }

    collapsed
        .strip_prefix("./")
        .unwrap_or(&collapsed)
        .trim_end_matches('/')
        .to_string()
}

/// Memoizing wrapper around [`normalize_path`]. Path normalization is a
/// hot path while indexing, and commit streams repeat paths constantly.
#[derive(Debug, Default)]
pub struct PathCache {
    cache: HashMap<String, String>,
}

impl PathCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, path: &str) -> String {
        if let Some(cached) = self.cache.get(path) {
            return cached.clone();
        }
        let normalized = normalize_path(path);
        self.cache.insert(path.to_string(), normalized.clone());
        normalized
    }
}

/// O(1) lookup from normalized file path to the beads that touched it.
#[derive(Debug, Default)]
pub struct FileBeadIndex {
    /// Normalized path → references, sorted last-touch descending.
    pub file_to_beads: BTreeMap<String, Vec<BeadReference>>,
    pub stats: FileIndexStats,
}

impl FileBeadIndex {
    /// Build the index from a history report.
    #[must_use]
    #[instrument(skip_all, fields(beads = report.histories.len()))]
    pub fn build(report: &HistoryReport) -> Self {
        let mut paths = PathCache::new();
        // file → bead → reference, for deduplication while scanning.
        let mut map: BTreeMap<String, BTreeMap<String, BeadReference>> = BTreeMap::new();

        for (bead_id, history) in &report.histories {
            for correlated in &history.commits {
                let commit = &correlated.commit;
                for file in &commit.files {
                    let path = paths.normalize(&file.path);
                    if path.is_empty() {
                        continue;
                    }

                    let by_bead = map.entry(path).or_default();
                    let reference =
                        by_bead.entry(bead_id.clone()).or_insert_with(|| BeadReference {
                            bead_id: bead_id.clone(),
                            title: history.title.clone(),
                            status: history.status,
                            commit_shas: Vec::new(),
                            last_touch: commit.timestamp,
                            total_changes: 0,
                        });

                    if !reference.commit_shas.contains(&commit.short_sha) {
                        reference.commit_shas.push(commit.short_sha.clone());
                    }
                    if commit.timestamp > reference.last_touch {
                        reference.last_touch = commit.timestamp;
                    }
                    reference.total_changes +=
                        u64::from(file.insertions) + u64::from(file.deletions);
                }
            }
        }

        let mut index = Self::default();
        let mut total_links = 0;
        let mut multi = 0;

        for (path, by_bead) in map {
            let mut refs: Vec<BeadReference> = by_bead.into_values().collect();
            sort_bead_refs(&mut refs);
            total_links += refs.len();
            if refs.len() > 1 {
                multi += 1;
            }
            index.file_to_beads.insert(path, refs);
        }

        index.stats = FileIndexStats {
            total_files: index.file_to_beads.len(),
            total_bead_links: total_links,
            files_with_multiple_beads: multi,
        };

        index
    }
}

/// File lookup with live status resolution and co-change access.
pub struct FileLookup<'a> {
    index: FileBeadIndex,
    report: &'a HistoryReport,
    cochange: CoChangeMatrix,
}

impl<'a> FileLookup<'a> {
    #[must_use]
    pub fn new(report: &'a HistoryReport) -> Self {
        Self {
            index: FileBeadIndex::build(report),
            report,
            cochange: CoChangeMatrix::build(report),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &FileIndexStats {
        &self.index.stats
    }

    #[must_use]
    pub fn cochange(&self) -> &CoChangeMatrix {
        &self.cochange
    }

    /// All indexed files, sorted.
    #[must_use]
    pub fn all_files(&self) -> Vec<&str> {
        self.index.file_to_beads.keys().map(String::as_str).collect()
    }

    /// Exact-path lookup, falling back to a directory-prefix union when
    /// the exact path is not indexed.
    #[must_use]
    pub fn lookup(&self, path: &str) -> FileBeadLookupResult {
        let normalized = normalize_path(path);
        let mut result = FileBeadLookupResult {
            file_path: path.to_string(),
            open_beads: Vec::new(),
            closed_beads: Vec::new(),
            total_beads: 0,
        };

        if let Some(refs) = self.index.file_to_beads.get(&normalized) {
            for reference in refs {
                self.bucket(reference.clone(), &mut result, false);
            }
        } else {
            let prefix = format!("{normalized}/");
            for (file, refs) in &self.index.file_to_beads {
                if file.starts_with(&prefix) {
                    for reference in refs {
                        self.bucket(reference.clone(), &mut result, true);
                    }
                }
            }
        }

        sort_bead_refs(&mut result.open_beads);
        sort_bead_refs(&mut result.closed_beads);
        result.total_beads = result.open_beads.len() + result.closed_beads.len();
        result
    }

    /// Glob lookup over the whole index, deduplicating by bead.
    #[must_use]
    pub fn lookup_glob(&self, pattern: &str) -> FileBeadLookupResult {
        let mut result = FileBeadLookupResult {
            file_path: pattern.to_string(),
            open_beads: Vec::new(),
            closed_beads: Vec::new(),
            total_beads: 0,
        };

        let Ok(glob) = Glob::new(pattern) else {
            return result;
        };
        let matcher = glob.compile_matcher();

        for (file, refs) in &self.index.file_to_beads {
            if !matcher.is_match(file) {
                continue;
            }
            for reference in refs {
                self.bucket(reference.clone(), &mut result, true);
            }
        }

        sort_bead_refs(&mut result.open_beads);
        sort_bead_refs(&mut result.closed_beads);
        result.total_beads = result.open_beads.len() + result.closed_beads.len();
        result
    }

    /// The `limit` files touched by the most distinct beads, with
    /// open/closed counts read from live status.
    #[must_use]
    pub fn hotspots(&self, limit: usize) -> Vec<FileHotspot> {
        let mut counts: Vec<FileHotspot> = self
            .index
            .file_to_beads
            .iter()
            .map(|(path, refs)| {
                let open = refs
                    .iter()
                    .filter(|r| !matches!(self.live_status(r), Status::Closed | Status::Tombstone))
                    .count();
                FileHotspot {
                    file_path: path.clone(),
                    total_beads: refs.len(),
                    open_beads: open,
                    closed_beads: refs.len() - open,
                }
            })
            .collect();

        counts.sort_by(|a, b| {
            b.total_beads
                .cmp(&a.total_beads)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });

        if limit > 0 {
            counts.truncate(limit);
        }
        counts
    }

    /// Which open or recently-closed beads are affected if `files` are
    /// modified, with a fused relevance score and an overall risk level.
    #[must_use]
    #[instrument(skip(self), fields(files = files.len()))]
    pub fn impact_analysis(&self, files: &[String], now: DateTime<Utc>) -> ImpactResult {
        let mut result = ImpactResult {
            files: Vec::new(),
            affected_beads: Vec::new(),
            risk_level: "low".to_string(),
            risk_score: 0.0,
            warnings: Vec::new(),
            summary: String::new(),
        };

        // Normalize, drop empties, deduplicate.
        let mut seen = std::collections::BTreeSet::new();
        for file in files {
            let normalized = normalize_path(file.trim());
            if normalized.is_empty() || !seen.insert(normalized.clone()) {
                continue;
            }
            result.files.push(normalized);
        }

        if result.files.is_empty() {
            result.summary = "No files to analyze".to_string();
            return result;
        }

        let recently_closed_cutoff = now - Duration::days(7);
        let mut affected: BTreeMap<String, AffectedBead> = BTreeMap::new();

        for path in &result.files {
            let lookup = self.lookup(path);
            for reference in lookup.open_beads {
                merge_affected(&mut affected, &reference, path);
            }
            for reference in lookup.closed_beads {
                if reference.last_touch < recently_closed_cutoff {
                    continue;
                }
                merge_affected(&mut affected, &reference, path);
            }
        }

        let mut open_count = 0;
        let mut in_progress_count = 0;
        let mut recent_closed_count = 0;

        #[allow(clippy::cast_precision_loss)]
        let total_files = result.files.len() as f64;

        for bead in affected.values_mut() {
            let days_since = (now - bead.last_activity).num_seconds() as f64 / 86_400.0;
            let recency = (1.0 - days_since / 7.0).max(0.0);
            #[allow(clippy::cast_precision_loss)]
            let overlap = bead.overlap_count as f64 / total_files;
            let status_multiplier = match bead.status {
                Status::InProgress => {
                    in_progress_count += 1;
                    1.0
                }
                Status::Open => {
                    open_count += 1;
                    0.8
                }
                _ => {
                    recent_closed_count += 1;
                    0.5
                }
            };

            bead.relevance = recency * 0.4 + overlap * 0.4 + status_multiplier * 0.2;
            result.affected_beads.push(bead.clone());
        }

        result.affected_beads.sort_by(|a, b| {
            status_rank(a.status)
                .cmp(&status_rank(b.status))
                .then_with(|| {
                    b.relevance
                        .partial_cmp(&a.relevance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.bead_id.cmp(&b.bead_id))
        });

        result.risk_score = f64::from(in_progress_count) * 0.4
            + f64::from(open_count) * 0.2
            + f64::from(recent_closed_count) * 0.05;
        if result.files.len() > 3 {
            result.risk_score += 0.1;
        }
        result.risk_score = result.risk_score.min(1.0);

        result.risk_level = match result.risk_score {
            s if s >= 0.7 => "critical",
            s if s >= 0.4 => "high",
            s if s >= 0.2 => "medium",
            _ => "low",
        }
        .to_string();

        if in_progress_count > 0 {
            result.warnings.push(
                "Active work in progress on these files - coordinate before making changes"
                    .to_string(),
            );
        }
        if open_count > 0 {
            result
                .warnings
                .push("Open beads touch these files - review before modifying".to_string());
        }

        result.summary = impact_summary(in_progress_count, open_count, recent_closed_count);
        result
    }

    /// Live status from the history map, falling back to the indexed
    /// snapshot.
    fn live_status(&self, reference: &BeadReference) -> Status {
        self.report
            .histories
            .get(&reference.bead_id)
            .map_or(reference.status, |h| h.status)
    }

    fn bucket(
        &self,
        mut reference: BeadReference,
        result: &mut FileBeadLookupResult,
        dedupe: bool,
    ) {
        let status = self.live_status(&reference);
        reference.status = status;
        if let Some(history) = self.report.histories.get(&reference.bead_id) {
            reference.title = history.title.clone();
        }

        match status {
            Status::Tombstone => {}
            Status::Closed => {
                if !dedupe || !contains_bead(&result.closed_beads, &reference.bead_id) {
                    result.closed_beads.push(reference);
                }
            }
            _ => {
                if !dedupe || !contains_bead(&result.open_beads, &reference.bead_id) {
                    result.open_beads.push(reference);
                }
            }
        }
    }
}

fn merge_affected(
    affected: &mut BTreeMap<String, AffectedBead>,
    reference: &BeadReference,
    path: &str,
) {
    let bead = affected
        .entry(reference.bead_id.clone())
        .or_insert_with(|| AffectedBead {
            bead_id: reference.bead_id.clone(),
            title: reference.title.clone(),
            status: reference.status,
            overlap_files: Vec::new(),
            overlap_count: 0,
            last_activity: reference.last_touch,
            relevance: 0.0,
            total_changes: 0,
        });

    if !bead.overlap_files.contains(&path.to_string()) {
        bead.overlap_files.push(path.to_string());
    }
    bead.overlap_count = bead.overlap_files.len();
    bead.total_changes += reference.total_changes;
    if reference.last_touch > bead.last_activity {
        bead.last_activity = reference.last_touch;
    }
}

/// in-progress first, then open-like, then closed.
fn status_rank(status: Status) -> u8 {
    match status {
        Status::InProgress => 0,
        Status::Closed => 2,
        _ => 1,
    }
}

fn impact_summary(in_progress: u32, open: u32, recent_closed: u32) -> String {
    let total = in_progress + open + recent_closed;
    if total == 0 {
        return "No beads found touching these files - safe to proceed".to_string();
    }

    let mut parts = Vec::new();
    if in_progress > 0 {
        parts.push(format!("{in_progress} {} in progress", pluralize(in_progress)));
    }
    if open > 0 {
        parts.push(format!("{open} open {}", pluralize(open)));
    }
    if recent_closed > 0 {
        parts.push(format!("{recent_closed} recently closed {}", pluralize(recent_closed)));
    }

    let prefix = if in_progress > 0 {
        "Conflict risk: "
    } else {
        "Found "
    };
    format!("{prefix}{} touching these files", parts.join(", "))
}

fn pluralize(count: u32) -> &'static str {
    if count == 1 {
        "bead"
    } else {
        "beads"
    }
}

/// Most-recent touch first, bead id as the stable tie-break.
fn sort_bead_refs(refs: &mut [BeadReference]) {
    refs.sort_by(|a, b| {
        b.last_touch
            .cmp(&a.last_touch)
            .then_with(|| a.bead_id.cmp(&b.bead_id))
    });
}

fn contains_bead(refs: &[BeadReference], bead_id: &str) -> bool {
    refs.iter().any(|r| r.bead_id == bead_id)
}
