//! Commit-stream parsing and issue correlation.
//!
//! # Input format
//!
//! The external producer yields raw log text in the piped format
//! `sha|RFC3339|author|email|subject` followed by a unified diff, one
//! block per commit, newest first. File paths and insertion/deletion
//! counts are recovered from the `diff --git` sections; added/removed
//! lines of the tracker file are retained for event derivation.
//!
//! # Correlation
//!
//! Three methods, strongest first:
//!
//! 1. **Explicit mention** — the subject names a known issue id.
//! 2. **Tracker co-commit** — the tracker diff carries a JSON line whose
//!    `id` matches a known issue; before/after status decides the event.
//! 3. **Shared file** — too weak to create events; used only for orphan
//!    suggestions and related-work discovery.
//!
//! # Failure model
//!
//! Commits with malformed headers or unparseable timestamps are dropped
//! with a warning. Malformed JSON lines in the tracker diff are skipped.
//! A producer error mid-stream keeps everything parsed so far.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use anyhow::{bail, Result};
use braid_core::model::{Commit, FileChange, Issue, Status};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::history::{
    bead_milestones, cycle_time, BeadEvent, BeadHistory, CorrelatedCommit, CorrelationMethod,
    EventType, HistoryReport, HistoryStats,
};

/// Default location of the issue-database file inside a repository.
pub const DEFAULT_TRACKER_FILE: &str = ".braid/issues.jsonl";

/// Canonical issue-id shape: letters, dash, alphanumerics.
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+-[A-Za-z0-9]+").expect("id pattern"));

/// Closing keyword immediately preceding an id occurrence. A
/// conventional-commit prefix like `fix(X-2):` is a work marker, not a
/// close, so the keyword must be followed by whitespace or a colon.
static CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:close[sd]?|fixe[sd]|resolve[sd]?)[\s:]+$").expect("close pattern")
});

/// Commit block header: 40-hex hash, then pipe-separated fields.
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}\|").expect("header pattern"));

/// One commit plus the tracker-file diff lines needed for event
/// derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommit {
    pub commit: Commit,
    /// `+` lines of the tracker file, without the sign.
    pub tracker_added: Vec<String>,
    /// `-` lines of the tracker file, without the sign.
    pub tracker_removed: Vec<String>,
}

/// Parse a whole log dump. Returns the parsed commits (input order)
/// plus one warning per dropped commit.
#[must_use]
#[instrument(skip_all, fields(bytes = text.len()))]
pub fn parse_log(text: &str, tracker_file: &str) -> (Vec<ParsedCommit>, Vec<String>) {
    let mut commits = Vec::new();
    let mut warnings = Vec::new();

    for block in split_commits(text) {
        match parse_commit(block, tracker_file) {
            Ok(parsed) => commits.push(parsed),
            Err(err) => {
                warn!(%err, "dropping unparseable commit");
                warnings.push(format!("dropped unparseable commit: {err}"));
            }
        }
    }

    (commits, warnings)
}

/// Split the dump at header lines.
fn split_commits(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n');
        if HEADER_RE.is_match(trimmed) {
            starts.push(offset);
        }
        offset += line.len();
    }

    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        blocks.push(&text[start..end]);
    }
    blocks
}

fn parse_commit(block: &str, tracker_file: &str) -> Result<ParsedCommit> {
    let mut lines = block.lines();
    let header = lines.next().unwrap_or_default();

    let parts: Vec<&str> = header.splitn(5, '|').collect();
    if parts.len() != 5 {
        bail!("malformed header: {header:?}");
    }

    let sha = parts[0].to_string();
    let timestamp: DateTime<Utc> = parts[1]
        .parse::<DateTime<chrono::FixedOffset>>()
        .map_err(|e| anyhow::anyhow!("bad timestamp {:?}: {e}", parts[1]))?
        .with_timezone(&Utc);

    let mut files: Vec<FileChange> = Vec::new();
    let mut tracker_added = Vec::new();
    let mut tracker_removed = Vec::new();
    let mut current: Option<usize> = None;

    for line in lines {
        if let Some(rest) = line.strip_prefix("diff --git a/") {
            // `diff --git a/<path> b/<path>`: take the b-side path.
            let path = rest
                .split_once(" b/")
                .map_or(rest, |(_, b)| b)
                .to_string();
            files.push(FileChange {
                path,
                insertions: 0,
                deletions: 0,
            });
            current = Some(files.len() - 1);
            continue;
        }
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if let Some(added) = line.strip_prefix('+') {
            if let Some(i) = current {
                files[i].insertions += 1;
                if files[i].path == tracker_file {
                    tracker_added.push(added.to_string());
                }
            }
        } else if let Some(removed) = line.strip_prefix('-') {
            if let Some(i) = current {
                files[i].deletions += 1;
                if files[i].path == tracker_file {
                    tracker_removed.push(removed.to_string());
                }
            }
        }
    }

    Ok(ParsedCommit {
        commit: Commit {
            short_sha: Commit::shorten(&sha),
            sha,
            timestamp,
            author: parts[2].to_string(),
            author_email: parts[3].to_string(),
            message: parts[4].to_string(),
            files,
        },
        tracker_added,
        tracker_removed,
    })
}

/// The minimal slice of a tracker line the correlator cares about.
#[derive(Debug, Deserialize)]
struct TrackerLine {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

/// Parse one JSON-ish tracker line; malformed lines yield `None`.
fn parse_tracker_line(line: &str) -> Option<(String, Option<Status>)> {
    let parsed: TrackerLine = serde_json::from_str(line.trim()).ok()?;
    if parsed.id.is_empty() {
        return None;
    }
    let status = parsed.status.and_then(|s| s.parse().ok());
    Some((parsed.id, status))
}

/// Issue-aware correlator.
pub struct Correlator {
    /// Known issue id → (title, live status).
    known: BTreeMap<String, (String, Status)>,
}

impl Correlator {
    #[must_use]
    pub fn new(issues: &[Issue]) -> Self {
        let known = issues
            .iter()
            .filter(|issue| !issue.status.is_tombstone())
            .map(|issue| (issue.id.clone(), (issue.title.clone(), issue.status)))
            .collect();
        Self { known }
    }

    /// Correlate a fully-parsed commit list.
    #[must_use]
    #[instrument(skip_all, fields(commits = parsed.len()))]
    pub fn correlate(&self, mut parsed: Vec<ParsedCommit>) -> HistoryReport {
        // Events derive in chronological order regardless of the
        // producer's newest-first convention.
        parsed.sort_by(|a, b| {
            a.commit
                .timestamp
                .cmp(&b.commit.timestamp)
                .then_with(|| a.commit.sha.cmp(&b.commit.sha))
        });

        let mut events: Vec<BeadEvent> = Vec::new();
        // (bead, commit) → method actually used, strongest kept.
        let mut links: BTreeMap<(String, String), CorrelationMethod> = BTreeMap::new();
        let mut created_seen: BTreeSet<String> = BTreeSet::new();

        for item in &parsed {
            let commit = &item.commit;
            let mut evented_here: BTreeSet<String> = BTreeSet::new();

            // Tracker co-commit events.
            let before: BTreeMap<String, Option<Status>> = item
                .tracker_removed
                .iter()
                .filter_map(|line| parse_tracker_line(line))
                .collect();

            for line in &item.tracker_added {
                let Some((id, status)) = parse_tracker_line(line) else {
                    continue;
                };
                if !self.known.contains_key(&id) {
                    continue;
                }

                let event_type = match before.get(&id) {
                    None => EventType::Created,
                    Some(old) => determine_status_event(*old, status),
                };
                if event_type == EventType::Created {
                    created_seen.insert(id.clone());
                }

                events.push(self.event(&id, event_type, commit, CorrelationMethod::CoCommitted));
                links
                    .entry((id.clone(), commit.sha.clone()))
                    .or_insert(CorrelationMethod::CoCommitted);
                evented_here.insert(id);
            }

            // Explicit mentions in the subject line.
            for id in self.mentioned_ids(&commit.message) {
                links.insert((id.clone(), commit.sha.clone()), CorrelationMethod::ExplicitMention);
                if evented_here.contains(&id) {
                    continue;
                }

                let event_type = if mention_closes(&commit.message, &id) {
                    EventType::Closed
                } else if created_seen.insert(id.clone()) {
                    EventType::Created
                } else {
                    EventType::Modified
                };

                events.push(self.event(&id, event_type, commit, CorrelationMethod::ExplicitMention));
            }
        }

        self.assemble(parsed, events, links)
    }

    /// Correlate a producer stream. On a mid-stream error, everything
    /// parsed so far is retained and returned alongside the error.
    pub fn correlate_stream<I>(&self, stream: I) -> (HistoryReport, Option<anyhow::Error>)
    where
        I: IntoIterator<Item = Result<ParsedCommit>>,
    {
        let mut parsed = Vec::new();
        let mut failure = None;

        for item in stream {
            match item {
                Ok(commit) => parsed.push(commit),
                Err(err) => {
                    warn!(%err, retained = parsed.len(), "commit stream failed mid-read");
                    failure = Some(err);
                    break;
                }
            }
        }

        (self.correlate(parsed), failure)
    }

    fn event(
        &self,
        id: &str,
        event_type: EventType,
        commit: &Commit,
        method: CorrelationMethod,
    ) -> BeadEvent {
        BeadEvent {
            bead_id: id.to_string(),
            event_type,
            timestamp: commit.timestamp,
            commit_sha: commit.sha.clone(),
            commit_message: commit.message.clone(),
            author: commit.author.clone(),
            confidence: method.confidence(),
            method,
        }
    }

    /// Known issue ids named in a message: canonical-shape matches
    /// checked against the corpus, plus exact containment for ids the
    /// shape misses.
    fn mentioned_ids(&self, message: &str) -> Vec<String> {
        let mut found: BTreeSet<String> = ID_RE
            .find_iter(message)
            .map(|m| m.as_str().to_string())
            .filter(|candidate| self.known.contains_key(candidate))
            .collect();

        for id in self.known.keys() {
            if !found.contains(id) && !ID_RE.is_match(id) && message.contains(id.as_str()) {
                found.insert(id.clone());
            }
        }

        found.into_iter().collect()
    }

    fn assemble(
        &self,
        parsed: Vec<ParsedCommit>,
        mut events: Vec<BeadEvent>,
        links: BTreeMap<(String, String), CorrelationMethod>,
    ) -> HistoryReport {
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.commit_sha.cmp(&b.commit_sha))
                .then_with(|| a.bead_id.cmp(&b.bead_id))
        });

        let commit_by_sha: BTreeMap<&str, &Commit> = parsed
            .iter()
            .map(|p| (p.commit.sha.as_str(), &p.commit))
            .collect();

        let mut histories: BTreeMap<String, BeadHistory> = self
            .known
            .iter()
            .map(|(id, (title, status))| {
                (
                    id.clone(),
                    BeadHistory {
                        bead_id: id.clone(),
                        title: title.clone(),
                        status: *status,
                        events: Vec::new(),
                        commits: Vec::new(),
                        milestones: crate::history::BeadMilestones::default(),
                        cycle_time: None,
                    },
                )
            })
            .collect();

        for event in &events {
            if let Some(history) = histories.get_mut(&event.bead_id) {
                history.events.push(event.clone());
            }
        }

        let mut commit_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut method_distribution: BTreeMap<String, usize> = BTreeMap::new();

        for ((bead_id, sha), method) in &links {
            let Some(commit) = commit_by_sha.get(sha.as_str()) else {
                continue;
            };
            if let Some(history) = histories.get_mut(bead_id) {
                history.commits.push(CorrelatedCommit {
                    commit: (*commit).clone(),
                    confidence: method.confidence(),
                    method: *method,
                });
            }
            commit_index.entry(sha.clone()).or_default().push(bead_id.clone());
            *method_distribution.entry(method.as_str().to_string()).or_default() += 1;
        }

        for ids in commit_index.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        let mut beads_with_commits = 0;
        for history in histories.values_mut() {
            history.commits.sort_by(|a, b| {
                a.commit
                    .timestamp
                    .cmp(&b.commit.timestamp)
                    .then_with(|| a.commit.sha.cmp(&b.commit.sha))
            });
            history.milestones = bead_milestones(&history.events);
            history.cycle_time = cycle_time(&history.milestones);
            if !history.commits.is_empty() {
                beads_with_commits += 1;
            }
        }

        let commits: Vec<Commit> = parsed.into_iter().map(|p| p.commit).collect();

        HistoryReport {
            stats: HistoryStats {
                total_beads: histories.len(),
                beads_with_commits,
                method_distribution,
            },
            histories,
            commit_index,
            events,
            commits,
        }
    }
}

/// Map a before/after status pair onto an event.
fn determine_status_event(old: Option<Status>, new: Option<Status>) -> EventType {
    match (old, new) {
        (_, Some(Status::Closed)) => EventType::Closed,
        (Some(Status::Closed), Some(Status::InProgress)) => EventType::Claimed,
        (Some(Status::Closed), Some(Status::Open)) => EventType::Reopened,
        (_, Some(Status::InProgress)) => EventType::Claimed,
        _ => EventType::Modified,
    }
}

/// True when the id occurrence is preceded by a closing keyword.
fn mention_closes(message: &str, id: &str) -> bool {
    let mut search_from = 0;
    while let Some(pos) = message[search_from..].find(id) {
        let abs = search_from + pos;
        let window_start = abs.saturating_sub(16);
        if CLOSE_RE.is_match(&message[window_start..abs]) {
            return true;
        }
        search_from = abs + id.len();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues(ids: &[&str]) -> Vec<Issue> {
        ids.iter()
            .map(|id| Issue::new(*id, format!("issue {id}")))
            .collect()
    }

    const SHA1: &str = "abc123def456789012345678901234567890abcd";
    const SHA2: &str = "def456789012345678901234567890abcdef1234";

    fn tracker_log() -> String {
        format!(
            "{SHA1}|2025-01-15T10:00:00Z|Alice|alice@example.com|First commit\n\
             diff --git a/.braid/issues.jsonl b/.braid/issues.jsonl\n\
             --- a/.braid/issues.jsonl\n\
             +++ b/.braid/issues.jsonl\n\
             +{{\"id\":\"bv-001\",\"title\":\"First bead\",\"status\":\"open\"}}\n\
             {SHA2}|2025-01-16T11:00:00Z|Bob|bob@example.com|Second commit\n\
             diff --git a/.braid/issues.jsonl b/.braid/issues.jsonl\n\
             --- a/.braid/issues.jsonl\n\
             +++ b/.braid/issues.jsonl\n\
             -{{\"id\":\"bv-001\",\"title\":\"First bead\",\"status\":\"open\"}}\n\
             +{{\"id\":\"bv-001\",\"title\":\"First bead\",\"status\":\"in_progress\"}}\n"
        )
    }

    #[test]
    fn split_finds_both_commits() {
        let log = tracker_log();
        let blocks = split_commits(&log);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with(SHA1));
        assert!(blocks[1].starts_with(SHA2));
    }

    #[test]
    fn header_fields_parse() {
        let log = tracker_log();
        let (commits, warnings) = parse_log(&log, DEFAULT_TRACKER_FILE);
        assert!(warnings.is_empty());
        assert_eq!(commits.len(), 2);

        let first = &commits[0].commit;
        assert_eq!(first.sha, SHA1);
        assert_eq!(first.short_sha, "abc123d");
        assert_eq!(first.author, "Alice");
        assert_eq!(first.author_email, "alice@example.com");
        assert_eq!(first.message, "First commit");
        assert_eq!(
            first.timestamp,
            "2025-01-15T10:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn malformed_headers_are_dropped_with_warnings() {
        for bad in [
            "abc123|2025-01-15\n",
            "abc123def456789012345678901234567890abcd|not-a-date|author|email|msg\n",
        ] {
            let (commits, warnings) = parse_log(bad, DEFAULT_TRACKER_FILE);
            assert!(commits.is_empty(), "should drop {bad:?}");
            assert!(warnings.len() <= 1);
        }
    }

    #[test]
    fn diff_counts_insertions_and_deletions() {
        let log = tracker_log();
        let (commits, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let second = &commits[1];
        assert_eq!(second.commit.files.len(), 1);
        assert_eq!(second.commit.files[0].insertions, 1);
        assert_eq!(second.commit.files[0].deletions, 1);
        assert_eq!(second.tracker_added.len(), 1);
        assert_eq!(second.tracker_removed.len(), 1);
    }

    #[test]
    fn tracker_diff_derives_created_then_claimed() {
        let log = tracker_log();
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&issues(&["bv-001"])).correlate(parsed);

        let history = &report.histories["bv-001"];
        assert_eq!(history.events.len(), 2);
        assert_eq!(history.events[0].event_type, EventType::Created);
        assert_eq!(history.events[1].event_type, EventType::Claimed);
        assert_eq!(history.events[0].method, CorrelationMethod::CoCommitted);
        assert!(history.milestones.created.is_some());
        assert!(history.milestones.claimed.is_some());
    }

    #[test]
    fn status_event_table() {
        use Status::{Blocked, Closed, InProgress, Open};
        let cases = [
            (Open, InProgress, EventType::Claimed),
            (InProgress, Closed, EventType::Closed),
            (Open, Closed, EventType::Closed),
            (Closed, Open, EventType::Reopened),
            (Closed, InProgress, EventType::Claimed),
            (Open, Blocked, EventType::Modified),
            (InProgress, Open, EventType::Modified),
        ];
        for (old, new, expected) in cases {
            assert_eq!(
                determine_status_event(Some(old), Some(new)),
                expected,
                "{old:?} -> {new:?}"
            );
        }
    }

    #[test]
    fn malformed_json_lines_are_skipped() {
        let log = format!(
            "{SHA1}|2025-01-15T10:00:00Z|A|a@x.com|seed\n\
             diff --git a/.braid/issues.jsonl b/.braid/issues.jsonl\n\
             +{{\"id\":\"bv-good\",\"status\":\"open\"}}\n\
             +{{malformed json here}}\n\
             +{{\"id\":\"bv-also\",\"status\":\"open\"}}\n"
        );
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&issues(&["bv-good", "bv-also"])).correlate(parsed);

        assert_eq!(report.histories["bv-good"].events.len(), 1);
        assert_eq!(report.histories["bv-also"].events.len(), 1);
    }

    #[test]
    fn explicit_mentions_create_and_close() {
        // Spec scenario: C1 "feat(X-1): seed"; C2 "fix(X-2): close X-1".
        let log = format!(
            "{SHA2}|2025-01-16T11:00:00Z|B|b@x.com|fix(X-2): close X-1\n\
             {SHA1}|2025-01-15T10:00:00Z|A|a@x.com|feat(X-1): seed\n"
        );
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&issues(&["X-1", "X-2"])).correlate(parsed);

        let x1 = &report.histories["X-1"];
        assert_eq!(x1.events.len(), 2);
        assert_eq!(x1.events[0].event_type, EventType::Created);
        assert_eq!(x1.events[0].commit_sha, SHA1);
        assert_eq!(x1.events[1].event_type, EventType::Closed);
        assert_eq!(x1.events[1].commit_sha, SHA2);

        let x2 = &report.histories["X-2"];
        assert_eq!(x2.events.len(), 1);
        assert_eq!(x2.events[0].event_type, EventType::Created);
        assert_eq!(x2.events[0].commit_sha, SHA2);

        assert_eq!(report.commit_index[SHA2], vec!["X-1", "X-2"]);
        assert_eq!(
            report.stats.method_distribution["explicit_mention"],
            3
        );
    }

    #[test]
    fn unknown_ids_are_not_correlated() {
        let log = format!("{SHA1}|2025-01-15T10:00:00Z|A|a@x.com|feat(GHOST-1): spooky\n");
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&issues(&["bv-001"])).correlate(parsed);
        assert!(report.commit_index.is_empty());
        assert!(report.histories["bv-001"].events.is_empty());
    }

    #[test]
    fn mention_and_cocommit_keep_strongest_method() {
        let log = format!(
            "{SHA1}|2025-01-15T10:00:00Z|A|a@x.com|feat(bv-001): seed\n\
             diff --git a/.braid/issues.jsonl b/.braid/issues.jsonl\n\
             +{{\"id\":\"bv-001\",\"status\":\"open\"}}\n"
        );
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&issues(&["bv-001"])).correlate(parsed);

        let history = &report.histories["bv-001"];
        assert_eq!(history.commits.len(), 1);
        assert_eq!(history.commits[0].method, CorrelationMethod::ExplicitMention);
        // One event only: the tracker diff already explained the change.
        assert_eq!(history.events.len(), 1);
    }

    #[test]
    fn stream_error_retains_parsed_prefix() {
        let log = tracker_log();
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let stream: Vec<Result<ParsedCommit>> = vec![
            Ok(parsed[0].clone()),
            Err(anyhow::anyhow!("producer exploded")),
            Ok(parsed[1].clone()),
        ];

        let correlator = Correlator::new(&issues(&["bv-001"]));
        let (report, err) = correlator.correlate_stream(stream);
        assert!(err.is_some());
        assert_eq!(report.commits.len(), 1);
        assert_eq!(report.histories["bv-001"].events.len(), 1);
    }

    #[test]
    fn empty_stream_returns_normally() {
        let report = Correlator::new(&issues(&["bv-001"])).correlate(Vec::new());
        assert!(report.commit_index.is_empty());
        assert!(report.commits.is_empty());
        assert_eq!(report.stats.total_beads, 1);
        assert_eq!(report.stats.beads_with_commits, 0);
    }

    #[test]
    fn events_order_by_timestamp_then_sha() {
        let log = format!(
            "{SHA2}|2025-01-15T10:00:00Z|B|b@x.com|touch bv-001 again\n\
             {SHA1}|2025-01-15T10:00:00Z|A|a@x.com|feat bv-001 start\n"
        );
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&issues(&["bv-001"])).correlate(parsed);

        let events = &report.histories["bv-001"].events;
        assert_eq!(events.len(), 2);
        // Equal timestamps: sha ascending.
        assert_eq!(events[0].commit_sha, SHA1);
        assert_eq!(events[1].commit_sha, SHA2);
    }

    #[test]
    fn tombstones_never_enter_the_report() {
        let mut tomb = Issue::new("bv-dead", "gone");
        tomb.status = Status::Tombstone;
        let log = format!("{SHA1}|2025-01-15T10:00:00Z|A|a@x.com|feat(bv-dead): zombie\n");
        let (parsed, _) = parse_log(&log, DEFAULT_TRACKER_FILE);
        let report = Correlator::new(&[tomb]).correlate(parsed);
        assert!(report.histories.is_empty());
        assert!(report.commit_index.is_empty());
    }
}
