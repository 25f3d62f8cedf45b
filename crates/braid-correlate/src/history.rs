//! Per-issue change histories derived from the commit stream.
//!
//! A [`BeadEvent`] records one observation that a commit altered an
//! issue; a [`BeadHistory`] collects an issue's events, correlated
//! commits, and derived milestones. The global [`HistoryReport`] adds
//! the commit→issues index and correlation statistics.

use std::collections::BTreeMap;

use braid_core::model::{Commit, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a commit did to an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Claimed,
    Closed,
    Reopened,
    Modified,
}

impl EventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Claimed => "claimed",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Modified => "modified",
        }
    }
}

/// How a commit↔issue association was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// The commit message names the issue id. Confidence 1.0.
    ExplicitMention,
    /// The commit modifies the tracker file and the diff carries the
    /// issue's record. Confidence 0.9.
    CoCommitted,
    /// Weak association through shared files; suggestion-only, capped
    /// at 0.5 and never a history event on its own.
    SharedFile,
}

impl CorrelationMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExplicitMention => "explicit_mention",
            Self::CoCommitted => "co_committed",
            Self::SharedFile => "shared_file",
        }
    }

    #[must_use]
    pub const fn confidence(self) -> f64 {
        match self {
            Self::ExplicitMention => 1.0,
            Self::CoCommitted => 0.9,
            Self::SharedFile => 0.5,
        }
    }
}

/// One observation that a commit altered an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeadEvent {
    pub bead_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub commit_sha: String,
    pub commit_message: String,
    pub author: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub method: CorrelationMethod,
}

/// A commit attached to one issue's history, with the association
/// strength that put it there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedCommit {
    #[serde(flatten)]
    pub commit: Commit,
    pub confidence: f64,
    pub method: CorrelationMethod,
}

/// First/last occurrences of the lifecycle events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeadMilestones {
    /// Earliest created event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<BeadEvent>,
    /// Earliest claimed event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed: Option<BeadEvent>,
    /// Most recent closed event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<BeadEvent>,
    /// Most recent reopened event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopened: Option<BeadEvent>,
}

/// Interval components of an issue's lifecycle, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_to_claim_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_to_close_secs: Option<i64>,
    pub create_to_close_secs: i64,
}

/// Everything the correlator knows about one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeadHistory {
    pub bead_id: String,
    pub title: String,
    pub status: Status,
    /// Commit-timestamp ascending, ties by sha ascending.
    pub events: Vec<BeadEvent>,
    pub commits: Vec<CorrelatedCommit>,
    pub milestones: BeadMilestones,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_time: Option<CycleTime>,
}

/// Aggregate statistics over a history report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_beads: usize,
    pub beads_with_commits: usize,
    /// Correlation method name → count of correlated commits.
    pub method_distribution: BTreeMap<String, usize>,
}

/// The full correlation output for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub histories: BTreeMap<String, BeadHistory>,
    /// Commit sha → sorted issue ids whose histories reference it.
    pub commit_index: BTreeMap<String, Vec<String>>,
    /// Global event log, commit-timestamp ascending.
    pub events: Vec<BeadEvent>,
    /// Every commit parsed from the stream, timestamp ascending.
    pub commits: Vec<Commit>,
    pub stats: HistoryStats,
}

/// Reverse an event list in place for newest-first presentation.
pub fn reverse_events(events: &mut [BeadEvent]) {
    events.reverse();
}

/// Derive milestones from an issue's ascending event list.
#[must_use]
pub fn bead_milestones(events: &[BeadEvent]) -> BeadMilestones {
    let mut milestones = BeadMilestones::default();

    for event in events {
        match event.event_type {
            EventType::Created => {
                if milestones.created.is_none() {
                    milestones.created = Some(event.clone());
                }
            }
            EventType::Claimed => {
                if milestones.claimed.is_none() {
                    milestones.claimed = Some(event.clone());
                }
            }
            EventType::Closed => milestones.closed = Some(event.clone()),
            EventType::Reopened => milestones.reopened = Some(event.clone()),
            EventType::Modified => {}
        }
    }

    milestones
}

/// Cycle time is defined only when created and closed both exist.
#[must_use]
pub fn cycle_time(milestones: &BeadMilestones) -> Option<CycleTime> {
    let created = milestones.created.as_ref()?;
    let closed = milestones.closed.as_ref()?;

    let claim = milestones.claimed.as_ref();
    Some(CycleTime {
        create_to_claim_secs: claim
            .map(|c| (c.timestamp - created.timestamp).num_seconds()),
        claim_to_close_secs: claim.map(|c| (closed.timestamp - c.timestamp).num_seconds()),
        create_to_close_secs: (closed.timestamp - created.timestamp).num_seconds(),
    })
}
