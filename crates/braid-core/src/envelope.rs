//! The common header attached to every analytical output.
//!
//! Two runs over identical input must produce byte-identical payloads
//! apart from `generated_at`, so everything here is either derived from
//! the input in a canonical order (`data_hash`) or supplied explicitly
//! by the caller (`as_of` markers).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Issue;

/// Completion state of one Phase-2 metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricState {
    /// Finished within budget.
    Computed,
    /// Finished within budget at deliberately reduced fidelity
    /// (e.g. sampled betweenness).
    Approx,
    /// Budget expired while still running; any retained result is
    /// partial or zero.
    Timeout,
    /// Precondition unmet (e.g. critical-path on a cyclic graph).
    Skipped,
}

/// Status entry for one metric: state plus elapsed wall time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricStatus {
    pub state: MetricState,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MetricStatus {
    #[must_use]
    pub fn computed(elapsed_ms: u64) -> Self {
        Self {
            state: MetricState::Computed,
            elapsed_ms,
            reason: None,
        }
    }

    #[must_use]
    pub fn approx(elapsed_ms: u64) -> Self {
        Self {
            state: MetricState::Approx,
            elapsed_ms,
            reason: None,
        }
    }

    #[must_use]
    pub fn timeout(elapsed_ms: u64) -> Self {
        Self {
            state: MetricState::Timeout,
            elapsed_ms,
            reason: None,
        }
    }

    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            state: MetricState::Skipped,
            elapsed_ms: 0,
            reason: Some(reason.into()),
        }
    }
}

/// Header carried by every top-level output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Stable fingerprint of the input issue set; identical inputs
    /// (in any order) produce identical hashes.
    pub data_hash: String,
    pub generated_at: DateTime<Utc>,
    /// Per-metric status for the Phase-2 metrics.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub status: BTreeMap<String, MetricStatus>,
    /// Recoverable problems absorbed during the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Historical revision marker when invoked against a snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of_commit: Option<String>,
}

impl Envelope {
    /// Build an envelope for the given issue set, stamped now.
    #[must_use]
    pub fn new(issues: &[Issue]) -> Self {
        Self {
            data_hash: data_hash(issues),
            generated_at: Utc::now(),
            status: BTreeMap::new(),
            warnings: Vec::new(),
            as_of: None,
            as_of_commit: None,
        }
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: BTreeMap<String, MetricStatus>) -> Self {
        self.status = status;
        self
    }

    /// Mark this output as a historical snapshot.
    #[must_use]
    pub fn as_of(mut self, revision: impl Into<String>, commit: Option<String>) -> Self {
        self.as_of = Some(revision.into());
        self.as_of_commit = commit;
        self
    }
}

/// Fingerprint of the input issue set: blake3 over ids and mutable
/// fields, iterated in id-sorted order so input permutation cannot
/// change the result. Rendered as `blake3:<hex>`.
#[must_use]
pub fn data_hash(issues: &[Issue]) -> String {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = blake3::Hasher::new();
    for issue in sorted {
        hasher.update(issue.id.as_bytes());
        hasher.update(b"\x00");
        hasher.update(issue.title.as_bytes());
        hasher.update(b"\x00");
        hasher.update(issue.status.as_str().as_bytes());
        hasher.update(b"\x00");
        hasher.update(&[issue.priority]);
        hasher.update(issue.issue_type.as_str().as_bytes());
        hasher.update(b"\x00");
        hasher.update(issue.updated_at.timestamp().to_le_bytes().as_slice());

        let mut labels = issue.labels.clone();
        labels.sort_unstable();
        for label in &labels {
            hasher.update(label.as_bytes());
            hasher.update(b"\x01");
        }

        let mut deps: Vec<(&str, &str)> = issue
            .dependencies
            .iter()
            .map(|d| (d.depends_on_id.as_str(), d.dep_type.as_str()))
            .collect();
        deps.sort_unstable();
        for (target, dep_type) in deps {
            hasher.update(target.as_bytes());
            hasher.update(b"\x02");
            hasher.update(dep_type.as_bytes());
            hasher.update(b"\x02");
        }
        hasher.update(b"\x03");
    }

    format!("blake3:{}", hasher.finalize())
}
