//! Correlation-side report payloads: `history`, `file_beads`,
//! `related`, and `orphans`, each wrapped in the shared envelope.

use std::collections::BTreeMap;

use braid_core::envelope::Envelope;
use braid_core::model::Issue;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::extract::{Correlator, ParsedCommit};
use crate::file_index::{FileBeadLookupResult, FileLookup};
use crate::history::{BeadHistory, HistoryReport, HistoryStats};
use crate::orphans::{find_orphans, OrphanReport};
use crate::related::{find_related_work, RelatedWorkOptions, RelatedWorkResult};

/// One correlation invocation: issues plus the parsed commit stream.
pub struct CorrelationRun {
    pub report: HistoryReport,
    pub envelope: Envelope,
}

impl CorrelationRun {
    /// Correlate the commits against the issue corpus.
    ///
    /// A mid-stream producer failure surfaces as a warning on the
    /// envelope; everything parsed before the failure is retained.
    #[must_use]
    #[instrument(skip_all, fields(issues = issues.len(), commits = commits.len()))]
    pub fn execute(issues: &[Issue], commits: Vec<ParsedCommit>, warnings: Vec<String>) -> Self {
        let correlator = Correlator::new(issues);
        let report = correlator.correlate(commits);

        let envelope = Envelope::new(issues).with_warnings(warnings);
        Self { report, envelope }
    }

    /// The `history` payload.
    #[must_use]
    pub fn history_payload(&self) -> HistoryPayload {
        HistoryPayload {
            envelope: self.envelope.clone(),
            histories: self.report.histories.clone(),
            commit_index: self.report.commit_index.clone(),
            stats: self.report.stats.clone(),
        }
    }

    /// The `file_beads` payload for one path, prefix, or glob pattern.
    #[must_use]
    pub fn file_beads_payload(&self, path: &str) -> FileBeadsPayload {
        let lookup = FileLookup::new(&self.report);
        let result = if path.contains(['*', '?', '[']) {
            lookup.lookup_glob(path)
        } else {
            lookup.lookup(path)
        };
        FileBeadsPayload {
            envelope: self.envelope.clone(),
            result,
        }
    }

    /// The `related` payload for one target issue; `None` when the
    /// target is unknown.
    #[must_use]
    pub fn related_payload(
        &self,
        target_id: &str,
        dependency_graph: Option<&BTreeMap<String, Vec<String>>>,
        opts: &RelatedWorkOptions,
    ) -> Option<RelatedPayload> {
        let lookup = FileLookup::new(&self.report);
        let result = find_related_work(
            &self.report,
            &lookup,
            target_id,
            dependency_graph,
            opts,
            Utc::now(),
        )?;
        Some(RelatedPayload {
            envelope: self.envelope.clone(),
            result,
        })
    }

    /// The `orphans` payload.
    #[must_use]
    pub fn orphans_payload(&self) -> OrphansPayload {
        OrphansPayload {
            envelope: self.envelope.clone(),
            report: find_orphans(&self.report, Utc::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub histories: BTreeMap<String, BeadHistory>,
    pub commit_index: BTreeMap<String, Vec<String>>,
    pub stats: HistoryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBeadsPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub result: FileBeadLookupResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub result: RelatedWorkResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphansPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub report: OrphanReport,
}
