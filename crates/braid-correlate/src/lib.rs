#![forbid(unsafe_code)]
//! braid-correlate: commit↔issue correlation, file indices, co-change
//! analysis, related-work discovery, and orphan detection.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result`; recoverable parse problems degrade to
//!   warnings, a producer failure mid-stream keeps the parsed prefix.
//! - **Logging**: `tracing` macros.
//! - **Determinism**: output maps are `BTreeMap`; sample selections scan
//!   in sorted-sha order.

pub mod cochange;
pub mod extract;
pub mod file_index;
pub mod history;
pub mod orphans;
pub mod related;
pub mod report;

pub use extract::{parse_log, Correlator, ParsedCommit, DEFAULT_TRACKER_FILE};
pub use file_index::{FileBeadIndex, FileLookup, ImpactResult};
pub use history::{BeadEvent, BeadHistory, CorrelationMethod, EventType, HistoryReport};
