#![forbid(unsafe_code)]
//! braid-triage: dependency-graph metrics, two-phase scheduling, and
//! triage for the braid engine.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` for return types.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Determinism**: any iteration that affects output happens in
//!   id-sorted order; ties break by id ascending.

pub mod alerts;
pub mod graph;
pub mod metrics;
pub mod plan;
pub mod report;
pub mod schedule;
pub mod triage;

pub use graph::IssueGraph;
pub use report::EngineRun;
pub use schedule::{analyze, GraphInsights};
