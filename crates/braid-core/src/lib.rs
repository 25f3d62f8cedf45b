#![forbid(unsafe_code)]
//! braid-core: data model, configuration, and output envelope.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` for fallible seams; fatal failures
//!   carry an [`error::ErrorCode`].
//! - **Logging**: `tracing` macros.
//! - **Determinism**: output-facing maps are `BTreeMap`; everything that
//!   affects output iterates in a sorted order.

pub mod config;
pub mod envelope;
pub mod error;
pub mod model;

pub use config::{AlertConfig, BetweennessMode, EngineConfig};
pub use envelope::{data_hash, Envelope, MetricState, MetricStatus};
pub use error::{EngineError, ErrorCode};
