//! Pure, total normalizers mapping raw issue attributes into `[0, 1]`
//! ranking components.
//!
//! These feed both the triage composite and the hybrid search scorer,
//! so the tables here are the single source of truth for how much each
//! raw signal is worth.

use braid_core::model::Status;
use chrono::{DateTime, Utc};

/// Map status to `[0, 1]`, favoring actionable states.
#[must_use]
pub fn normalize_status(status: Status) -> f64 {
    match status {
        Status::Open => 1.0,
        Status::InProgress => 0.8,
        Status::Blocked => 0.5,
        Status::Closed => 0.1,
        Status::Tombstone => 0.0,
        Status::Deferred | Status::Pinned => 0.5,
    }
}

/// Map P0–P4 to `[0.2, 1.0]`; out-of-range priorities score 0.5.
#[must_use]
pub fn normalize_priority(priority: u8) -> f64 {
    match priority {
        0 => 1.0,
        1 => 0.8,
        2 => 0.6,
        3 => 0.4,
        4 => 0.2,
        _ => 0.5,
    }
}

/// Normalize a blocker count against the corpus maximum.
///
/// A corpus with no blockers at all scores everything 0.5; zero blockers
/// in a corpus that has some scores 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_impact(blocker_count: usize, max_blocker_count: usize) -> f64 {
    if max_blocker_count == 0 {
        return 0.5;
    }
    if blocker_count == 0 {
        return 0.0;
    }
    if blocker_count >= max_blocker_count {
        return 1.0;
    }
    blocker_count as f64 / max_blocker_count as f64
}

/// Exponential recency decay with a ~30-day half-life shape.
///
/// Missing timestamps score the neutral 0.5; future timestamps clamp
/// to 1.0.
#[must_use]
pub fn normalize_recency(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(updated_at) = updated_at else {
        return 0.5;
    };
    let days_since = (now - updated_at).num_seconds() as f64 / 86_400.0;
    if days_since < 0.0 {
        return 1.0;
    }
    (-days_since / 30.0).exp().min(1.0)
}
