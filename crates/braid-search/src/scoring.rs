//! Hybrid weighted scoring: fuse an externally-computed text-relevance
//! score with the normalized metric components under a weighted preset.
//!
//! The rank-by score is `Σ w_i · c_i` over
//! `{text, pagerank, status, impact, priority, recency}`. Each result
//! carries its per-component values so downstream consumers can
//! reproduce the composite. If all weights are zero the scorer falls
//! back to text-only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Weight map over the six scoring components. Presets and explicit
/// overrides are both normalized to sum 1.0 before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriageWeights {
    pub text: f64,
    pub pagerank: f64,
    pub status: f64,
    pub impact: f64,
    pub priority: f64,
    pub recency: f64,
}

impl Default for TriageWeights {
    fn default() -> Self {
        Self::preset("default").unwrap_or(Self {
            text: 0.30,
            pagerank: 0.15,
            status: 0.15,
            impact: 0.15,
            priority: 0.10,
            recency: 0.15,
        })
    }
}

impl TriageWeights {
    /// Look up a named preset.
    ///
    /// - `default`: near-equal weighting with a text emphasis.
    /// - `impact-first`: over-weights PageRank and blocker impact.
    /// - `sprint-planning`: over-weights status and priority.
    /// - `bug-hunting`: over-weights recency (with text for symptoms).
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        let weights = match name {
            "default" => Self {
                text: 0.30,
                pagerank: 0.15,
                status: 0.15,
                impact: 0.15,
                priority: 0.10,
                recency: 0.15,
            },
            "impact-first" => Self {
                text: 0.15,
                pagerank: 0.30,
                status: 0.10,
                impact: 0.30,
                priority: 0.05,
                recency: 0.10,
            },
            "sprint-planning" => Self {
                text: 0.10,
                pagerank: 0.10,
                status: 0.30,
                impact: 0.10,
                priority: 0.30,
                recency: 0.10,
            },
            "bug-hunting" => Self {
                text: 0.20,
                pagerank: 0.05,
                status: 0.15,
                impact: 0.05,
                priority: 0.15,
                recency: 0.40,
            },
            _ => return None,
        };
        Some(weights)
    }

    /// Build weights from a literal `{component: weight}` map, as
    /// supplied by a user override. Unknown components are ignored;
    /// missing components default to zero.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, f64>) -> Self {
        let get = |key: &str| map.get(key).copied().unwrap_or(0.0);
        Self {
            text: get("text"),
            pagerank: get("pagerank"),
            status: get("status"),
            impact: get("impact"),
            priority: get("priority"),
            recency: get("recency"),
        }
    }

    /// Scale so the weights sum to 1.0. A zero (or non-finite) sum is
    /// left untouched — the scorer treats it as text-only fallback.
    #[must_use]
    pub fn normalized(self) -> Self {
        let sum = self.sum();
        if !sum.is_finite() || sum.abs() <= f64::EPSILON {
            return self;
        }
        Self {
            text: self.text / sum,
            pagerank: self.pagerank / sum,
            status: self.status / sum,
            impact: self.impact / sum,
            priority: self.priority / sum,
            recency: self.recency / sum,
        }
    }

    #[must_use]
    pub fn sum(self) -> f64 {
        self.text + self.pagerank + self.status + self.impact + self.priority + self.recency
    }
}

/// Normalized component values for one issue, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub text: f64,
    pub pagerank: f64,
    pub status: f64,
    pub impact: f64,
    pub priority: f64,
    pub recency: f64,
}

/// One scored issue with its breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridScore {
    pub issue_id: String,
    pub score: f64,
    pub components: ScoreComponents,
}

/// Compute the composite score for one issue.
///
/// Components outside `[0, 1]` are clamped first. When every weight is
/// zero the text component alone is returned.
#[must_use]
pub fn hybrid_score(components: ScoreComponents, weights: TriageWeights) -> f64 {
    let c = ScoreComponents {
        text: clamp_unit(components.text),
        pagerank: clamp_unit(components.pagerank),
        status: clamp_unit(components.status),
        impact: clamp_unit(components.impact),
        priority: clamp_unit(components.priority),
        recency: clamp_unit(components.recency),
    };

    if weights.sum().abs() <= f64::EPSILON {
        return c.text;
    }

    let w = weights.normalized();
    w.text * c.text
        + w.pagerank * c.pagerank
        + w.status * c.status
        + w.impact * c.impact
        + w.priority * c.priority
        + w.recency * c.recency
}

/// Score and rank a batch of issues: score descending, id ascending on
/// ties.
#[must_use]
pub fn rank(
    entries: Vec<(String, ScoreComponents)>,
    weights: TriageWeights,
) -> Vec<HybridScore> {
    let mut scored: Vec<HybridScore> = entries
        .into_iter()
        .map(|(issue_id, components)| HybridScore {
            issue_id,
            score: hybrid_score(components, weights),
            components,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.issue_id.cmp(&b.issue_id))
    });

    scored
}

fn clamp_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
