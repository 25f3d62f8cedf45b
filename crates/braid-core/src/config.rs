//! Per-invocation engine configuration.
//!
//! One immutable [`EngineConfig`] covers the Phase-2 budget, the
//! betweenness mode, hybrid-search weighting, and every alert threshold.
//! Recognized fields form a closed set: parsing warns about unknown
//! top-level keys and ignores them rather than failing.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// How betweenness centrality should be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetweennessMode {
    /// Brandes' algorithm from every source: O(V·E).
    Exact,
    /// Single-source Brandes' from k sampled pivots, scaled by V/k.
    Approximate,
    /// Metric omitted; status marked skipped.
    Skip,
}

impl Default for BetweennessMode {
    fn default() -> Self {
        Self::Exact
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overall budget for the concurrent metric phase.
    pub phase2_budget_ms: u64,
    pub betweenness: BetweennessMode,
    /// Pivot count for approximate betweenness; `None` uses the
    /// size recommended for the graph's node count.
    pub betweenness_sample_size: Option<usize>,
    /// Seed for pivot sampling. Fixed by default so repeated runs on the
    /// same input produce the same approximation.
    pub approx_seed: u64,
    /// Named hybrid-search preset. Ignored when `search_weights` is set.
    pub search_preset: String,
    /// Explicit weight override `{text, pagerank, status, impact,
    /// priority, recency}`; normalized to sum 1.0 when non-zero.
    pub search_weights: Option<BTreeMap<String, f64>>,
    pub alerts: AlertConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            phase2_budget_ms: 500,
            betweenness: BetweennessMode::default(),
            betweenness_sample_size: None,
            approx_seed: 42,
            search_preset: "default".to_string(),
            search_weights: None,
            alerts: AlertConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document, warning about (and ignoring) unknown
    /// top-level keys.
    pub fn from_toml_str(content: &str) -> Result<(Self, Vec<String>)> {
        let value: toml::Value = content.parse().context("parse engine config")?;

        let mut warnings = Vec::new();
        if let Some(table) = value.as_table() {
            for key in table.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    warnings.push(format!("unknown config field ignored: {key}"));
                }
            }
        }

        let config: Self = value.try_into().context("decode engine config")?;
        config.alerts.validate()?;
        Ok((config, warnings))
    }
}

const KNOWN_KEYS: &[&str] = &[
    "phase2_budget_ms",
    "betweenness",
    "betweenness_sample_size",
    "approx_seed",
    "search_preset",
    "search_weights",
    "alerts",
];

/// Per-label staleness overrides. The tightest (smallest) thresholds
/// across an issue's labels win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOverride {
    pub stale_warning_days: Option<i64>,
    pub stale_critical_days: Option<i64>,
    pub in_progress_stale_multiplier: Option<f64>,
}

/// Alert thresholds. Percentage fields are relative to baseline values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub stale_warning_days: i64,
    pub stale_critical_days: i64,
    /// < 1.0 tightens thresholds for in-progress items.
    pub in_progress_stale_multiplier: f64,
    pub blocking_cascade_info_threshold: usize,
    pub blocking_cascade_warning_threshold: usize,
    pub density_info_pct: f64,
    pub density_warning_pct: f64,
    pub node_growth_info_pct: f64,
    pub edge_growth_info_pct: f64,
    pub pagerank_change_warning_pct: f64,
    pub actionable_decrease_warning_pct: f64,
    pub actionable_increase_info_pct: f64,
    pub blocked_increase_threshold: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_alerts: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub label_overrides: BTreeMap<String, LabelOverride>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            stale_warning_days: 14,
            stale_critical_days: 30,
            in_progress_stale_multiplier: 0.5,
            blocking_cascade_info_threshold: 3,
            blocking_cascade_warning_threshold: 5,
            density_info_pct: 20.0,
            density_warning_pct: 50.0,
            node_growth_info_pct: 25.0,
            edge_growth_info_pct: 25.0,
            pagerank_change_warning_pct: 50.0,
            actionable_decrease_warning_pct: 30.0,
            actionable_increase_info_pct: 20.0,
            blocked_increase_threshold: 5,
            disabled_alerts: Vec::new(),
            label_overrides: BTreeMap::new(),
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stale_warning_days <= 0 || self.stale_critical_days <= 0 {
            bail!("stale_warning_days and stale_critical_days must be positive");
        }
        if self.stale_critical_days < self.stale_warning_days {
            bail!("stale_critical_days must be >= stale_warning_days");
        }
        if self.in_progress_stale_multiplier <= 0.0 || self.in_progress_stale_multiplier > 5.0 {
            bail!("in_progress_stale_multiplier must be in (0, 5]");
        }
        if self.blocking_cascade_warning_threshold < self.blocking_cascade_info_threshold {
            bail!("blocking_cascade_warning_threshold must be >= info threshold");
        }
        if self.density_info_pct < 0.0 || self.density_info_pct > self.density_warning_pct {
            bail!("density_info_pct must be between 0 and density_warning_pct");
        }
        for (label, lo) in &self.label_overrides {
            if let (Some(warn), Some(crit)) = (lo.stale_warning_days, lo.stale_critical_days) {
                if crit < warn {
                    bail!("label {label}: stale_critical_days must be >= stale_warning_days");
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_alert_disabled(&self, alert_type: &str) -> bool {
        self.disabled_alerts.iter().any(|d| d == alert_type)
    }

    /// Effective staleness thresholds for an issue given its labels:
    /// `(warn_days, critical_days, in_progress_multiplier)`, tightest
    /// override winning.
    #[must_use]
    pub fn staleness_thresholds(&self, labels: &[String]) -> (i64, i64, f64) {
        let mut warn = self.stale_warning_days;
        let mut crit = self.stale_critical_days;
        let mut mult = self.in_progress_stale_multiplier;

        for label in labels {
            let Some(lo) = self.label_overrides.get(label) else {
                continue;
            };
            if let Some(w) = lo.stale_warning_days {
                if w > 0 && w < warn {
                    warn = w;
                }
            }
            if let Some(c) = lo.stale_critical_days {
                if c > 0 && c < crit {
                    crit = c;
                }
            }
            if let Some(m) = lo.in_progress_stale_multiplier {
                if m > 0.0 && m < mult {
                    mult = m;
                }
            }
        }

        (warn, crit, mult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.phase2_budget_ms, 500);
        assert_eq!(config.betweenness, BetweennessMode::Exact);
        assert_eq!(config.alerts.stale_warning_days, 14);
        assert_eq!(config.alerts.stale_critical_days, 30);
        assert!((config.alerts.in_progress_stale_multiplier - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.alerts.blocking_cascade_info_threshold, 3);
        assert_eq!(config.alerts.blocking_cascade_warning_threshold, 5);
    }

    #[test]
    fn unknown_keys_warn_but_do_not_fail() {
        let (config, warnings) =
            EngineConfig::from_toml_str("phase2_budget_ms = 250\nfrobnicate = true\n").unwrap();
        assert_eq!(config.phase2_budget_ms, 250);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("frobnicate"));
    }

    #[test]
    fn invalid_thresholds_rejected() {
        let result = EngineConfig::from_toml_str(
            "[alerts]\nstale_warning_days = 30\nstale_critical_days = 14\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn betweenness_mode_parses_snake_case() {
        let (config, _) = EngineConfig::from_toml_str("betweenness = \"approximate\"").unwrap();
        assert_eq!(config.betweenness, BetweennessMode::Approximate);
    }

    #[test]
    fn label_overrides_use_tightest_thresholds() {
        let mut config = AlertConfig::default();
        config.label_overrides.insert(
            "urgent".to_string(),
            LabelOverride {
                stale_warning_days: Some(3),
                stale_critical_days: Some(7),
                in_progress_stale_multiplier: None,
            },
        );
        config.label_overrides.insert(
            "slow".to_string(),
            LabelOverride {
                stale_warning_days: Some(60),
                stale_critical_days: Some(90),
                in_progress_stale_multiplier: None,
            },
        );

        let (warn, crit, mult) =
            config.staleness_thresholds(&["urgent".to_string(), "slow".to_string()]);
        assert_eq!(warn, 3);
        assert_eq!(crit, 7);
        assert!((mult - 0.5).abs() < f64::EPSILON);

        let (warn, crit, _) = config.staleness_thresholds(&["unlabelled".to_string()]);
        assert_eq!(warn, 14);
        assert_eq!(crit, 30);
    }

    #[test]
    fn disabled_alerts_checked_by_name() {
        let config = AlertConfig {
            disabled_alerts: vec!["stale_issue".to_string()],
            ..AlertConfig::default()
        };
        assert!(config.is_alert_disabled("stale_issue"));
        assert!(!config.is_alert_disabled("blocking_cascade"));
    }
}
