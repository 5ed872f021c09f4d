//! Market regime labels and their sizing multipliers.
//!
//! Classification happens outside the core (indicator pipelines, detectors);
//! the risk brain only consumes the label. The label set is closed on
//! purpose: free-form detector strings normalize onto these four buckets
//! before they reach sizing.

use serde::{Deserialize, Serialize};

/// Externally derived market-condition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
    Crisis,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Regime::Trending => write!(f, "trending"),
            Regime::Ranging => write!(f, "ranging"),
            Regime::Volatile => write!(f, "volatile"),
            Regime::Crisis => write!(f, "crisis"),
        }
    }
}

/// Sizing multiplier per regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeMultipliers {
    pub trending: f64,
    pub ranging: f64,
    pub volatile: f64,
    pub crisis: f64,
}

impl Default for RegimeMultipliers {
    fn default() -> Self {
        Self {
            trending: 1.0,
            ranging: 0.8,
            volatile: 0.6,
            crisis: 0.25,
        }
    }
}

impl RegimeMultipliers {
    pub fn get(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Trending => self.trending,
            Regime::Ranging => self.ranging,
            Regime::Volatile => self.volatile,
            Regime::Crisis => self.crisis,
        }
    }
}
