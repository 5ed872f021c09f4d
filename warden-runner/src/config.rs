//! Serializable run configuration.
//!
//! A `RunConfig` captures everything needed to reproduce a run: law
//! thresholds, ladder tiers, regime table, cost model, strategy
//! parameters, and the synthetic feed seed. `run_id()` is a blake3 hash of
//! the canonical JSON encoding, so identical configs share an id and can
//! share cached results.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use warden_core::engine::{CostModel, SimConfig};
use warden_core::laws::{LawConfig, LawConfigError};
use warden_core::risk::{
    LadderError, LadderTier, Regime, RegimeMultipliers, RiskBrain, RiskLadder,
};

use crate::synthetic::SyntheticFeedConfig;

/// Configuration failures surfaced before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid ladder: {0}")]
    Ladder(#[from] LadderError),
    #[error("invalid law config: {0}")]
    Law(#[from] LawConfigError),
    #[error("initial equity {0} must be positive")]
    NonPositiveEquity(f64),
}

/// Strategy selection for a run (serializable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Long-only breakout over a rolling lookback window.
    Breakout {
        lookback: usize,
        stop_pips: f64,
        first_target_pips: f64,
        second_target_pips: f64,
        size: f64,
        cooldown_bars: usize,
    },
    /// No signals; the engine idles over the feed.
    Null,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::Breakout {
            lookback: 24,
            stop_pips: 20.0,
            first_target_pips: 30.0,
            second_target_pips: 60.0,
            size: 10_000.0,
            cooldown_bars: 12,
        }
    }
}

/// Complete, serializable configuration for one run.
///
/// Scalar fields precede the nested tables so the TOML encoding stays
/// clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub initial_equity: f64,
    /// Constant regime label applied for the whole run. Live deployments
    /// plug a real classifier into the same seam.
    pub regime: Regime,
    pub skip_floor: f64,
    pub min_reward_risk: f64,
    pub max_open_positions: usize,
    pub laws: LawConfig,
    pub regimes: RegimeMultipliers,
    pub costs: CostModel,
    pub feed: SyntheticFeedConfig,
    pub strategy: StrategyConfig,
    pub ladder: Vec<LadderTier>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_equity: 10_000.0,
            regime: Regime::Trending,
            skip_floor: 0.3,
            min_reward_risk: 0.0,
            max_open_positions: 5,
            laws: LawConfig::default(),
            regimes: RegimeMultipliers::default(),
            costs: CostModel::default(),
            feed: SyntheticFeedConfig::default(),
            strategy: StrategyConfig::default(),
            ladder: RiskLadder::conservative_default().tiers().to_vec(),
        }
    }
}

impl RunConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Validate all nested configuration and build the risk brain.
    pub fn brain(&self) -> Result<RiskBrain, ConfigError> {
        if !(self.initial_equity > 0.0) {
            return Err(ConfigError::NonPositiveEquity(self.initial_equity));
        }
        self.laws.validate()?;
        let ladder = RiskLadder::new(self.ladder.clone())?;
        let mut brain = RiskBrain::new(ladder, self.regimes, self.skip_floor);
        brain.min_reward_risk = self.min_reward_risk;
        brain.max_open_positions = self.max_open_positions;
        Ok(brain)
    }

    /// The core engine's slice of this configuration.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            initial_equity: self.initial_equity,
            laws: self.laws.clone(),
            costs: self.costs.clone(),
        }
    }

    /// Deterministic content-addressed id for this configuration.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).expect("RunConfig serialization cannot fail");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_brain() {
        let config = RunConfig::default();
        assert!(config.brain().is_ok());
    }

    #[test]
    fn run_id_is_deterministic() {
        let config = RunConfig::default();
        assert_eq!(config.run_id(), config.run_id());
        assert!(!config.run_id().is_empty());
    }

    #[test]
    fn run_id_changes_with_parameters() {
        let base = RunConfig::default();
        let mut tweaked = base.clone();
        tweaked.laws.max_stop_pips = 25.0;
        assert_ne!(base.run_id(), tweaked.run_id());
    }

    #[test]
    fn toml_roundtrip() {
        let config = RunConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: RunConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn invalid_ladder_rejected() {
        let mut config = RunConfig::default();
        config.ladder.clear();
        assert!(matches!(config.brain(), Err(ConfigError::Ladder(_))));
    }

    #[test]
    fn invalid_laws_rejected() {
        let mut config = RunConfig::default();
        config.laws.pip_size = 0.0;
        assert!(matches!(config.brain(), Err(ConfigError::Law(_))));
    }

    #[test]
    fn non_positive_equity_rejected() {
        let mut config = RunConfig::default();
        config.initial_equity = 0.0;
        assert!(matches!(
            config.brain(),
            Err(ConfigError::NonPositiveEquity(_))
        ));
    }
}
