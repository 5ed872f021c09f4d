//! Run execution: wires config, synthetic feed, strategy, engine, and
//! metrics into one report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::domain::{AccountState, ClosedTrade};
use warden_core::engine::{
    run_simulation, ConstantRegime, EngagementEvent, FeedError, NullStrategy, SliceFeed, Strategy,
};

use crate::config::{ConfigError, RunConfig, StrategyConfig};
use crate::demo::BreakoutStrategy;
use crate::metrics::PerformanceMetrics;
use crate::synthetic::generate_bars;

/// Errors from executing a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Complete result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<f64>,
    pub events: Vec<EngagementEvent>,
    pub account: AccountState,
    pub bar_count: usize,
    pub config: RunConfig,
}

impl RunReport {
    /// Engagements skipped by the risk brain.
    pub fn skipped_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e.outcome,
                    warden_core::engine::EngagementOutcome::Skipped { .. }
                )
            })
            .count()
    }

    /// Engagements rejected by validation or the hard gates.
    pub fn rejected_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e.outcome,
                    warden_core::engine::EngagementOutcome::Rejected { .. }
                )
            })
            .count()
    }
}

/// Execute one run from its configuration.
pub fn execute(config: &RunConfig) -> Result<RunReport, RunError> {
    let brain = config.brain()?;
    let sim_config = config.sim_config();
    let bars = generate_bars(&config.feed);
    let mut feed = SliceFeed::new(bars);

    let mut strategy: Box<dyn Strategy> = match &config.strategy {
        StrategyConfig::Breakout {
            lookback,
            stop_pips,
            first_target_pips,
            second_target_pips,
            size,
            cooldown_bars,
        } => Box::new(BreakoutStrategy::new(
            *lookback,
            *stop_pips,
            *first_target_pips,
            *second_target_pips,
            *size,
            config.laws.pip_size,
            *cooldown_bars,
        )),
        StrategyConfig::Null => Box::new(NullStrategy),
    };

    let mut regimes = ConstantRegime(config.regime);
    let result = run_simulation(
        &mut feed,
        strategy.as_mut(),
        &mut regimes,
        &brain,
        &sim_config,
    )?;

    let metrics = PerformanceMetrics::compute(&result.equity_curve, &result.trades);
    Ok(RunReport {
        run_id: config.run_id(),
        metrics,
        trades: result.trades,
        equity_curve: result.equity_curve,
        events: result.events,
        account: result.account,
        bar_count: result.bar_count,
        config: config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_executes() {
        let report = execute(&RunConfig::default()).unwrap();
        assert_eq!(report.bar_count, 2_000);
        assert_eq!(report.equity_curve.len(), 2_000);
        assert!(!report.run_id.is_empty());
    }

    #[test]
    fn null_strategy_produces_no_trades() {
        let config = RunConfig {
            strategy: StrategyConfig::Null,
            ..RunConfig::default()
        };
        let report = execute(&config).unwrap();
        assert!(report.trades.is_empty());
        assert_eq!(report.metrics.trade_count, 0);
        assert_eq!(report.account.equity, config.initial_equity);
    }

    #[test]
    fn report_counts_split_events() {
        let report = execute(&RunConfig::default()).unwrap();
        let opened = report
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e.outcome,
                    warden_core::engine::EngagementOutcome::Opened { .. }
                )
            })
            .count();
        assert_eq!(
            opened + report.skipped_count() + report.rejected_count(),
            report.events.len()
        );
    }

    #[test]
    fn invalid_config_surfaces_error() {
        let mut config = RunConfig::default();
        config.ladder.clear();
        assert!(matches!(execute(&config), Err(RunError::Config(_))));
    }
}
