//! Simulation driver: one full run over a bar feed.
//!
//! The driver owns the loop and nothing else: integrity-check each bar,
//! advance open positions, consult the regime source and the strategy,
//! route proposals through the lifecycle manager, snapshot equity. At feed
//! exhaustion, survivors are force-closed at the last close.
//!
//! Determinism contract: identical feed, config, and engagement sequence
//! produce an identical ledger, equity curve, and event log.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountState, Bar, CloseReason, ClosedTrade};
use crate::laws::{LawConfig, LawConfigError};
use crate::risk::RiskBrain;

use super::costs::CostModel;
use super::feed::{BarFeed, FeedError, IntegrityCheck};
use super::lifecycle::{EngagementEvent, LifecycleManager};
use super::strategy::{RegimeSource, Strategy};

/// Everything a single simulation run needs besides the feed and strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub initial_equity: f64,
    pub laws: LawConfig,
    pub costs: CostModel,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_equity: 10_000.0,
            laws: LawConfig::default(),
            costs: CostModel::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), LawConfigError> {
        self.laws.validate()
    }
}

/// Terminal output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Closed trades in close order.
    pub trades: Vec<ClosedTrade>,
    /// Mark-to-market equity, one point per bar.
    pub equity_curve: Vec<f64>,
    /// Final account state (realized equity and high-water mark).
    pub account: AccountState,
    /// Every engagement decision made during the run.
    pub events: Vec<EngagementEvent>,
    pub bar_count: usize,
}

impl RunResult {
    pub fn final_equity(&self) -> f64 {
        self.account.equity
    }
}

/// Drive one full simulation run.
///
/// Feed-integrity violations abort with the offending bar's error; every
/// other outcome (skips, rejections, law force-closes) is data in the
/// result.
pub fn run_simulation(
    feed: &mut dyn BarFeed,
    strategy: &mut dyn Strategy,
    regimes: &mut dyn RegimeSource,
    brain: &RiskBrain,
    config: &SimConfig,
) -> Result<RunResult, FeedError> {
    let mut account = AccountState::new(config.initial_equity);
    let mut lifecycle = LifecycleManager::new(config.laws.clone(), config.costs.clone());
    let mut integrity = IntegrityCheck::new();

    let mut history: Vec<Bar> = Vec::new();
    let mut trades: Vec<ClosedTrade> = Vec::new();
    let mut events: Vec<EngagementEvent> = Vec::new();
    let mut equity_curve: Vec<f64> = Vec::new();

    while let Some(bar) = feed.next_bar()? {
        integrity.admit(&bar)?;
        history.push(bar);
        let index = history.len() - 1;
        let bar = &history[index];

        // Positions opened on earlier bars advance first; a position never
        // sees fills on its entry bar.
        trades.extend(lifecycle.step(bar, &mut account));

        let regime = regimes.classify(&history, index);
        for engagement in strategy.on_bar(&history, index) {
            let outcome = lifecycle.propose(bar, &engagement, brain, regime, &mut account);
            events.push(EngagementEvent {
                bar_index: index,
                timestamp: bar.timestamp,
                direction: engagement.direction,
                entry: engagement.entry,
                outcome,
            });
        }

        equity_curve.push(account.equity + lifecycle.unrealized_pnl(bar.close));
    }

    // Explicit end-of-stream: force-close survivors at the last close.
    if let Some(last) = history.last() {
        let closed = lifecycle.force_close_all(last, CloseReason::EndOfData, &mut account);
        if !closed.is_empty() {
            trades.extend(closed);
            if let Some(point) = equity_curve.last_mut() {
                *point = account.equity;
            }
        }
    }

    Ok(RunResult {
        trades,
        equity_curve,
        account,
        events,
        bar_count: history.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, Engagement, TakeProfit};
    use crate::engine::feed::SliceFeed;
    use crate::engine::strategy::{ConstantRegime, NullStrategy, ScriptedStrategy};
    use crate::risk::{Regime, RegimeMultipliers, RiskLadder};
    use chrono::{TimeZone, Utc};

    fn bar(hour: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, hour, 0, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn flat_bars(n: u32) -> Vec<Bar> {
        (0..n).map(|h| bar(h, 1.1000, 1.1005, 1.0995, 1.1000)).collect()
    }

    fn brain() -> RiskBrain {
        RiskBrain::new(
            RiskLadder::conservative_default(),
            RegimeMultipliers::default(),
            0.3,
        )
    }

    fn frictionless_config() -> SimConfig {
        SimConfig {
            initial_equity: 10_000.0,
            laws: LawConfig::default(),
            costs: CostModel::frictionless(),
        }
    }

    fn long_engagement() -> Engagement {
        Engagement {
            direction: Direction::Long,
            entry: 1.1000,
            stop_pips: 20.0,
            take_profits: vec![TakeProfit { price: 1.1060, fraction: 1.0 }],
            size: 10_000.0,
        }
    }

    #[test]
    fn idle_run_keeps_equity_flat() {
        let mut feed = SliceFeed::new(flat_bars(10));
        let result = run_simulation(
            &mut feed,
            &mut NullStrategy,
            &mut ConstantRegime(Regime::Trending),
            &brain(),
            &frictionless_config(),
        )
        .unwrap();
        assert_eq!(result.bar_count, 10);
        assert!(result.trades.is_empty());
        assert_eq!(result.equity_curve.len(), 10);
        for point in &result.equity_curve {
            assert_eq!(*point, 10_000.0);
        }
    }

    #[test]
    fn end_of_data_closes_open_position() {
        let mut feed = SliceFeed::new(flat_bars(5));
        let mut strategy = ScriptedStrategy::new(vec![(1, long_engagement())]);
        let result = run_simulation(
            &mut feed,
            &mut strategy,
            &mut ConstantRegime(Regime::Trending),
            &brain(),
            &frictionless_config(),
        )
        .unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].reason, CloseReason::EndOfData);
        // Last equity point reflects the forced close, not the open mark.
        assert_eq!(*result.equity_curve.last().unwrap(), result.account.equity);
    }

    #[test]
    fn duplicate_timestamp_aborts_run() {
        let mut bars = flat_bars(3);
        bars[2].timestamp = bars[1].timestamp;
        let mut feed = SliceFeed::new(bars);
        let err = run_simulation(
            &mut feed,
            &mut NullStrategy,
            &mut ConstantRegime(Regime::Trending),
            &brain(),
            &frictionless_config(),
        )
        .unwrap_err();
        assert!(matches!(err, FeedError::DuplicateTimestamp(_)));
    }

    #[test]
    fn out_of_order_bar_aborts_run() {
        let mut bars = flat_bars(3);
        bars[2].timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut feed = SliceFeed::new(bars);
        let err = run_simulation(
            &mut feed,
            &mut NullStrategy,
            &mut ConstantRegime(Regime::Trending),
            &brain(),
            &frictionless_config(),
        )
        .unwrap_err();
        assert!(matches!(err, FeedError::OutOfOrder { .. }));
    }

    #[test]
    fn engagement_events_are_recorded() {
        let mut feed = SliceFeed::new(flat_bars(5));
        let mut wide = long_engagement();
        wide.stop_pips = 100.0; // past the 40 pip default ceiling
        let mut strategy = ScriptedStrategy::new(vec![(1, long_engagement()), (2, wide)]);
        let result = run_simulation(
            &mut feed,
            &mut strategy,
            &mut ConstantRegime(Regime::Trending),
            &brain(),
            &frictionless_config(),
        )
        .unwrap();
        assert_eq!(result.events.len(), 2);
        assert!(matches!(
            result.events[0].outcome,
            crate::engine::lifecycle::EngagementOutcome::Opened { .. }
        ));
        assert!(matches!(
            result.events[1].outcome,
            crate::engine::lifecycle::EngagementOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn run_is_deterministic() {
        let run = || {
            let mut feed = SliceFeed::new(vec![
                bar(0, 1.1000, 1.1010, 1.0995, 1.1005),
                bar(1, 1.1005, 1.1030, 1.1000, 1.1025),
                bar(2, 1.1025, 1.1065, 1.1020, 1.1060),
                bar(3, 1.1060, 1.1070, 1.1040, 1.1050),
            ]);
            let mut strategy = ScriptedStrategy::new(vec![(0, long_engagement())]);
            run_simulation(
                &mut feed,
                &mut strategy,
                &mut ConstantRegime(Regime::Trending),
                &brain(),
                &SimConfig::default(),
            )
            .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(
            serde_json::to_string(&a.trades).unwrap(),
            serde_json::to_string(&b.trades).unwrap()
        );
        assert_eq!(a.equity_curve, b.equity_curve);
        assert_eq!(a.account, b.account);
    }

    #[test]
    fn equity_curve_marks_open_positions_to_market() {
        let mut feed = SliceFeed::new(vec![
            bar(0, 1.1000, 1.1010, 1.0995, 1.1000),
            bar(1, 1.1000, 1.1035, 1.1000, 1.1030),
        ]);
        let mut strategy = ScriptedStrategy::new(vec![(0, long_engagement())]);
        let result = run_simulation(
            &mut feed,
            &mut strategy,
            &mut ConstantRegime(Regime::Trending),
            &brain(),
            &frictionless_config(),
        )
        .unwrap();
        // End-of-data close at 1.1030: +30 pips on 10k units
        assert!((result.account.equity - 10_030.0).abs() < 1e-6);
    }
}
