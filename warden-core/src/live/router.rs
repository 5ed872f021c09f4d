//! Runtime router: the live/paper analogue of the simulation driver.
//!
//! Identical decision logic by construction: the router drives the same
//! `LifecycleManager` and `RiskBrain` as the backtest driver; only the bar
//! source and the execution sink differ. The decision code is never forked
//! between the two modes.
//!
//! Cancellation: the stop flag is checked between bars. Once stopping, all
//! open positions are force-closed through the sink before `run` returns,
//! so no position is ever abandoned.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, CloseReason, ClosedTrade};
use crate::engine::costs::CostModel;
use crate::engine::feed::{BarFeed, FeedError, IntegrityCheck};
use crate::engine::lifecycle::{EngagementEvent, EngagementOutcome, LifecycleManager};
use crate::engine::strategy::{RegimeSource, Strategy};
use crate::laws::LawConfig;
use crate::risk::RiskBrain;

use super::broker::ExecutionSink;
use super::shared::SharedAccount;

/// Why a routing session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopCause {
    /// The feed signalled end-of-stream.
    FeedEnded,
    /// The stop flag was raised externally.
    Cancelled,
}

/// Terminal output of one routing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterReport {
    pub trades: Vec<ClosedTrade>,
    pub events: Vec<EngagementEvent>,
    pub bars_processed: usize,
    pub stop_cause: StopCause,
}

/// Drives one instrument's lifecycle manager against a live feed and an
/// execution sink, sharing account state with any sibling routers.
pub struct RuntimeRouter {
    lifecycle: LifecycleManager,
    brain: RiskBrain,
    account: SharedAccount,
}

impl RuntimeRouter {
    pub fn new(laws: LawConfig, costs: CostModel, brain: RiskBrain, account: SharedAccount) -> Self {
        Self {
            lifecycle: LifecycleManager::new(laws, costs),
            brain,
            account,
        }
    }

    pub fn account(&self) -> &SharedAccount {
        &self.account
    }

    /// Route bars until the feed ends or the stop flag is raised.
    ///
    /// All account mutations for a bar happen under one lock guard, which
    /// is the single-writer discipline for the shared account. Sink
    /// rejection of an open is treated as a local force-close.
    pub fn run(
        &mut self,
        feed: &mut dyn BarFeed,
        strategy: &mut dyn Strategy,
        regimes: &mut dyn RegimeSource,
        sink: &mut dyn ExecutionSink,
        stop: &AtomicBool,
    ) -> Result<RouterReport, FeedError> {
        let mut integrity = IntegrityCheck::new();
        let mut history: Vec<Bar> = Vec::new();
        let mut trades: Vec<ClosedTrade> = Vec::new();
        let mut events: Vec<EngagementEvent> = Vec::new();
        let mut stop_cause = StopCause::FeedEnded;

        while let Some(bar) = feed.next_bar()? {
            if stop.load(Ordering::SeqCst) {
                stop_cause = StopCause::Cancelled;
                break;
            }
            integrity.admit(&bar)?;
            history.push(bar);
            let index = history.len() - 1;
            let bar = &history[index];

            // Stops as they stood before this bar, for sink notifications.
            let stops_before: Vec<_> = self
                .lifecycle
                .positions()
                .iter()
                .map(|p| (p.id, p.stop_price))
                .collect();

            let closed = {
                let mut account = self.account.lock();
                self.lifecycle.step(bar, &mut account)
            };
            for trade in &closed {
                sink.close(trade);
            }
            trades.extend(closed);

            // Report law-driven stop moves on surviving positions.
            for position in self.lifecycle.positions() {
                let moved = stops_before
                    .iter()
                    .find(|(id, _)| *id == position.id)
                    .is_some_and(|(_, old)| (position.stop_price - old).abs() > f64::EPSILON);
                if moved {
                    sink.adjust_stop(position.id, position.stop_price);
                }
            }

            let regime = regimes.classify(&history, index);
            for engagement in strategy.on_bar(&history, index) {
                let outcome = {
                    let mut account = self.account.lock();
                    self.lifecycle
                        .propose(bar, &engagement, &self.brain, regime, &mut account)
                };
                if matches!(outcome, EngagementOutcome::Opened { .. }) {
                    let index_opened = self.lifecycle.open_positions() - 1;
                    let ack = sink.open(&self.lifecycle.positions()[index_opened]);
                    if ack.is_rejected() {
                        let mut account = self.account.lock();
                        if let Some(trade) = self.lifecycle.force_close(
                            index_opened,
                            bar,
                            CloseReason::SinkRejected,
                            &mut account,
                        ) {
                            trades.push(trade);
                        }
                    }
                }
                events.push(EngagementEvent {
                    bar_index: index,
                    timestamp: bar.timestamp,
                    direction: engagement.direction,
                    entry: engagement.entry,
                    outcome,
                });
            }
        }

        // In-flight force-closes complete before resources are released.
        if let Some(last) = history.last() {
            let closed = {
                let mut account = self.account.lock();
                self.lifecycle
                    .force_close_all(last, CloseReason::EndOfData, &mut account)
            };
            for trade in &closed {
                sink.close(trade);
            }
            trades.extend(closed);
        }

        Ok(RouterReport {
            trades,
            events,
            bars_processed: history.len(),
            stop_cause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, Engagement, Position, TakeProfit};
    use crate::engine::feed::SliceFeed;
    use crate::engine::strategy::{ConstantRegime, ScriptedStrategy};
    use crate::live::broker::{PaperSink, SinkAck};
    use crate::risk::{Regime, RegimeMultipliers, RiskLadder};
    use chrono::{TimeZone, Utc};

    fn bar(hour: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
                + chrono::Duration::hours(hour as i64),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn brain() -> RiskBrain {
        RiskBrain::new(
            RiskLadder::conservative_default(),
            RegimeMultipliers::default(),
            0.3,
        )
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

    fn router(account: &SharedAccount) -> RuntimeRouter {
        RuntimeRouter::new(
            LawConfig::default(),
            CostModel::frictionless(),
            brain(),
            account.clone(),
        )
    }

    #[test]
    fn routes_open_and_close_through_sink() {
        let account = SharedAccount::new(10_000.0);
        let mut rt = router(&account);
        let mut feed = SliceFeed::new(vec![
            bar(0, 1.1000, 1.1010, 1.0995, 1.1005),
            bar(1, 1.1005, 1.1065, 1.1000, 1.1060),
        ]);
        let mut strategy = ScriptedStrategy::new(vec![(0, long_engagement())]);
        let mut sink = PaperSink::new();
        let stop = AtomicBool::new(false);

        let report = rt
            .run(
                &mut feed,
                &mut strategy,
                &mut ConstantRegime(Regime::Trending),
                &mut sink,
                &stop,
            )
            .unwrap();

        assert_eq!(report.stop_cause, StopCause::FeedEnded);
        assert_eq!(sink.opened.len(), 1);
        assert_eq!(sink.closed.len(), 1);
        assert_eq!(report.trades.len(), 1);
        // Take-profit at 1.1060: +60 pips on 10k units
        assert!((account.snapshot().equity - 10_060.0).abs() < 1e-6);
    }

    #[test]
    fn sink_rejection_force_closes() {
        struct RejectingSink(PaperSink);
        impl ExecutionSink for RejectingSink {
            fn open(&mut self, _position: &Position) -> SinkAck {
                SinkAck::Rejected("insufficient margin".into())
            }
            fn adjust_stop(&mut self, id: crate::domain::PositionId, s: f64) -> SinkAck {
                self.0.adjust_stop(id, s)
            }
            fn close(&mut self, trade: &ClosedTrade) -> SinkAck {
                self.0.close(trade)
            }
        }

        let account = SharedAccount::new(10_000.0);
        let mut rt = router(&account);
        let mut feed = SliceFeed::new(vec![
            bar(0, 1.1000, 1.1010, 1.0995, 1.1005),
            bar(1, 1.1005, 1.1010, 1.1000, 1.1008),
        ]);
        let mut strategy = ScriptedStrategy::new(vec![(0, long_engagement())]);
        let mut sink = RejectingSink(PaperSink::new());
        let stop = AtomicBool::new(false);

        let report = rt
            .run(
                &mut feed,
                &mut strategy,
                &mut ConstantRegime(Regime::Trending),
                &mut sink,
                &stop,
            )
            .unwrap();

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].reason, CloseReason::SinkRejected);
    }

    #[test]
    fn cancellation_closes_open_positions() {
        let account = SharedAccount::new(10_000.0);
        let mut rt = router(&account);
        // Long feed, but the stop flag is raised after the first bar.
        let bars: Vec<Bar> = (0..50).map(|h| bar(h, 1.1000, 1.1005, 1.0995, 1.1000)).collect();
        let mut feed = SliceFeed::new(bars);
        let mut strategy = ScriptedStrategy::new(vec![(0, long_engagement())]);

        struct StopAfterOpen<'a> {
            inner: PaperSink,
            stop: &'a AtomicBool,
        }
        impl ExecutionSink for StopAfterOpen<'_> {
            fn open(&mut self, position: &Position) -> SinkAck {
                self.stop.store(true, Ordering::SeqCst);
                self.inner.open(position)
            }
            fn adjust_stop(&mut self, id: crate::domain::PositionId, s: f64) -> SinkAck {
                self.inner.adjust_stop(id, s)
            }
            fn close(&mut self, trade: &ClosedTrade) -> SinkAck {
                self.inner.close(trade)
            }
        }

        let stop = AtomicBool::new(false);
        let mut sink = StopAfterOpen { inner: PaperSink::new(), stop: &stop };
        let report = rt
            .run(
                &mut feed,
                &mut strategy,
                &mut ConstantRegime(Regime::Trending),
                &mut sink,
                &stop,
            )
            .unwrap();

        assert_eq!(report.stop_cause, StopCause::Cancelled);
        // The open position was not abandoned.
        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].reason, CloseReason::EndOfData);
        assert_eq!(sink.inner.closed.len(), 1);
    }

    #[test]
    fn stop_adjustments_reach_the_sink() {
        let laws = LawConfig {
            winner_rr_threshold: 2.0,
            breakeven_buffer_pips: 2.0,
            ..LawConfig::default()
        };
        let account = SharedAccount::new(10_000.0);
        let mut rt = RuntimeRouter::new(laws, CostModel::frictionless(), brain(), account.clone());
        let mut e = long_engagement();
        e.take_profits = vec![TakeProfit { price: 1.1200, fraction: 1.0 }];
        let mut feed = SliceFeed::new(vec![
            bar(0, 1.1000, 1.1010, 1.0995, 1.1005),
            // 50 pips favorable: RR 2.5 past the 2.0 threshold
            bar(1, 1.1005, 1.1050, 1.1000, 1.1045),
        ]);
        let mut strategy = ScriptedStrategy::new(vec![(0, e)]);
        let mut sink = PaperSink::new();
        let stop = AtomicBool::new(false);

        rt.run(
            &mut feed,
            &mut strategy,
            &mut ConstantRegime(Regime::Trending),
            &mut sink,
            &stop,
        )
        .unwrap();

        assert_eq!(sink.stop_adjustments.len(), 1);
        let (_, new_stop) = sink.stop_adjustments[0];
        assert!((new_stop - 1.1002).abs() < 1e-9);
    }

    #[test]
    fn two_routers_share_one_account() {
        let account = SharedAccount::new(10_000.0);
        let mut rt_a = router(&account);
        let mut rt_b = router(&account);
        let stop = AtomicBool::new(false);

        let run = |rt: &mut RuntimeRouter, stop: &AtomicBool| {
            let mut feed = SliceFeed::new(vec![
                bar(0, 1.1000, 1.1010, 1.0995, 1.1005),
                bar(1, 1.1005, 1.1065, 1.1000, 1.1060),
            ]);
            let mut strategy = ScriptedStrategy::new(vec![(0, long_engagement())]);
            let mut sink = PaperSink::new();
            rt.run(
                &mut feed,
                &mut strategy,
                &mut ConstantRegime(Regime::Trending),
                &mut sink,
                stop,
            )
            .unwrap()
        };

        run(&mut rt_a, &stop);
        run(&mut rt_b, &stop);
        // Both winners settled against the same account.
        assert!((account.snapshot().equity - 10_120.0).abs() < 1e-6);
    }
}
