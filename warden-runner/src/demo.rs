//! Demo breakout strategy.
//!
//! A deliberately small signal source so runs and sweeps have something to
//! trade: go long when the close breaks above the prior N-bar high. Signal
//! quality is not the point; the engine treats every strategy as advisory
//! and this one exists to exercise the full accept/reject/manage path.

use warden_core::domain::{Bar, Direction, Engagement, TakeProfit};
use warden_core::engine::Strategy;

/// Long-only breakout over a rolling lookback window.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    pub lookback: usize,
    pub stop_pips: f64,
    pub first_target_pips: f64,
    pub second_target_pips: f64,
    pub size: f64,
    pub pip_size: f64,
    /// Bars to wait between proposals.
    pub cooldown_bars: usize,
    last_fired: Option<usize>,
}

impl BreakoutStrategy {
    pub fn new(
        lookback: usize,
        stop_pips: f64,
        first_target_pips: f64,
        second_target_pips: f64,
        size: f64,
        pip_size: f64,
        cooldown_bars: usize,
    ) -> Self {
        Self {
            lookback,
            stop_pips,
            first_target_pips,
            second_target_pips,
            size,
            pip_size,
            cooldown_bars,
            last_fired: None,
        }
    }
}

impl Strategy for BreakoutStrategy {
    fn on_bar(&mut self, history: &[Bar], index: usize) -> Vec<Engagement> {
        if index < self.lookback {
            return Vec::new();
        }
        if let Some(last) = self.last_fired {
            if index - last < self.cooldown_bars {
                return Vec::new();
            }
        }
        let window = &history[index - self.lookback..index];
        let prior_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let bar = &history[index];
        if bar.close <= prior_high {
            return Vec::new();
        }

        self.last_fired = Some(index);
        let entry = bar.close;
        vec![Engagement {
            direction: Direction::Long,
            entry,
            stop_pips: self.stop_pips,
            take_profits: vec![
                TakeProfit {
                    price: entry + self.first_target_pips * self.pip_size,
                    fraction: 0.5,
                },
                TakeProfit {
                    price: entry + self.second_target_pips * self.pip_size,
                    fraction: 0.5,
                },
            ],
            size: self.size,
        }]
    }

    fn name(&self) -> &str {
        "breakout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(hour: u32, high: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::hours(hour as i64),
            open: close - 0.0002,
            high,
            low: close - 0.0010,
            close,
            volume: 1_000.0,
        }
    }

    fn strategy() -> BreakoutStrategy {
        BreakoutStrategy::new(3, 20.0, 30.0, 60.0, 10_000.0, 0.0001, 5)
    }

    #[test]
    fn silent_during_warmup() {
        let mut s = strategy();
        let history = vec![bar(0, 1.1010, 1.1005)];
        assert!(s.on_bar(&history, 0).is_empty());
    }

    #[test]
    fn fires_on_breakout() {
        let mut s = strategy();
        let history = vec![
            bar(0, 1.1010, 1.1005),
            bar(1, 1.1012, 1.1006),
            bar(2, 1.1011, 1.1004),
            bar(3, 1.1030, 1.1025), // close above prior 3-bar high
        ];
        let proposals = s.on_bar(&history, 3);
        assert_eq!(proposals.len(), 1);
        let e = &proposals[0];
        assert_eq!(e.direction, Direction::Long);
        assert!((e.entry - 1.1025).abs() < 1e-9);
        assert_eq!(e.take_profits.len(), 2);
        assert!((e.take_profits[0].price - 1.1055).abs() < 1e-9);
    }

    #[test]
    fn quiet_without_breakout() {
        let mut s = strategy();
        let history = vec![
            bar(0, 1.1010, 1.1005),
            bar(1, 1.1012, 1.1006),
            bar(2, 1.1011, 1.1004),
            bar(3, 1.1013, 1.1008), // close below prior high 1.1012
        ];
        assert!(s.on_bar(&history, 3).is_empty());
    }

    #[test]
    fn cooldown_suppresses_repeat_fires() {
        let mut s = strategy();
        let mut history = vec![
            bar(0, 1.1010, 1.1005),
            bar(1, 1.1012, 1.1006),
            bar(2, 1.1011, 1.1004),
            bar(3, 1.1030, 1.1025),
        ];
        assert_eq!(s.on_bar(&history, 3).len(), 1);
        // Next bar breaks out again, but the cooldown holds.
        history.push(bar(4, 1.1050, 1.1045));
        assert!(s.on_bar(&history, 4).is_empty());
    }
}
