//! Position: the accepted, live representation of a trade.
//!
//! Owned exclusively by the lifecycle manager; nothing else mutates one.
//! Remaining size only ever decreases, and the stop price only ever moves
//! in the trade's favor once a law has engaged (the ratchet invariant).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use super::engagement::{Direction, Engagement, TakeProfit};

/// Identity of a position within one lifecycle manager, used to correlate
/// execution-sink notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A live position being advanced bar by bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub direction: Direction,
    pub entry_price: f64,
    /// Current stop price. Starts at the engagement's implied stop and moves
    /// only through the ratchet.
    pub stop_price: f64,
    /// Initial risk distance in price units; fixed at open, used as the
    /// denominator of every reward/risk computation.
    pub initial_risk: f64,
    pub initial_size: f64,
    pub remaining_size: f64,
    /// Unfilled take-profit levels, nearest target first.
    pub take_profits: Vec<TakeProfit>,
    /// Set once the Winner law has moved the stop to breakeven + buffer.
    pub breakeven_locked: bool,
    /// Number of Zombie tightening steps already applied.
    pub zombie_steps: u32,
    /// Whether any take-profit has partially filled.
    pub partial_filled: bool,
    /// Number of take-profit fills so far.
    pub tp_fills: usize,
    pub bars_held: usize,
    /// Favorable excursion watermark: highest high since entry for longs,
    /// lowest low for shorts.
    pub best_excursion: f64,
    /// Fees accumulated across the open and all fills so far.
    pub fees_paid: f64,
    /// Slippage accumulated across all fills so far.
    pub slippage_paid: f64,
    /// Realized PnL accumulated from partial fills (gross of costs).
    pub realized_gross: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Open a position from an accepted engagement at the risk-scaled size.
    pub fn open(
        id: PositionId,
        engagement: &Engagement,
        size: f64,
        pip_size: f64,
        opened_at: DateTime<Utc>,
    ) -> Self {
        let mut take_profits = engagement.take_profits.clone();
        // Nearest target fills first regardless of the order proposed.
        let sign = engagement.direction.sign();
        take_profits.sort_by(|a, b| {
            let da = (a.price - engagement.entry) * sign;
            let db = (b.price - engagement.entry) * sign;
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            id,
            direction: engagement.direction,
            entry_price: engagement.entry,
            stop_price: engagement.stop_price(pip_size),
            initial_risk: engagement.risk_distance(pip_size),
            initial_size: size,
            remaining_size: size,
            take_profits,
            breakeven_locked: false,
            zombie_steps: 0,
            partial_filled: false,
            tp_fills: 0,
            bars_held: 0,
            best_excursion: engagement.entry,
            fees_paid: 0.0,
            slippage_paid: 0.0,
            realized_gross: 0.0,
            opened_at,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.remaining_size <= 0.0
    }

    /// Advance the bar counter and the favorable-excursion watermark.
    pub fn observe_bar(&mut self, bar: &Bar) {
        self.bars_held += 1;
        match self.direction {
            Direction::Long => {
                if bar.high > self.best_excursion {
                    self.best_excursion = bar.high;
                }
            }
            Direction::Short => {
                if bar.low < self.best_excursion {
                    self.best_excursion = bar.low;
                }
            }
        }
    }

    /// Current reward/risk ratio: favorable excursion over initial risk.
    ///
    /// A zero risk distance cannot occur for an accepted engagement, but the
    /// guard keeps the ratio defined for hand-built positions in tests.
    pub fn reward_risk(&self) -> f64 {
        if self.initial_risk <= 0.0 {
            return 0.0;
        }
        (self.best_excursion - self.entry_price) * self.direction.sign() / self.initial_risk
    }

    /// Stop distance from entry on the losing side, in price units.
    ///
    /// Negative once the stop has crossed to the winning side of entry.
    pub fn stop_distance(&self) -> f64 {
        (self.entry_price - self.stop_price) * self.direction.sign()
    }

    /// Unrealized PnL of the remaining size at the given price.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.direction.sign() * self.remaining_size
    }
}
