//! Engagement: a strategy's proposal to open a position.
//!
//! Engagements are transient. They exist only between the strategy emitting
//! them and the lifecycle manager accepting or rejecting them; an accepted
//! engagement becomes a `Position`, a rejected one becomes an event record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Sign of a favorable price move: +1 for longs, -1 for shorts.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// One take-profit level: a target price and the fraction of the original
/// size to close when it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfit {
    pub price: f64,
    pub fraction: f64,
}

/// Why an engagement failed local validation.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum EngagementError {
    #[error("requested size {0} is not positive")]
    NonPositiveSize(f64),
    #[error("entry price {0} is not positive")]
    NonPositiveEntry(f64),
    #[error("stop distance {0} pips is not positive")]
    NonPositiveStopDistance(f64),
    #[error("take-profit fraction {0} is not positive")]
    NonPositiveFraction(f64),
    #[error("take-profit fractions sum to {0}, exceeding 1.0")]
    FractionsExceedUnity(f64),
    #[error("take-profit at {price} is on the losing side of entry {entry}")]
    TakeProfitOnWrongSide { price: f64, entry: f64 },
}

/// A proposed trade: direction, entry, initial stop distance in pips, an
/// ordered take-profit ladder, and the requested size.
///
/// The stop distance is expressed in pips so that the Tourniquet ceiling
/// applies uniformly across instruments; `pip_size` converts to price units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub direction: Direction,
    pub entry: f64,
    pub stop_pips: f64,
    pub take_profits: Vec<TakeProfit>,
    pub size: f64,
}

impl Engagement {
    /// Validate the proposal before any risk or law evaluation.
    ///
    /// Rejection here is local and non-fatal: the strategy may retry on a
    /// later bar.
    pub fn validate(&self) -> Result<(), EngagementError> {
        if !(self.size > 0.0) {
            return Err(EngagementError::NonPositiveSize(self.size));
        }
        if !(self.entry > 0.0) {
            return Err(EngagementError::NonPositiveEntry(self.entry));
        }
        if !(self.stop_pips > 0.0) {
            return Err(EngagementError::NonPositiveStopDistance(self.stop_pips));
        }
        let mut fraction_sum = 0.0;
        for tp in &self.take_profits {
            if !(tp.fraction > 0.0) {
                return Err(EngagementError::NonPositiveFraction(tp.fraction));
            }
            let reward = (tp.price - self.entry) * self.direction.sign();
            if reward <= 0.0 {
                return Err(EngagementError::TakeProfitOnWrongSide {
                    price: tp.price,
                    entry: self.entry,
                });
            }
            fraction_sum += tp.fraction;
        }
        if fraction_sum > 1.0 + 1e-9 {
            return Err(EngagementError::FractionsExceedUnity(fraction_sum));
        }
        Ok(())
    }

    /// Initial risk distance in price units.
    pub fn risk_distance(&self, pip_size: f64) -> f64 {
        self.stop_pips * pip_size
    }

    /// Initial stop price implied by the stop distance.
    pub fn stop_price(&self, pip_size: f64) -> f64 {
        self.entry - self.direction.sign() * self.risk_distance(pip_size)
    }

    /// Best attainable reward/risk ratio across the take-profit ladder.
    ///
    /// Returns 0.0 when there are no take-profits or the risk distance is
    /// degenerate, rather than dividing by zero.
    pub fn best_reward_risk(&self, pip_size: f64) -> f64 {
        let risk = self.risk_distance(pip_size);
        if risk <= 0.0 {
            return 0.0;
        }
        self.take_profits
            .iter()
            .map(|tp| (tp.price - self.entry) * self.direction.sign() / risk)
            .fold(0.0, f64::max)
    }
}
