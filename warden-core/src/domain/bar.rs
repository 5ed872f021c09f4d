//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument over a fixed interval.
///
/// Bars are immutable once produced and must arrive in strictly increasing
/// timestamp order; the simulation driver treats duplicates and reordering
/// as fatal feed errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity check: finite prices, high >= low, range contains
    /// open and close, strictly positive prices.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
    }

    /// Relative intrabar range, used as the volatility proxy for slippage.
    ///
    /// Returns 0.0 for a degenerate bar rather than propagating a division
    /// by zero.
    pub fn range_fraction(&self) -> f64 {
        if self.close <= 0.0 {
            return 0.0;
        }
        ((self.high - self.low) / self.close).max(0.0)
    }
}
