//! ClosedTrade: the immutable record of a finished trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engagement::Direction;

/// Why a position finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    /// The stop price was crossed.
    StopLoss,
    /// The final take-profit level filled the remaining size.
    TakeProfit,
    /// The Tourniquet law force-closed a position whose stop distance
    /// breached the hard ceiling.
    Tourniquet,
    /// The feed ended with the position still open.
    EndOfData,
    /// The execution sink refused the order (live routing only).
    SinkRejected,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "stop_loss"),
            CloseReason::TakeProfit => write!(f, "take_profit"),
            CloseReason::Tourniquet => write!(f, "tourniquet"),
            CloseReason::EndOfData => write!(f, "end_of_data"),
            CloseReason::SinkRejected => write!(f, "sink_rejected"),
        }
    }
}

/// A completed round trip. Produced exactly once per position, when its
/// remaining size reaches zero or it is force-closed.
///
/// For positions that partially filled along the way, `exit_price` is the
/// final exit and the PnL and cost fields aggregate every fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Total size opened (not the remainder closed at the end).
    pub size: f64,
    pub gross_pnl: f64,
    pub fees: f64,
    pub slippage: f64,
    pub net_pnl: f64,
    pub reason: CloseReason,
    pub bars_held: usize,
    /// Number of partial take-profit fills before the final close.
    pub partial_fills: usize,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Return on risk capital: net PnL over entry notional.
    pub fn return_fraction(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional <= 0.0 {
            return 0.0;
        }
        self.net_pnl / notional
    }
}
