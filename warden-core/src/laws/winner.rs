//! Winner: lock in a risk-free floor once a trade has earned it.
//!
//! When the reward/risk ratio (favorable excursion over initial risk)
//! reaches the configured threshold, the stop moves to entry plus a buffer
//! in the trade's favor and the breakeven lock is set. Re-evaluating a
//! locked position is a no-op.

use crate::domain::Position;

use super::LawConfig;

/// The stop price Winner wants, or `None` if the law does not fire.
pub fn proposed_stop(config: &LawConfig, position: &Position) -> Option<f64> {
    if position.breakeven_locked {
        return None;
    }
    if position.reward_risk() < config.winner_rr_threshold {
        return None;
    }
    Some(config.breakeven_stop(position.direction, position.entry_price))
}
