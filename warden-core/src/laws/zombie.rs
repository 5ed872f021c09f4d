//! Zombie: progressively tighten stops on stale, non-performing trades.
//!
//! A position that has been held for the staleness threshold without a
//! single partial fill gets its stop tightened by one step toward entry.
//! One step is applied per whole multiple of the threshold (bars N, 2N,
//! 3N, ...). Tightening never loosens the stop and never crosses the
//! entry-side bound Winner would set.

use crate::domain::Position;

use super::LawConfig;

/// The stop price Zombie wants, or `None` if the law does not fire.
pub fn proposed_stop(config: &LawConfig, position: &Position) -> Option<f64> {
    if config.zombie_after_bars == 0 || position.partial_filled {
        return None;
    }
    let crossings = (position.bars_held / config.zombie_after_bars) as u32;
    if crossings <= position.zombie_steps {
        return None;
    }
    let sign = position.direction.sign();
    let step = config.zombie_step_pips * config.pip_size;
    let proposed = position.stop_price + sign * step;
    // Cap at the breakeven bound; Winner owns anything past it.
    let bound = config.breakeven_stop(position.direction, position.entry_price);
    let capped = match position.direction {
        crate::domain::Direction::Long => proposed.min(bound),
        crate::domain::Direction::Short => proposed.max(bound),
    };
    // Only ever tighten.
    if (capped - position.stop_price) * sign <= 0.0 {
        return None;
    }
    Some(capped)
}
