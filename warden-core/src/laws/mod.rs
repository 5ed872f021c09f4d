//! Safety laws: hard rules that override strategy intent.
//!
//! Three laws guard every position, evaluated in fixed precedence:
//!
//! 1. **Tourniquet** rejects engagements whose stop distance exceeds a hard
//!    pip ceiling, and force-closes open positions pushed past it.
//! 2. **Winner** moves the stop to breakeven plus a buffer once the trade's
//!    reward/risk ratio clears a threshold, and locks it there.
//! 3. **Zombie** tightens the stop on stale positions that have never
//!    partially filled, one step per staleness-threshold multiple.
//!
//! Laws are pure functions of configuration plus a position or engagement
//! snapshot. Every stop mutation they propose passes through the ratchet:
//! a long's stop only rises, a short's only falls.

pub mod tourniquet;
pub mod winner;
pub mod zombie;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Direction, Position};

/// Which law produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LawKind {
    Tourniquet,
    Winner,
    Zombie,
}

impl std::fmt::Display for LawKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LawKind::Tourniquet => write!(f, "tourniquet"),
            LawKind::Winner => write!(f, "winner"),
            LawKind::Zombie => write!(f, "zombie"),
        }
    }
}

/// Verdict from evaluating the laws against an open position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionVerdict {
    /// Terminate the position at the current market price.
    ForceClose(LawKind),
    /// Move the stop to `price` (subject to the ratchet).
    MoveStop { price: f64, law: LawKind },
    /// Nothing to do this bar.
    Hold,
}

/// Thresholds for the three laws, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawConfig {
    /// Tourniquet ceiling: engagements at or past this stop distance are
    /// never opened.
    pub max_stop_pips: f64,
    /// Winner trigger: reward/risk ratio at which the stop moves to
    /// breakeven.
    pub winner_rr_threshold: f64,
    /// Distance past entry, in pips, where Winner parks the stop.
    pub breakeven_buffer_pips: f64,
    /// Zombie staleness threshold in bars; 0 disables the law.
    pub zombie_after_bars: usize,
    /// Zombie tightening step in pips.
    pub zombie_step_pips: f64,
    /// Price units per pip for this instrument.
    pub pip_size: f64,
}

impl Default for LawConfig {
    fn default() -> Self {
        Self {
            max_stop_pips: 40.0,
            winner_rr_threshold: 2.0,
            breakeven_buffer_pips: 2.0,
            zombie_after_bars: 24,
            zombie_step_pips: 3.0,
            pip_size: 0.0001,
        }
    }
}

/// Configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LawConfigError {
    #[error("max stop distance {0} pips must be positive")]
    NonPositiveMaxStop(f64),
    #[error("winner reward/risk threshold {0} must be positive")]
    NonPositiveWinnerThreshold(f64),
    #[error("breakeven buffer {0} pips must be non-negative")]
    NegativeBuffer(f64),
    #[error("zombie step {0} pips must be non-negative")]
    NegativeZombieStep(f64),
    #[error("pip size {0} must be positive")]
    NonPositivePipSize(f64),
}

impl LawConfig {
    pub fn validate(&self) -> Result<(), LawConfigError> {
        if !(self.max_stop_pips > 0.0) {
            return Err(LawConfigError::NonPositiveMaxStop(self.max_stop_pips));
        }
        if !(self.winner_rr_threshold > 0.0) {
            return Err(LawConfigError::NonPositiveWinnerThreshold(
                self.winner_rr_threshold,
            ));
        }
        if self.breakeven_buffer_pips < 0.0 {
            return Err(LawConfigError::NegativeBuffer(self.breakeven_buffer_pips));
        }
        if self.zombie_step_pips < 0.0 {
            return Err(LawConfigError::NegativeZombieStep(self.zombie_step_pips));
        }
        if !(self.pip_size > 0.0) {
            return Err(LawConfigError::NonPositivePipSize(self.pip_size));
        }
        Ok(())
    }

    /// The stop price Winner would set: entry plus the buffer, in the
    /// trade's favor. Zombie tightening is capped at this same bound.
    pub fn breakeven_stop(&self, direction: Direction, entry_price: f64) -> f64 {
        entry_price + direction.sign() * self.breakeven_buffer_pips * self.pip_size
    }
}

/// Ratchet rule: stops may tighten, never loosen.
///
/// Longs: the stop only rises. Shorts: the stop only falls. Returns the
/// clamped stop level.
pub fn ratchet(direction: Direction, current: f64, proposed: f64) -> f64 {
    match direction {
        Direction::Long => current.max(proposed),
        Direction::Short => current.min(proposed),
    }
}

/// Evaluate all three laws against an open position, in precedence order.
///
/// Tourniquet can terminate the position, in which case Winner and Zombie
/// are never consulted. At most one stop mutation is emitted per bar.
pub fn evaluate_position(config: &LawConfig, position: &Position) -> PositionVerdict {
    if tourniquet::breaches_ceiling(config, position) {
        return PositionVerdict::ForceClose(LawKind::Tourniquet);
    }
    if let Some(price) = winner::proposed_stop(config, position) {
        return PositionVerdict::MoveStop { price, law: LawKind::Winner };
    }
    if let Some(price) = zombie::proposed_stop(config, position) {
        return PositionVerdict::MoveStop { price, law: LawKind::Zombie };
    }
    PositionVerdict::Hold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Engagement, PositionId, TakeProfit};
    use chrono::{TimeZone, Utc};

    fn open_long(stop_pips: f64) -> Position {
        let e = Engagement {
            direction: Direction::Long,
            entry: 1.1000,
            stop_pips,
            take_profits: vec![TakeProfit { price: 1.1100, fraction: 1.0 }],
            size: 10_000.0,
        };
        Position::open(PositionId(1), &e, 10_000.0, 0.0001, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
    }

    #[test]
    fn default_config_validates() {
        assert!(LawConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_zero_pip_size() {
        let cfg = LawConfig { pip_size: 0.0, ..LawConfig::default() };
        assert!(matches!(
            cfg.validate(),
            Err(LawConfigError::NonPositivePipSize(_))
        ));
    }

    #[test]
    fn ratchet_long_only_rises() {
        assert_eq!(ratchet(Direction::Long, 1.1000, 1.1010), 1.1010);
        assert_eq!(ratchet(Direction::Long, 1.1000, 1.0990), 1.1000);
    }

    #[test]
    fn ratchet_short_only_falls() {
        assert_eq!(ratchet(Direction::Short, 1.1000, 1.0990), 1.0990);
        assert_eq!(ratchet(Direction::Short, 1.1000, 1.1010), 1.1000);
    }

    #[test]
    fn breakeven_stop_favors_trade() {
        let cfg = LawConfig { breakeven_buffer_pips: 2.0, pip_size: 0.0001, ..LawConfig::default() };
        let long = cfg.breakeven_stop(Direction::Long, 1.1000);
        assert!((long - 1.1002).abs() < 1e-9);
        let short = cfg.breakeven_stop(Direction::Short, 1.1000);
        assert!((short - 1.0998).abs() < 1e-9);
    }

    #[test]
    fn tourniquet_takes_precedence_over_winner() {
        // Position both past the Winner threshold and past the ceiling:
        // the force-close wins.
        let cfg = LawConfig {
            max_stop_pips: 15.0,
            winner_rr_threshold: 1.0,
            ..LawConfig::default()
        };
        let mut pos = open_long(20.0);
        pos.best_excursion = 1.1100; // deep in profit
        assert_eq!(
            evaluate_position(&cfg, &pos),
            PositionVerdict::ForceClose(LawKind::Tourniquet)
        );
    }

    #[test]
    fn winner_takes_precedence_over_zombie() {
        let cfg = LawConfig {
            max_stop_pips: 50.0,
            winner_rr_threshold: 2.0,
            zombie_after_bars: 5,
            ..LawConfig::default()
        };
        let mut pos = open_long(20.0);
        pos.bars_held = 10; // stale enough for Zombie
        pos.best_excursion = 1.1050; // RR 2.5, past the Winner threshold
        match evaluate_position(&cfg, &pos) {
            PositionVerdict::MoveStop { law, .. } => assert_eq!(law, LawKind::Winner),
            other => panic!("expected winner stop move, got {other:?}"),
        }
    }

    #[test]
    fn quiet_position_holds() {
        let cfg = LawConfig::default();
        let pos = open_long(20.0);
        assert_eq!(evaluate_position(&cfg, &pos), PositionVerdict::Hold);
    }
}
