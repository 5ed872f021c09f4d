//! Risk brain: drawdown- and regime-aware triage of proposed engagements.
//!
//! The brain is side-effect free. It reads a committed `AccountState`
//! snapshot and never mutates it; only the lifecycle manager writes equity
//! after a close. This keeps triage independently testable and safe to call
//! from a stale-but-consistent snapshot in live routing.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountState, Engagement};

use super::ladder::RiskLadder;
use super::regime::{Regime, RegimeMultipliers};

/// Sizing multipliers within this distance of 1.0 count as full size.
const FULL_SIZE_TOLERANCE: f64 = 1e-9;

/// Triage outcome for one proposed engagement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Triage {
    /// Conditions are clean; trade at the requested size.
    AllowFull { size: f64 },
    /// Conditions are degraded; trade at the scaled size.
    AllowReduced { size: f64, multiplier: f64 },
    /// Combined conditions are below the floor; do not trade.
    Skip { multiplier: f64 },
}

impl Triage {
    /// The size to open, if any.
    pub fn approved_size(&self) -> Option<f64> {
        match self {
            Triage::AllowFull { size } => Some(*size),
            Triage::AllowReduced { size, .. } => Some(*size),
            Triage::Skip { .. } => None,
        }
    }
}

/// The drawdown ladder, regime table, and gates that guard new risk.
///
/// `min_reward_risk` and `max_open_positions` are hard gates the lifecycle
/// manager consults after triage; a value of 0 disables the reward/risk
/// floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBrain {
    pub ladder: RiskLadder,
    pub regimes: RegimeMultipliers,
    /// Combined multiplier below which engagements are skipped entirely.
    pub skip_floor: f64,
    /// Minimum best-case reward/risk ratio for a new engagement; 0 disables.
    pub min_reward_risk: f64,
    /// Maximum concurrently open positions.
    pub max_open_positions: usize,
}

impl RiskBrain {
    pub fn new(ladder: RiskLadder, regimes: RegimeMultipliers, skip_floor: f64) -> Self {
        Self {
            ladder,
            regimes,
            skip_floor,
            min_reward_risk: 0.0,
            max_open_positions: usize::MAX,
        }
    }

    /// Combined sizing multiplier for the current account and regime.
    pub fn combined_multiplier(&self, account: &AccountState, regime: Regime) -> f64 {
        self.ladder.multiplier(account.drawdown()) * self.regimes.get(regime)
    }

    /// Classify a proposed engagement into allow-full / allow-reduced /
    /// skip, scaling the requested size by the combined multiplier.
    pub fn triage(
        &self,
        account: &AccountState,
        regime: Regime,
        engagement: &Engagement,
    ) -> Triage {
        let multiplier = self.combined_multiplier(account, regime);
        if multiplier < self.skip_floor {
            return Triage::Skip { multiplier };
        }
        if (1.0 - multiplier).abs() <= FULL_SIZE_TOLERANCE {
            Triage::AllowFull { size: engagement.size }
        } else {
            Triage::AllowReduced {
                size: engagement.size * multiplier,
                multiplier,
            }
        }
    }
}
