//! Drawdown ladder: tiered risk multipliers keyed on realized drawdown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One ladder tier: at or past `drawdown`, size by `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadderTier {
    pub drawdown: f64,
    pub multiplier: f64,
}

/// Ladder construction failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LadderError {
    #[error("ladder must have at least one tier")]
    Empty,
    #[error("first tier must start at drawdown 0.0, got {0}")]
    MissingBaseTier(f64),
    #[error("tier thresholds must be strictly increasing (tier {index})")]
    NonIncreasingThreshold { index: usize },
    #[error("multipliers must be non-increasing as drawdown deepens (tier {index})")]
    IncreasingMultiplier { index: usize },
    #[error("multiplier {0} must be in (0, 1]")]
    MultiplierOutOfRange(f64),
    #[error("threshold {0} must be in [0, 1)")]
    ThresholdOutOfRange(f64),
}

/// Ordered set of drawdown tiers with monotonically decreasing multipliers.
///
/// Lookup picks the tier with the greatest threshold not exceeding the
/// current drawdown; the mandatory base tier at 0.0 guarantees the lookup
/// is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLadder {
    tiers: Vec<LadderTier>,
}

impl RiskLadder {
    pub fn new(tiers: Vec<LadderTier>) -> Result<Self, LadderError> {
        let first = tiers.first().ok_or(LadderError::Empty)?;
        if first.drawdown != 0.0 {
            return Err(LadderError::MissingBaseTier(first.drawdown));
        }
        for (index, pair) in tiers.windows(2).enumerate() {
            if pair[1].drawdown <= pair[0].drawdown {
                return Err(LadderError::NonIncreasingThreshold { index: index + 1 });
            }
            if pair[1].multiplier > pair[0].multiplier {
                return Err(LadderError::IncreasingMultiplier { index: index + 1 });
            }
        }
        for tier in &tiers {
            if !(tier.multiplier > 0.0 && tier.multiplier <= 1.0) {
                return Err(LadderError::MultiplierOutOfRange(tier.multiplier));
            }
            if !(0.0..1.0).contains(&tier.drawdown) {
                return Err(LadderError::ThresholdOutOfRange(tier.drawdown));
            }
        }
        Ok(Self { tiers })
    }

    /// Default ladder: full size until 5% drawdown, then stepped cuts.
    pub fn conservative_default() -> Self {
        Self::new(vec![
            LadderTier { drawdown: 0.00, multiplier: 1.00 },
            LadderTier { drawdown: 0.05, multiplier: 0.75 },
            LadderTier { drawdown: 0.10, multiplier: 0.50 },
            LadderTier { drawdown: 0.20, multiplier: 0.25 },
        ])
        .expect("default ladder tiers are valid")
    }

    /// Multiplier for the given drawdown: greatest tier threshold not
    /// exceeding it.
    pub fn multiplier(&self, drawdown: f64) -> f64 {
        let dd = drawdown.max(0.0);
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.drawdown <= dd)
            .map(|tier| tier.multiplier)
            // Unreachable given the mandatory base tier, but total anyway.
            .unwrap_or(1.0)
    }

    pub fn tiers(&self) -> &[LadderTier] {
        &self.tiers
    }
}
