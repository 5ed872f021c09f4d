//! Risk brain: drawdown ladder, regime multipliers, engagement triage.

pub mod brain;
pub mod ladder;
pub mod regime;

pub use brain::{RiskBrain, Triage};
pub use ladder::{LadderError, LadderTier, RiskLadder};
pub use regime::{Regime, RegimeMultipliers};
