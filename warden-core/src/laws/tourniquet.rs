//! Tourniquet: the hard ceiling on stop distance.
//!
//! An engagement whose proposed stop distance reaches the ceiling is never
//! opened. An open position whose stop distance has been pushed past the
//! ceiling is force-closed at market. The ceiling is unconditional; no
//! other rule can override it.

use crate::domain::{Engagement, Position};

use super::LawConfig;

/// Whether a proposed engagement must be rejected outright.
pub fn rejects_engagement(config: &LawConfig, engagement: &Engagement) -> bool {
    engagement.stop_pips >= config.max_stop_pips
}

/// Whether an open position's current stop distance breaches the ceiling.
///
/// The distance is measured from entry to the stop on the losing side; a
/// stop already moved past entry (breakeven or better) can never breach.
pub fn breaches_ceiling(config: &LawConfig, position: &Position) -> bool {
    let distance_pips = position.stop_distance() / config.pip_size;
    distance_pips >= config.max_stop_pips
}
