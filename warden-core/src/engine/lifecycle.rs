//! Position lifecycle manager: the bar-by-bar state machine.
//!
//! Owns every open position and advances each one per bar:
//!
//! 1. A new engagement runs through validation, risk-brain triage, then the
//!    hard gates (Tourniquet ceiling, reward/risk floor, position cap).
//! 2. Each bar, stop-loss is checked **before** take-profit: when both are
//!    crossed inside one bar, the conservative assumption is that the stop
//!    filled first.
//! 3. After fills, the safety laws run in precedence order and any stop
//!    mutation is applied through the ratchet.
//! 4. At feed exhaustion, whatever is still open is force-closed at the
//!    last close.
//!
//! Account equity is updated here, after every fill and close, and nowhere
//! else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountState, Bar, CloseReason, ClosedTrade, Direction, Engagement, EngagementError, Position,
};
use crate::laws::{self, LawConfig, LawKind, PositionVerdict};
use crate::risk::{Regime, RiskBrain};

use super::costs::CostModel;

/// Remaining size below this is treated as fully closed.
const SIZE_EPSILON: f64 = 1e-9;

/// Why an engagement was refused before opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Failed local validation; the strategy may retry later.
    Invalid { error: EngagementError },
    /// Tourniquet: proposed stop distance at or past the hard ceiling.
    StopTooWide { pips: f64, max: f64 },
    /// Best take-profit pays too little for the risk taken.
    RewardRiskTooLow { ratio: f64, min: f64 },
    /// Too many positions already open.
    PositionCapReached { open: usize, max: usize },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Invalid { error } => write!(f, "invalid engagement: {error}"),
            RejectReason::StopTooWide { pips, max } => {
                write!(f, "stop {pips:.1} pips at or past ceiling {max:.1}")
            }
            RejectReason::RewardRiskTooLow { ratio, min } => {
                write!(f, "reward/risk {ratio:.2} below floor {min:.2}")
            }
            RejectReason::PositionCapReached { open, max } => {
                write!(f, "{open} positions open, cap is {max}")
            }
        }
    }
}

/// Result of proposing one engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementOutcome {
    Opened { size: f64 },
    /// Risk brain skipped the engagement; not an error.
    Skipped { multiplier: f64 },
    Rejected { reason: RejectReason },
}

/// One engagement decision, recorded for later analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub entry: f64,
    pub outcome: EngagementOutcome,
}

/// The state machine owning all open positions for one instrument.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    laws: LawConfig,
    costs: CostModel,
    positions: Vec<Position>,
    next_position_id: u64,
}

impl LifecycleManager {
    pub fn new(laws: LawConfig, costs: CostModel) -> Self {
        Self {
            laws,
            costs,
            positions: Vec::new(),
            next_position_id: 1,
        }
    }

    pub fn laws(&self) -> &LawConfig {
        &self.laws
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Unrealized PnL of all open positions at the given price.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.positions.iter().map(|p| p.unrealized_pnl(price)).sum()
    }

    /// Evaluate a new engagement: triage first, hard gates second, then
    /// open at the risk-scaled size.
    ///
    /// Opening charges entry-side commission and slippage to the account
    /// immediately.
    pub fn propose(
        &mut self,
        bar: &Bar,
        engagement: &Engagement,
        brain: &RiskBrain,
        regime: Regime,
        account: &mut AccountState,
    ) -> EngagementOutcome {
        if let Err(error) = engagement.validate() {
            return EngagementOutcome::Rejected {
                reason: RejectReason::Invalid { error },
            };
        }

        // Risk triage decides size (or skips) before any hard gate runs.
        let size = match brain.triage(account, regime, engagement) {
            crate::risk::Triage::Skip { multiplier } => {
                return EngagementOutcome::Skipped { multiplier };
            }
            crate::risk::Triage::AllowFull { size } => size,
            crate::risk::Triage::AllowReduced { size, .. } => size,
        };

        if laws::tourniquet::rejects_engagement(&self.laws, engagement) {
            return EngagementOutcome::Rejected {
                reason: RejectReason::StopTooWide {
                    pips: engagement.stop_pips,
                    max: self.laws.max_stop_pips,
                },
            };
        }

        if brain.min_reward_risk > 0.0 {
            let ratio = engagement.best_reward_risk(self.laws.pip_size);
            if ratio < brain.min_reward_risk {
                return EngagementOutcome::Rejected {
                    reason: RejectReason::RewardRiskTooLow {
                        ratio,
                        min: brain.min_reward_risk,
                    },
                };
            }
        }

        if self.positions.len() >= brain.max_open_positions {
            return EngagementOutcome::Rejected {
                reason: RejectReason::PositionCapReached {
                    open: self.positions.len(),
                    max: brain.max_open_positions,
                },
            };
        }

        let id = crate::domain::PositionId(self.next_position_id);
        self.next_position_id += 1;
        let mut position = Position::open(id, engagement, size, self.laws.pip_size, bar.timestamp);
        let fee = self.costs.commission(engagement.entry, size);
        let slip = self.costs.slippage(engagement.entry, size, bar.range_fraction());
        position.fees_paid += fee;
        position.slippage_paid += slip;
        account.apply_pnl(-(fee + slip));
        self.positions.push(position);

        EngagementOutcome::Opened { size }
    }

    /// Advance every open position one bar. Returns the trades that closed.
    pub fn step(&mut self, bar: &Bar, account: &mut AccountState) -> Vec<ClosedTrade> {
        let mut closed = Vec::new();
        let laws = self.laws.clone();
        let costs = self.costs.clone();

        for position in &mut self.positions {
            position.observe_bar(bar);

            // Stop before take-profit: the conservative intrabar ordering.
            if stop_crossed(position, bar) {
                let exit = stop_exit_price(position, bar);
                closed.push(close_remaining(
                    position,
                    exit,
                    CloseReason::StopLoss,
                    bar,
                    &costs,
                    account,
                ));
                continue;
            }

            if let Some(final_exit) = fill_take_profits(position, bar, &costs, account) {
                let mut record = finish_record(position, bar, CloseReason::TakeProfit);
                record.exit_price = final_exit;
                closed.push(record);
                continue;
            }

            match laws::evaluate_position(&laws, position) {
                // Only Tourniquet force-closes; Winner and Zombie mutate.
                PositionVerdict::ForceClose(_) => {
                    closed.push(close_remaining(
                        position,
                        bar.close,
                        CloseReason::Tourniquet,
                        bar,
                        &costs,
                        account,
                    ));
                }
                PositionVerdict::MoveStop { price, law } => {
                    apply_stop_move(position, price, law, &laws);
                }
                PositionVerdict::Hold => {}
            }
        }

        self.positions.retain(|p| !p.is_closed());
        closed
    }

    /// Force-close every open position, e.g. at feed exhaustion.
    pub fn force_close_all(
        &mut self,
        bar: &Bar,
        reason: CloseReason,
        account: &mut AccountState,
    ) -> Vec<ClosedTrade> {
        let costs = self.costs.clone();
        let mut closed = Vec::new();
        for position in &mut self.positions {
            closed.push(close_remaining(
                position,
                bar.close,
                reason,
                bar,
                &costs,
                account,
            ));
        }
        self.positions.clear();
        closed
    }

    /// Force-close a single position by index (live routing: sink refusal).
    pub fn force_close(
        &mut self,
        index: usize,
        bar: &Bar,
        reason: CloseReason,
        account: &mut AccountState,
    ) -> Option<ClosedTrade> {
        if index >= self.positions.len() {
            return None;
        }
        let costs = self.costs.clone();
        let trade = close_remaining(
            &mut self.positions[index],
            bar.close,
            reason,
            bar,
            &costs,
            account,
        );
        self.positions.remove(index);
        Some(trade)
    }
}

fn stop_crossed(position: &Position, bar: &Bar) -> bool {
    match position.direction {
        Direction::Long => bar.low <= position.stop_price,
        Direction::Short => bar.high >= position.stop_price,
    }
}

/// Exit price for a stop fill. A bar that gaps through the stop fills at
/// its open, not at the stop level.
fn stop_exit_price(position: &Position, bar: &Bar) -> f64 {
    match position.direction {
        Direction::Long => bar.open.min(position.stop_price),
        Direction::Short => bar.open.max(position.stop_price),
    }
}

/// Fill every take-profit level this bar crossed, nearest first.
/// Returns the final fill price when the position fully closed on its
/// last level.
fn fill_take_profits(
    position: &mut Position,
    bar: &Bar,
    costs: &CostModel,
    account: &mut AccountState,
) -> Option<f64> {
    while let Some(tp) = position.take_profits.first().copied() {
        let crossed = match position.direction {
            Direction::Long => bar.high >= tp.price,
            Direction::Short => bar.low <= tp.price,
        };
        if !crossed {
            return None;
        }
        position.take_profits.remove(0);

        let fill_size = (tp.fraction * position.initial_size).min(position.remaining_size);
        let sign = position.direction.sign();
        let gross = (tp.price - position.entry_price) * sign * fill_size;
        let fee = costs.commission(tp.price, fill_size);
        let slip = costs.slippage(tp.price, fill_size, bar.range_fraction());

        position.remaining_size -= fill_size;
        position.partial_filled = true;
        position.tp_fills += 1;
        position.realized_gross += gross;
        position.fees_paid += fee;
        position.slippage_paid += slip;
        account.apply_pnl(gross - fee - slip);

        if position.remaining_size <= SIZE_EPSILON {
            position.remaining_size = 0.0;
            return Some(tp.price);
        }
    }
    None
}

/// Close whatever remains of a position at `exit` and emit its record.
fn close_remaining(
    position: &mut Position,
    exit: f64,
    reason: CloseReason,
    bar: &Bar,
    costs: &CostModel,
    account: &mut AccountState,
) -> ClosedTrade {
    let size = position.remaining_size;
    let sign = position.direction.sign();
    let gross = (exit - position.entry_price) * sign * size;
    let fee = costs.commission(exit, size);
    let slip = costs.slippage(exit, size, bar.range_fraction());

    position.remaining_size = 0.0;
    position.realized_gross += gross;
    position.fees_paid += fee;
    position.slippage_paid += slip;
    account.apply_pnl(gross - fee - slip);

    let mut record = finish_record(position, bar, reason);
    record.exit_price = exit;
    record
}

/// Build the terminal record from a position's accumulated state.
fn finish_record(position: &Position, bar: &Bar, reason: CloseReason) -> ClosedTrade {
    // When the final event was itself a take-profit fill, it does not count
    // as a partial.
    let partial_fills = match reason {
        CloseReason::TakeProfit => position.tp_fills.saturating_sub(1),
        _ => position.tp_fills,
    };
    ClosedTrade {
        direction: position.direction,
        entry_price: position.entry_price,
        // Callers override with the actual fill price.
        exit_price: bar.close,
        size: position.initial_size,
        gross_pnl: position.realized_gross,
        fees: position.fees_paid,
        slippage: position.slippage_paid,
        net_pnl: position.realized_gross - position.fees_paid - position.slippage_paid,
        reason,
        bars_held: position.bars_held,
        partial_fills,
        opened_at: position.opened_at,
        closed_at: bar.timestamp,
    }
}

/// Apply a law-proposed stop move through the ratchet and update the flags
/// the law maintains.
fn apply_stop_move(position: &mut Position, price: f64, law: LawKind, laws: &LawConfig) {
    position.stop_price = laws::ratchet(position.direction, position.stop_price, price);
    match law {
        LawKind::Winner => position.breakeven_locked = true,
        LawKind::Zombie => {
            if laws.zombie_after_bars > 0 {
                position.zombie_steps = (position.bars_held / laws.zombie_after_bars) as u32;
            }
        }
        LawKind::Tourniquet => {}
    }
}
