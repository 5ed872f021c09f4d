//! TradeWarden core: domain types, safety laws, risk brain, position
//! lifecycle, and the simulation driver.
//!
//! This crate contains the whole decision core:
//! - Domain types (bars, engagements, positions, closed trades, account)
//! - Safety laws (Tourniquet, Winner, Zombie) with the ratchet invariant
//! - Risk brain (drawdown ladder, regime multipliers, triage)
//! - Position lifecycle state machine and the bar-by-bar driver
//! - Live routing over the same lifecycle manager and risk brain
//!
//! The backtest driver and the runtime router share the lifecycle manager
//! and risk brain by construction; the decision logic is never forked
//! between the two paths.

pub mod domain;
pub mod engine;
pub mod laws;
pub mod live;
pub mod risk;
