//! Execution sink: the boundary between the router and a broker.
//!
//! The sink receives the router's decisions (opens, stop adjustments,
//! closes) and acknowledges each one. A rejected open is treated exactly
//! like a local force-close: the position is terminated immediately and
//! the trade is recorded with a sink-rejected reason. Real broker adapters
//! with network I/O, retries, and fill reports live outside the core; the
//! paper sink here is the reference implementation.

use crate::domain::{ClosedTrade, Position, PositionId};

/// Acknowledgement for one sink command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkAck {
    Accepted,
    Rejected(String),
}

impl SinkAck {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SinkAck::Rejected(_))
    }
}

/// Receives accepted orders and position mutations from the router.
pub trait ExecutionSink {
    /// A position was opened at its risk-scaled size.
    fn open(&mut self, position: &Position) -> SinkAck;

    /// A law or fill moved the position's stop.
    fn adjust_stop(&mut self, id: PositionId, new_stop: f64) -> SinkAck;

    /// A position finished; the record is final.
    fn close(&mut self, trade: &ClosedTrade) -> SinkAck;
}

/// In-process paper sink: accepts everything and keeps a command log.
#[derive(Debug, Default)]
pub struct PaperSink {
    pub opened: Vec<(PositionId, f64)>,
    pub stop_adjustments: Vec<(PositionId, f64)>,
    pub closed: Vec<ClosedTrade>,
}

impl PaperSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionSink for PaperSink {
    fn open(&mut self, position: &Position) -> SinkAck {
        self.opened.push((position.id, position.initial_size));
        SinkAck::Accepted
    }

    fn adjust_stop(&mut self, id: PositionId, new_stop: f64) -> SinkAck {
        self.stop_adjustments.push((id, new_stop));
        SinkAck::Accepted
    }

    fn close(&mut self, trade: &ClosedTrade) -> SinkAck {
        self.closed.push(trade.clone());
        SinkAck::Accepted
    }
}
