//! Bar feed: the pull-based market data contract.
//!
//! A feed yields bars one at a time and signals end-of-stream explicitly
//! (`Ok(None)`), distinct from an error. Integrity violations are fatal to
//! the run: silently skipping or reordering bars would corrupt
//! reproducibility.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::Bar;

/// Fatal feed-integrity failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    #[error("bar at {next} arrived after bar at {prev}: feed is out of order")]
    OutOfOrder { prev: DateTime<Utc>, next: DateTime<Utc> },
    #[error("duplicate bar timestamp {0}")]
    DuplicateTimestamp(DateTime<Utc>),
    #[error("malformed bar at {timestamp}: {detail}")]
    MalformedBar { timestamp: DateTime<Utc>, detail: String },
}

/// A lazy, ordered, finite-or-infinite source of bars.
///
/// Consumers pull one bar at a time. `Ok(None)` is the explicit
/// end-of-stream marker; a live adapter that merely has nothing yet must
/// block rather than return it.
pub trait BarFeed {
    fn next_bar(&mut self) -> Result<Option<Bar>, FeedError>;
}

/// In-memory feed over a pre-built bar series. The workhorse for backtests
/// and tests.
#[derive(Debug, Clone)]
pub struct SliceFeed {
    bars: Vec<Bar>,
    cursor: usize,
}

impl SliceFeed {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl BarFeed for SliceFeed {
    fn next_bar(&mut self) -> Result<Option<Bar>, FeedError> {
        let bar = self.bars.get(self.cursor).cloned();
        if bar.is_some() {
            self.cursor += 1;
        }
        Ok(bar)
    }
}

/// Stateful integrity check applied by the driver to every bar it pulls.
#[derive(Debug, Default, Clone)]
pub struct IntegrityCheck {
    last_timestamp: Option<DateTime<Utc>>,
}

impl IntegrityCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate ordering and sanity of the next bar.
    pub fn admit(&mut self, bar: &Bar) -> Result<(), FeedError> {
        if !bar.is_sane() {
            return Err(FeedError::MalformedBar {
                timestamp: bar.timestamp,
                detail: "OHLCV sanity check failed".to_string(),
            });
        }
        if let Some(prev) = self.last_timestamp {
            if bar.timestamp == prev {
                return Err(FeedError::DuplicateTimestamp(bar.timestamp));
            }
            if bar.timestamp < prev {
                return Err(FeedError::OutOfOrder { prev, next: bar.timestamp });
            }
        }
        self.last_timestamp = Some(bar.timestamp);
        Ok(())
    }
}
