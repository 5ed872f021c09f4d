//! Synthetic bar generation for demos and tests.
//!
//! A seeded random walk: identical seeds produce identical series on every
//! platform, which keeps demo runs and regression tests reproducible. Real
//! market data enters the system through the `BarFeed` trait instead.

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use warden_core::domain::Bar;

/// Parameters for one synthetic series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticFeedConfig {
    pub bars: usize,
    pub seed: u64,
    pub start_price: f64,
    /// Per-bar drift in basis points.
    pub drift_bps: f64,
    /// Per-bar volatility in basis points.
    pub vol_bps: f64,
}

impl Default for SyntheticFeedConfig {
    fn default() -> Self {
        Self {
            bars: 2_000,
            seed: 42,
            start_price: 1.1000,
            drift_bps: 0.2,
            vol_bps: 8.0,
        }
    }
}

/// Generate an ordered, gap-free hourly bar series from the config's seed.
pub fn generate_bars(config: &SyntheticFeedConfig) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut price = config.start_price;
    let mut bars = Vec::with_capacity(config.bars);

    for i in 0..config.bars {
        let drift = config.drift_bps / 10_000.0;
        let shock = rng.gen_range(-1.0..1.0) * config.vol_bps / 10_000.0;
        let open = price;
        let close = (open * (1.0 + drift + shock)).max(open * 0.5);
        let wick_up: f64 = rng.gen_range(0.0..1.0) * config.vol_bps / 10_000.0;
        let wick_down: f64 = rng.gen_range(0.0..1.0) * config.vol_bps / 10_000.0;
        let high = open.max(close) * (1.0 + wick_up);
        let low = open.min(close) * (1.0 - wick_down);
        let volume = 500.0 + rng.gen_range(0.0..1_500.0);

        bars.push(Bar {
            timestamp: t0 + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }
    bars
}
