//! Cost model: commission and slippage for every fill and close.
//!
//! Both costs are deterministic functions of their inputs, which is what
//! makes backtests reproducible: re-running an identical feed and config
//! must price every fill identically. Slippage scales with a volatility
//! proxy (the fill bar's relative range) so violent bars cost more to
//! trade through.

use serde::{Deserialize, Serialize};

/// Commission and slippage parameters, fixed for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Commission in basis points of traded notional, charged per side.
    pub commission_bps: f64,
    /// Base slippage in basis points of traded notional.
    pub slippage_bps: f64,
    /// How strongly the volatility proxy amplifies slippage.
    pub vol_slippage_mult: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            commission_bps: 1.0,
            slippage_bps: 0.5,
            vol_slippage_mult: 2.0,
        }
    }
}

impl CostModel {
    /// Zero-cost model for isolating engine behavior in tests.
    pub fn frictionless() -> Self {
        Self {
            commission_bps: 0.0,
            slippage_bps: 0.0,
            vol_slippage_mult: 0.0,
        }
    }

    /// Commission for a fill: `price * size * bps / 10_000`.
    pub fn commission(&self, price: f64, size: f64) -> f64 {
        price * size.abs() * (self.commission_bps / 10_000.0)
    }

    /// Slippage for a fill, amplified by the bar's relative range.
    ///
    /// `vol_proxy` is expected to be `(high - low) / close` of the fill
    /// bar; negative inputs are treated as zero.
    pub fn slippage(&self, price: f64, size: f64, vol_proxy: f64) -> f64 {
        let base = price * size.abs() * (self.slippage_bps / 10_000.0);
        base * (1.0 + self.vol_slippage_mult * vol_proxy.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_is_free() {
        let costs = CostModel::frictionless();
        assert_eq!(costs.commission(100.0, 1_000.0), 0.0);
        assert_eq!(costs.slippage(100.0, 1_000.0, 0.05), 0.0);
    }

    #[test]
    fn commission_in_basis_points() {
        let costs = CostModel { commission_bps: 10.0, ..CostModel::frictionless() };
        // 100 * 1000 * 10/10000 = 100
        assert!((costs.commission(100.0, 1_000.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn commission_ignores_size_sign() {
        let costs = CostModel { commission_bps: 10.0, ..CostModel::frictionless() };
        assert_eq!(
            costs.commission(100.0, 1_000.0),
            costs.commission(100.0, -1_000.0)
        );
    }

    #[test]
    fn slippage_rises_with_volatility() {
        let costs = CostModel {
            slippage_bps: 1.0,
            vol_slippage_mult: 2.0,
            ..CostModel::frictionless()
        };
        let calm = costs.slippage(100.0, 1_000.0, 0.001);
        let violent = costs.slippage(100.0, 1_000.0, 0.05);
        assert!(violent > calm);
    }

    #[test]
    fn slippage_deterministic() {
        let costs = CostModel::default();
        let a = costs.slippage(1.1, 10_000.0, 0.004);
        let b = costs.slippage(1.1, 10_000.0, 0.004);
        assert_eq!(a, b);
    }

    #[test]
    fn negative_vol_proxy_treated_as_zero() {
        let costs = CostModel {
            slippage_bps: 1.0,
            vol_slippage_mult: 2.0,
            ..CostModel::frictionless()
        };
        assert_eq!(
            costs.slippage(100.0, 1_000.0, -0.5),
            costs.slippage(100.0, 1_000.0, 0.0)
        );
    }
}
