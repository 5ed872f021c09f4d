//! TradeWarden runner: run orchestration around the core engine.
//!
//! - Serializable `RunConfig` (TOML) with content-addressed run ids
//! - Seeded synthetic bar generation for demos and tests
//! - Performance metrics over the equity curve and trade ledger
//! - Pack sweeps over law/risk parameter grids (rayon)
//! - CSV/JSON export of ledgers and reports

pub mod config;
pub mod demo;
pub mod export;
pub mod metrics;
pub mod pack;
pub mod runner;
pub mod synthetic;

pub use config::{ConfigError, RunConfig, StrategyConfig};
pub use export::{write_report_json, write_trades_csv, ExportError};
pub use metrics::PerformanceMetrics;
pub use pack::{PackGrid, PackSweep, SweepResults};
pub use runner::{execute, RunError, RunReport};
pub use synthetic::{generate_bars, SyntheticFeedConfig};
