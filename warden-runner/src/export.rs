//! Result export: trade ledger to CSV, full report to JSON.

use std::path::Path;

use thiserror::Error;

use warden_core::domain::ClosedTrade;

use crate::runner::RunReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the closed-trade ledger as CSV, one row per trade.
pub fn write_trades_csv(path: impl AsRef<Path>, trades: &[ClosedTrade]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "opened_at",
        "closed_at",
        "direction",
        "entry_price",
        "exit_price",
        "size",
        "gross_pnl",
        "fees",
        "slippage",
        "net_pnl",
        "reason",
        "bars_held",
        "partial_fills",
    ])?;
    for trade in trades {
        writer.write_record([
            trade.opened_at.to_rfc3339(),
            trade.closed_at.to_rfc3339(),
            trade.direction.to_string(),
            format!("{:.6}", trade.entry_price),
            format!("{:.6}", trade.exit_price),
            format!("{:.2}", trade.size),
            format!("{:.4}", trade.gross_pnl),
            format!("{:.4}", trade.fees),
            format!("{:.4}", trade.slippage),
            format!("{:.4}", trade.net_pnl),
            trade.reason.to_string(),
            trade.bars_held.to_string(),
            trade.partial_fills.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the full run report as pretty-printed JSON.
pub fn write_report_json(path: impl AsRef<Path>, report: &RunReport) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::runner::execute;
    use chrono::{TimeZone, Utc};
    use warden_core::domain::{CloseReason, Direction};

    fn sample_trade() -> ClosedTrade {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        ClosedTrade {
            direction: Direction::Long,
            entry_price: 1.1000,
            exit_price: 1.1060,
            size: 10_000.0,
            gross_pnl: 60.0,
            fees: 2.0,
            slippage: 1.0,
            net_pnl: 57.0,
            reason: CloseReason::TakeProfit,
            bars_held: 9,
            partial_fills: 1,
            opened_at: t0,
            closed_at: t0 + chrono::Duration::hours(9),
        }
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        write_trades_csv(&path, &[sample_trade(), sample_trade()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("opened_at,closed_at,direction"));
        assert!(lines[1].contains("take_profit"));
        assert!(lines[1].contains("long"));
    }

    #[test]
    fn empty_ledger_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        write_trades_csv(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn report_json_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = execute(&RunConfig::default()).unwrap();
        write_report_json(&path, &report).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.trades.len(), report.trades.len());
    }
}
