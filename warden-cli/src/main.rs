//! TradeWarden CLI: single simulation runs and pack sweeps.
//!
//! Commands:
//! - `run`: execute one simulation from a TOML config (or defaults) and
//!   print the summary; optionally export the ledger and report
//! - `sweep`: run a pack grid over the law thresholds and print a
//!   leaderboard
//! - `init-config`: write the default config as a starting point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use warden_runner::{
    execute, write_report_json, write_trades_csv, PackGrid, PackSweep, RunConfig, RunReport,
};

#[derive(Parser)]
#[command(name = "warden", about = "TradeWarden: trade simulation and risk-gating engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one simulation run.
    Run {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the closed-trade ledger as CSV to this path.
        #[arg(long)]
        export_trades: Option<PathBuf>,

        /// Write the full report as JSON to this path.
        #[arg(long)]
        export_report: Option<PathBuf>,
    },
    /// Sweep the default law-threshold grid and print a leaderboard.
    Sweep {
        /// Path to a TOML config file used as the sweep base.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run packs sequentially instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Leaderboard length.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Write the default configuration to a TOML file.
    InitConfig {
        /// Output path.
        #[arg(long, default_value = "warden.toml")]
        path: PathBuf,
    },
}

fn load_config(path: &Option<PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn print_summary(report: &RunReport) {
    let m = &report.metrics;
    println!("run        {}", &report.run_id[..16]);
    println!("bars       {}", report.bar_count);
    println!("trades     {}", m.trade_count);
    println!("skipped    {}", report.skipped_count());
    println!("rejected   {}", report.rejected_count());
    println!("return     {:+.2}%", m.total_return * 100.0);
    println!("max dd     {:.2}%", m.max_drawdown.abs() * 100.0);
    println!("win rate   {:.1}%", m.win_rate * 100.0);
    println!("pf         {:.2}", m.profit_factor);
    println!("expectancy {:+.2}", m.expectancy);
    println!("fees       {:.2}", m.total_fees);
    println!("slippage   {:.2}", m.total_slippage);
    println!("equity     {:.2}", report.account.equity);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, export_trades, export_report } => {
            let config = load_config(&config)?;
            let report = execute(&config).context("simulation run failed")?;
            print_summary(&report);
            if let Some(path) = export_trades {
                write_trades_csv(&path, &report.trades)
                    .with_context(|| format!("writing ledger to {}", path.display()))?;
                println!("ledger written to {}", path.display());
            }
            if let Some(path) = export_report {
                write_report_json(&path, &report)
                    .with_context(|| format!("writing report to {}", path.display()))?;
                println!("report written to {}", path.display());
            }
        }
        Commands::Sweep { config, sequential, top } => {
            let base = load_config(&config)?;
            let grid = PackGrid::law_defaults();
            println!("sweeping {} packs...", grid.size());
            let results = PackSweep::new()
                .with_parallelism(!sequential)
                .sweep_with_progress(&grid, &base, |index, total, report| {
                    println!(
                        "  [{}/{}] {} return {:+.2}% trades {}",
                        index + 1,
                        total,
                        &report.run_id[..12],
                        report.metrics.total_return * 100.0,
                        report.metrics.trade_count,
                    );
                })
                .context("pack sweep failed")?;

            println!("\ntop {} by return:", top);
            for report in results.top_n(top) {
                let laws = &report.config.laws;
                println!(
                    "  {:+.2}%  max_stop {:>4.0}p  winner_rr {:.1}  zombie {:>3} bars  trades {}",
                    report.metrics.total_return * 100.0,
                    laws.max_stop_pips,
                    laws.winner_rr_threshold,
                    laws.zombie_after_bars,
                    report.metrics.trade_count,
                );
            }
        }
        Commands::InitConfig { path } => {
            let config = RunConfig::default();
            let text = toml::to_string_pretty(&config).context("serializing default config")?;
            std::fs::write(&path, text)
                .with_context(|| format!("writing config to {}", path.display()))?;
            println!("default config written to {}", path.display());
        }
    }

    Ok(())
}
