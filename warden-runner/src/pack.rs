//! Pack sweeps: grid expansion over law and risk parameters.
//!
//! A pack is one parameter combination run through the simulation. Packs
//! are embarrassingly parallel: every run owns its account, positions, and
//! feed seed, so the sweep fans out over rayon with no shared mutable
//! state beyond collecting results.

use rayon::prelude::*;

use crate::config::RunConfig;
use crate::runner::{execute, RunError, RunReport};

/// Parameter ranges to sweep over, crossed combinatorially.
#[derive(Debug, Clone)]
pub struct PackGrid {
    pub max_stop_pips: Vec<f64>,
    pub winner_rr_thresholds: Vec<f64>,
    pub zombie_after_bars: Vec<usize>,
    pub skip_floors: Vec<f64>,
}

impl PackGrid {
    /// A small default grid over the law thresholds.
    pub fn law_defaults() -> Self {
        Self {
            max_stop_pips: vec![20.0, 40.0, 60.0],
            winner_rr_thresholds: vec![1.5, 2.0, 3.0],
            zombie_after_bars: vec![12, 24, 48],
            skip_floors: vec![0.3],
        }
    }

    /// Total number of packs in this grid.
    pub fn size(&self) -> usize {
        self.max_stop_pips.len()
            * self.winner_rr_thresholds.len()
            * self.zombie_after_bars.len()
            * self.skip_floors.len()
    }

    /// Expand the grid against a base configuration, one config per pack.
    pub fn expand(&self, base: &RunConfig) -> Vec<RunConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &max_stop in &self.max_stop_pips {
            for &winner_rr in &self.winner_rr_thresholds {
                for &zombie in &self.zombie_after_bars {
                    for &floor in &self.skip_floors {
                        let mut config = base.clone();
                        config.laws.max_stop_pips = max_stop;
                        config.laws.winner_rr_threshold = winner_rr;
                        config.laws.zombie_after_bars = zombie;
                        config.skip_floor = floor;
                        configs.push(config);
                    }
                }
            }
        }
        configs
    }
}

/// Sweep executor: runs every pack, optionally in parallel.
#[derive(Debug, Clone)]
pub struct PackSweep {
    parallel: bool,
}

impl PackSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every pack in the grid. Results arrive in grid order regardless
    /// of scheduling.
    pub fn sweep(&self, grid: &PackGrid, base: &RunConfig) -> Result<SweepResults, RunError> {
        let configs = grid.expand(base);
        let reports: Vec<RunReport> = if self.parallel {
            configs
                .par_iter()
                .map(execute)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs.iter().map(execute).collect::<Result<Vec<_>, _>>()?
        };
        Ok(SweepResults::new(reports))
    }

    /// Sweep with a progress callback invoked after each pack completes.
    pub fn sweep_with_progress<F>(
        &self,
        grid: &PackGrid,
        base: &RunConfig,
        progress: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &RunReport) + Send + Sync,
    {
        let configs = grid.expand(base);
        let total = configs.len();
        let reports: Vec<RunReport> = if self.parallel {
            configs
                .par_iter()
                .enumerate()
                .map(|(index, config)| {
                    let report = execute(config)?;
                    progress(index, total, &report);
                    Ok(report)
                })
                .collect::<Result<Vec<_>, RunError>>()?
        } else {
            configs
                .iter()
                .enumerate()
                .map(|(index, config)| {
                    let report = execute(config)?;
                    progress(index, total, &report);
                    Ok(report)
                })
                .collect::<Result<Vec<_>, RunError>>()?
        };
        Ok(SweepResults::new(reports))
    }
}

impl Default for PackSweep {
    fn default() -> Self {
        Self::new()
    }
}

/// All reports from one sweep.
#[derive(Debug)]
pub struct SweepResults {
    reports: Vec<RunReport>,
}

impl SweepResults {
    fn new(reports: Vec<RunReport>) -> Self {
        Self { reports }
    }

    pub fn all(&self) -> &[RunReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Reports sorted by total return, best first.
    pub fn sorted_by_return(&self) -> Vec<&RunReport> {
        let mut sorted: Vec<_> = self.reports.iter().collect();
        sorted.sort_by(|a, b| {
            b.metrics
                .total_return
                .partial_cmp(&a.metrics.total_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn best(&self) -> Option<&RunReport> {
        self.sorted_by_return().into_iter().next()
    }

    pub fn top_n(&self, n: usize) -> Vec<&RunReport> {
        self.sorted_by_return().into_iter().take(n).collect()
    }
}
