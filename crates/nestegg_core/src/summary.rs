//! Summary Reducer
//!
//! Collapses a balance matrix into percentile trajectories and a success
//! probability. All quantiles use linear interpolation between closest ranks,
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])` with
//! `h = q * (n - 1)`, which matches the default estimator of most numeric
//! libraries.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{BalanceMatrix, EndBalancePercentiles, SimulationSummary};

/// Quantile `q` (in `[0, 1]`) of already sorted values; NaN when empty
#[must_use]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = h.floor() as usize;
            let hi = h.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let w = h - lo as f64;
                sorted[lo] + w * (sorted[hi] - sorted[lo])
            }
        }
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    sorted
}

/// Quantile `q` of unsorted values
#[must_use]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted_copy(values), q)
}

/// Fraction of balances strictly above zero
#[must_use]
pub fn success_probability(terminal: &[f64]) -> f64 {
    if terminal.is_empty() {
        return 0.0;
    }
    terminal.iter().filter(|b| **b > 0.0).count() as f64 / terminal.len() as f64
}

/// Median, p20 and p80 across paths for every row, then the terminal stats
#[must_use]
pub fn summarize(ages: Vec<u32>, balances: &BalanceMatrix) -> SimulationSummary {
    let row_quantiles = |row: &[f64]| {
        let sorted = sorted_copy(row);
        [
            quantile_sorted(&sorted, 0.5),
            quantile_sorted(&sorted, 0.2),
            quantile_sorted(&sorted, 0.8),
        ]
    };

    #[cfg(feature = "parallel")]
    let per_row: Vec<[f64; 3]> = (0..balances.rows())
        .into_par_iter()
        .map(|i| row_quantiles(balances.row(i)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let per_row: Vec<[f64; 3]> = balances.iter_rows().map(row_quantiles).collect();

    let terminal = balances.terminal();
    let sorted_terminal = sorted_copy(terminal);

    SimulationSummary {
        ages,
        median: per_row.iter().map(|q| q[0]).collect(),
        p20: per_row.iter().map(|q| q[1]).collect(),
        p80: per_row.iter().map(|q| q[2]).collect(),
        end_balance_percentiles: EndBalancePercentiles {
            p20: quantile_sorted(&sorted_terminal, 0.2),
            p50: quantile_sorted(&sorted_terminal, 0.5),
            p80: quantile_sorted(&sorted_terminal, 0.8),
        },
        success_prob: success_probability(terminal),
    }
}

/// Moments and tail statistics of a sample of annual returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub q01: f64,
    pub q05: f64,
    pub q50: f64,
    pub q95: f64,
    pub q99: f64,
    /// Mean of the values at or below the 5th percentile
    pub expected_shortfall_05: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionStats {
    /// `None` for an empty sample
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let sorted = sorted_copy(values);
        let q05 = quantile_sorted(&sorted, 0.05);
        let tail: Vec<f64> = sorted.iter().copied().take_while(|v| *v <= q05).collect();
        let expected_shortfall_05 = tail.iter().sum::<f64>() / tail.len().max(1) as f64;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            q01: quantile_sorted(&sorted, 0.01),
            q05,
            q50: quantile_sorted(&sorted, 0.50),
            q95: quantile_sorted(&sorted, 0.95),
            q99: quantile_sorted(&sorted, 0.99),
            expected_shortfall_05,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }
}
