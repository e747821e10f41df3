use serde::{Deserialize, Serialize};

/// Terminal-year balance percentiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndBalancePercentiles {
    pub p20: f64,
    pub p50: f64,
    pub p80: f64,
}

/// Result of one simulation run.
///
/// Every trajectory has one entry per age in `ages`, starting at the current
/// age (the initial balance) and ending at the end age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub ages: Vec<u32>,
    pub median: Vec<f64>,
    pub p20: Vec<f64>,
    pub p80: Vec<f64>,
    pub end_balance_percentiles: EndBalancePercentiles,
    /// Fraction of paths whose terminal balance is strictly positive
    pub success_prob: f64,
}

/// Row-major `(years + 1) x paths` balance store. Row 0 holds the starting
/// balance; row `y` the balance at the end of simulated year `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceMatrix {
    rows: usize,
    paths: usize,
    data: Vec<f64>,
}

impl BalanceMatrix {
    /// Every path starts from `initial`; later rows are zero until evolved
    #[must_use]
    pub fn new(rows: usize, paths: usize, initial: f64) -> Self {
        let mut data = vec![0.0; rows * paths];
        if rows > 0 {
            data[..paths].fill(initial);
        }
        Self { rows, paths, data }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn paths(&self) -> usize {
        self.paths
    }

    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.paths..(index + 1) * self.paths]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.paths.max(1)).take(self.rows)
    }

    /// Final-year balances
    #[must_use]
    pub fn terminal(&self) -> &[f64] {
        self.row(self.rows.saturating_sub(1))
    }

    /// Previous row (read-only) and row `index` (mutable), for an in-place
    /// year step. `index` must be at least 1.
    pub fn step_rows(&mut self, index: usize) -> (&[f64], &mut [f64]) {
        let (head, tail) = self.data.split_at_mut(index * self.paths);
        (&head[(index - 1) * self.paths..], &mut tail[..self.paths])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
