//! Return Generator
//!
//! Draws a `(years, paths, assets)` tensor of annual arithmetic returns.
//! Three interchangeable variants implement [`ReturnGenerator`]:
//!
//! - [`LogSafeGenerator`] - Student-t body and Kou jumps in log space; every
//!   return is `> -1` by construction
//! - [`ResearchGenerator`] - Student-t body and Kou jumps in arithmetic space,
//!   clipped to per-asset bounds
//! - [`GaussianGenerator`] - correlated normal draws, no jumps
//!
//! The variant is picked once when the engine is built; see
//! [`crate::simulation::GeneratorKind`].

mod gaussian;
mod jumps;
mod kernels;
mod log_safe;
mod research;

use rand::RngCore;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::ConfigurationError;
use crate::model::{ASSET_COUNT, Asset, AssetVector};

pub use gaussian::GaussianGenerator;
pub use jumps::{
    ActiveJumps, JumpTable, KouParams, MarketJump, ReturnBounds, SequenceRisk, TailFrequency,
    TailMagnitude, TailSkew, TailToggles, ToggleCalibration,
};
pub use log_safe::LogSafeGenerator;
pub use research::ResearchGenerator;

/// A source of correlated annual asset returns.
///
/// Implementations hold only immutable parameters; all randomness comes from
/// the caller's generator so one seed reproduces the whole tensor.
pub trait ReturnGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        years: usize,
        paths: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ReturnTensor, ConfigurationError>;
}

/// Annual arithmetic returns laid out `[year][path][asset]`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTensor {
    years: usize,
    paths: usize,
    data: Vec<f64>,
}

impl ReturnTensor {
    pub(crate) fn from_raw(years: usize, paths: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), years * paths * ASSET_COUNT);
        Self { years, paths, data }
    }

    #[must_use]
    pub fn years(&self) -> usize {
        self.years
    }

    #[must_use]
    pub fn paths(&self) -> usize {
        self.paths
    }

    #[must_use]
    pub fn get(&self, year: usize, path: usize, asset: Asset) -> f64 {
        self.data[(year * self.paths + path) * ASSET_COUNT + asset.index()]
    }

    /// Every draw for one asset, across all years and paths
    pub fn asset_values(&self, asset: Asset) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .skip(asset.index())
            .step_by(ASSET_COUNT)
            .copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Per-asset mean over all years and paths
    #[must_use]
    pub fn asset_means(&self) -> AssetVector {
        let cells = (self.years * self.paths).max(1) as f64;
        let mut sums = AssetVector::zeros();
        for row in self.data.chunks_exact(ASSET_COUNT) {
            for (s, v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        sums / cells
    }

    /// Smallest return anywhere in the tensor
    #[must_use]
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Portfolio return per `[year][path]` for static `weights`.
    ///
    /// Assets with zero weight are skipped outright, so a draw in an asset the
    /// household does not hold never reaches the portfolio.
    #[must_use]
    pub fn portfolio_returns(&self, weights: &AssetVector) -> Vec<f64> {
        let dot = |row: &[f64]| {
            row.iter()
                .zip(weights.iter())
                .filter(|(_, w)| **w != 0.0)
                .map(|(r, w)| r * w)
                .sum::<f64>()
        };

        #[cfg(feature = "parallel")]
        let out: Vec<f64> = self.data.par_chunks_exact(ASSET_COUNT).map(dot).collect();

        #[cfg(not(feature = "parallel"))]
        let out: Vec<f64> = self.data.chunks_exact(ASSET_COUNT).map(dot).collect();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor() -> ReturnTensor {
        // 1 year, 2 paths
        ReturnTensor::from_raw(
            1,
            2,
            vec![0.10, 0.02, 0.50, 0.01, 0.00, -0.20, 0.04, -0.50, 0.01, 0.00],
        )
    }

    #[test]
    fn test_get_and_asset_values() {
        let t = tensor();
        assert_eq!(t.get(0, 1, Asset::Stocks), -0.20);
        let crypto: Vec<f64> = t.asset_values(Asset::Crypto).collect();
        assert_eq!(crypto, vec![0.50, -0.50]);
        assert_eq!(t.min(), -0.50);
    }

    #[test]
    fn test_portfolio_returns_dot_weights() {
        let t = tensor();
        let mut w = AssetVector::zeros();
        w[Asset::Stocks.index()] = 0.5;
        w[Asset::Bonds.index()] = 0.5;
        let r = t.portfolio_returns(&w);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.06).abs() < 1e-15);
        assert!((r[1] - (-0.08)).abs() < 1e-15);
    }

    #[test]
    fn test_unheld_asset_cannot_poison_portfolio() {
        let t = ReturnTensor::from_raw(1, 1, vec![0.05, 0.02, f64::INFINITY, 0.01, f64::NAN]);
        let mut w = AssetVector::zeros();
        w[Asset::Stocks.index()] = 1.0;
        assert_eq!(t.portfolio_returns(&w), vec![0.05]);
    }

    #[test]
    fn test_asset_means() {
        let means = tensor().asset_means();
        assert!((means[Asset::Stocks.index()] - (-0.05)).abs() < 1e-15);
        assert_eq!(means[Asset::Crypto.index()], 0.0);
    }
}
