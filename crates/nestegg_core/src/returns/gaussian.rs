use rand::RngCore;

use super::kernels::{correlate, fill_standard_normal};
use super::{ReturnGenerator, ReturnTensor};
use crate::covariance::CovarianceModel;
use crate::error::ConfigurationError;
use crate::model::{ASSET_COUNT, AssetMatrix, AssetVector};

/// Correlated normal returns, `r = mu + L z`.
///
/// Nothing bounds the draws, so a high-volatility asset can land at or below
/// -100%.
#[derive(Debug, Clone)]
pub struct GaussianGenerator {
    mu: AssetVector,
    cholesky: AssetMatrix,
}

impl GaussianGenerator {
    #[must_use]
    pub fn new(mu: AssetVector, covariance: &CovarianceModel) -> Self {
        Self {
            mu,
            cholesky: covariance.cholesky,
        }
    }
}

impl ReturnGenerator for GaussianGenerator {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn generate(
        &self,
        years: usize,
        paths: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ReturnTensor, ConfigurationError> {
        let mut buf = vec![0.0; years * paths * ASSET_COUNT];
        fill_standard_normal(&mut buf, rng);
        correlate(&mut buf, &self.cholesky, &self.mu);
        Ok(ReturnTensor::from_raw(years, paths, buf))
    }
}
