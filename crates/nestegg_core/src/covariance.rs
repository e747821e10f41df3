//! Covariance Builder
//!
//! Turns per-asset volatilities and a correlation matrix into a covariance
//! matrix and its lower Cholesky factor. The factor is what the return
//! generators use to correlate independent shocks.

use tracing::debug;

use crate::error::ConfigurationError;
use crate::model::{Asset, AssetMatrix, AssetVector, CapitalMarketAssumptions};

/// Added to the log-space covariance diagonal before factoring
pub const LOG_COVARIANCE_JITTER: f64 = 1e-18;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Covariance matrix and lower Cholesky factor, `cholesky * cholesky^T == covariance`
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceModel {
    pub covariance: AssetMatrix,
    pub cholesky: AssetMatrix,
}

impl CovarianceModel {
    /// Pure function of the assumptions: same input, same matrices.
    pub fn from_assumptions(cma: &CapitalMarketAssumptions) -> Result<Self, ConfigurationError> {
        let corr = cma.correlation();
        check_symmetric(&corr)?;
        let covariance = covariance_matrix(&cma.volatilities(), &corr);
        let cholesky = cholesky_factor(&covariance, "covariance")?;
        Ok(Self {
            covariance,
            cholesky,
        })
    }

    /// Factor of the approximate log-return covariance for arithmetic means `mu`
    pub fn log_space_cholesky(&self, mu: &AssetVector) -> Result<AssetMatrix, ConfigurationError> {
        let cov_log = log_space_covariance(mu, &self.covariance)
            + AssetMatrix::identity() * LOG_COVARIANCE_JITTER;
        let chol = cholesky_factor(&cov_log, "log-space covariance")?;
        debug!(
            jitter = LOG_COVARIANCE_JITTER,
            "factored log-space covariance"
        );
        Ok(chol)
    }
}

/// `outer(vol, vol) ⊙ corr`
#[must_use]
pub fn covariance_matrix(vol: &AssetVector, corr: &AssetMatrix) -> AssetMatrix {
    (vol * vol.transpose()).component_mul(corr)
}

/// First-order log-space approximation: `cov[i][j] / ((1 + mu_i)(1 + mu_j))`
#[must_use]
pub fn log_space_covariance(mu: &AssetVector, cov: &AssetMatrix) -> AssetMatrix {
    let scale = mu.map(|m| 1.0 / (1.0 + m));
    cov.component_mul(&(scale * scale.transpose()))
}

/// Lower Cholesky factor of `matrix`.
///
/// A factor with a zero or non-finite diagonal is rejected as well: it only
/// arises from semi-definite input and would correlate shocks into NaNs.
pub fn cholesky_factor(
    matrix: &AssetMatrix,
    name: &'static str,
) -> Result<AssetMatrix, ConfigurationError> {
    let not_pd = ConfigurationError::NotPositiveDefinite { matrix: name };
    let l = (*matrix).cholesky().ok_or_else(|| not_pd.clone())?.l();
    let degenerate = l.iter().any(|v| !v.is_finite()) || l.diagonal().iter().any(|d| *d <= 0.0);
    if degenerate {
        return Err(not_pd);
    }
    Ok(l)
}

fn check_symmetric(corr: &AssetMatrix) -> Result<(), ConfigurationError> {
    for (i, row) in Asset::ALL.iter().enumerate() {
        for (j, col) in Asset::ALL.iter().enumerate().skip(i + 1) {
            if (corr[(i, j)] - corr[(j, i)]).abs() > SYMMETRY_TOLERANCE {
                return Err(ConfigurationError::AsymmetricCorrelation {
                    row: row.name(),
                    col: col.name(),
                });
            }
        }
    }
    Ok(())
}
