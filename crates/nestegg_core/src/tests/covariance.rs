//! Tests for the covariance builder
//!
//! These tests verify that:
//! - The Cholesky factor reproduces the covariance matrix
//! - Building twice from the same assumptions is idempotent
//! - Non-positive-definite and asymmetric correlation input is rejected
//! - The log-space factor exists for the default assumptions

use crate::covariance::{CovarianceModel, cholesky_factor, covariance_matrix};
use crate::error::ConfigurationError;
use crate::model::{Asset, AssetMatrix, CapitalMarketAssumptions};

#[test]
fn test_factor_reproduces_covariance() {
    let model = CovarianceModel::from_assumptions(&CapitalMarketAssumptions::default()).unwrap();
    let rebuilt = model.cholesky * model.cholesky.transpose();
    for (a, b) in rebuilt.iter().zip(model.covariance.iter()) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }
    // lower triangular
    assert_eq!(model.cholesky[(0, 1)], 0.0);
    assert_eq!(model.cholesky[(3, 4)], 0.0);
}

/// Building twice yields bit-identical matrices
#[test]
fn test_builder_is_idempotent() {
    let cma = CapitalMarketAssumptions::default();
    let first = CovarianceModel::from_assumptions(&cma).unwrap();
    let second = CovarianceModel::from_assumptions(&cma).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_non_positive_definite_correlation_is_rejected() {
    let mut cma = CapitalMarketAssumptions::default();
    // stocks tracking both bonds and crypto while those two move opposite
    cma.corr.stocks.bonds = 0.99;
    cma.corr.bonds.stocks = 0.99;
    cma.corr.stocks.crypto = 0.99;
    cma.corr.crypto.stocks = 0.99;
    cma.corr.bonds.crypto = -0.99;
    cma.corr.crypto.bonds = -0.99;
    assert_eq!(
        CovarianceModel::from_assumptions(&cma),
        Err(ConfigurationError::NotPositiveDefinite {
            matrix: "covariance"
        })
    );
}

#[test]
fn test_semi_definite_input_is_rejected() {
    let mut cma = CapitalMarketAssumptions::default();
    cma.vol.cash = 0.0;
    assert!(matches!(
        CovarianceModel::from_assumptions(&cma),
        Err(ConfigurationError::NotPositiveDefinite { .. })
    ));
}

#[test]
fn test_asymmetric_correlation_is_rejected() {
    let mut cma = CapitalMarketAssumptions::default();
    cma.corr.stocks.bonds = 0.3;
    assert_eq!(
        CovarianceModel::from_assumptions(&cma),
        Err(ConfigurationError::AsymmetricCorrelation {
            row: Asset::Stocks.name(),
            col: Asset::Bonds.name(),
        })
    );
}

#[test]
fn test_log_space_factor_for_defaults() {
    let cma = CapitalMarketAssumptions::default();
    let model = CovarianceModel::from_assumptions(&cma).unwrap();
    let chol_log = model.log_space_cholesky(&cma.expected_returns()).unwrap();
    let s = Asset::Stocks.index();
    // sqrt(0.17^2 / 1.08^2 + 1e-18)
    assert!((chol_log[(s, s)] - 0.17 / 1.08).abs() < 1e-9);
}

#[test]
fn test_cholesky_of_diagonal_matrix() {
    let cov = covariance_matrix(
        &CapitalMarketAssumptions::default().volatilities(),
        &AssetMatrix::identity(),
    );
    let l = cholesky_factor(&cov, "covariance").unwrap();
    let c = Asset::Crypto.index();
    assert!((l[(c, c)] - 0.80).abs() < 1e-12);
}
