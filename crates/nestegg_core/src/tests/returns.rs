//! Tests for the return generators
//!
//! These tests verify that:
//! - Fat-tail generators never produce a return at or below -100%, for
//!   every toggle combination
//! - The log-safe generator matches historical equity calibration bands
//! - The pilot correction pulls realised means back to the target
//! - A seed fixes the whole tensor
//! - The Gaussian generator has the configured mean and correlation

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::covariance::CovarianceModel;
use crate::error::ConfigurationError;
use crate::model::{Asset, CapitalMarketAssumptions};
use crate::returns::{
    GaussianGenerator, JumpTable, LogSafeGenerator, ResearchGenerator, ReturnGenerator,
    SequenceRisk, TailFrequency, TailMagnitude, TailSkew, TailToggles,
};
use crate::simulation::DEFAULT_PILOT_PATHS;
use crate::summary::DistributionStats;

fn all_toggles() -> Vec<TailToggles> {
    let mut out = Vec::new();
    for magnitude in [TailMagnitude::Standard, TailMagnitude::Extreme] {
        for frequency in [TailFrequency::Standard, TailFrequency::High] {
            for skew in [TailSkew::Negative, TailSkew::Neutral, TailSkew::Positive] {
                out.push(TailToggles {
                    magnitude,
                    frequency,
                    skew,
                    black_swan_active: false,
                });
            }
        }
    }
    out
}

fn log_safe(cma: &CapitalMarketAssumptions, df: f64, toggles: &TailToggles) -> LogSafeGenerator {
    let covariance = CovarianceModel::from_assumptions(cma).unwrap();
    LogSafeGenerator::new(
        cma.expected_returns(),
        &covariance,
        df,
        &JumpTable::kou_logsafe(),
        toggles,
        SequenceRisk::default(),
        DEFAULT_PILOT_PATHS,
    )
    .unwrap()
}

fn research(cma: &CapitalMarketAssumptions, toggles: &TailToggles) -> ResearchGenerator {
    let covariance = CovarianceModel::from_assumptions(cma).unwrap();
    ResearchGenerator::new(
        cma.expected_returns(),
        &covariance,
        cma.t_df,
        &JumpTable::research(),
        toggles,
    )
    .unwrap()
}

/// 10 years x 10,000 paths, every asset, every toggle combination
#[test]
fn test_no_impossible_returns_log_safe() {
    let cma = CapitalMarketAssumptions::default();
    for (i, toggles) in all_toggles().iter().enumerate() {
        let generator = log_safe(&cma, 4.0, toggles);
        let mut rng = SmallRng::seed_from_u64(100 + i as u64);
        let tensor = generator.generate(10, 10_000, &mut rng).unwrap();
        assert!(
            tensor.min() > -1.0,
            "{toggles:?} produced {}",
            tensor.min()
        );
        assert!(tensor.as_slice().iter().all(|r| r.is_finite()));
    }
}

#[test]
fn test_no_impossible_returns_research() {
    let mut cma = CapitalMarketAssumptions::default();
    cma.t_df = 3.0;
    for (i, toggles) in all_toggles().iter().enumerate() {
        let generator = research(&cma, toggles);
        let mut rng = SmallRng::seed_from_u64(200 + i as u64);
        let tensor = generator.generate(10, 10_000, &mut rng).unwrap();
        assert!(
            tensor.min() > -1.0,
            "{toggles:?} produced {}",
            tensor.min()
        );
        let crypto_max = tensor.asset_values(Asset::Crypto).fold(f64::MIN, f64::max);
        assert!(crypto_max <= 3.0);
    }
}

/// Single year, 100,000 paths, 8% / 17% equity, standard toggles, df = 6
#[test]
fn test_log_safe_equity_calibration() {
    let cma = CapitalMarketAssumptions::default();
    let generator = log_safe(&cma, 6.0, &TailToggles::default());
    let mut rng = SmallRng::seed_from_u64(2024);
    let tensor = generator.generate(1, 100_000, &mut rng).unwrap();

    let stocks: Vec<f64> = tensor.asset_values(Asset::Stocks).collect();
    let stats = DistributionStats::from_values(&stocks).unwrap();

    assert!((0.065..=0.095).contains(&stats.mean), "mean {}", stats.mean);
    assert!((0.14..=0.21).contains(&stats.std_dev), "std {}", stats.std_dev);
    assert!((-0.30..=-0.15).contains(&stats.q05), "p05 {}", stats.q05);
    assert!((-0.50..=-0.25).contains(&stats.q01), "p01 {}", stats.q01);
    assert!(
        (-0.40..=-0.20).contains(&stats.expected_shortfall_05),
        "es05 {}",
        stats.expected_shortfall_05
    );
}

#[test]
fn test_pilot_correction_tracks_target_mean() {
    let cma = CapitalMarketAssumptions::default();
    let generator = log_safe(&cma, 6.0, &TailToggles::default());
    let mut rng = SmallRng::seed_from_u64(9);
    let means = generator.generate(1, 100_000, &mut rng).unwrap().asset_means();

    let bonds = means[Asset::Bonds.index()];
    let cash = means[Asset::Cash.index()];
    assert!((bonds - 0.045).abs() < 0.005, "bonds mean {bonds}");
    assert!((cash - 0.03).abs() < 0.002, "cash mean {cash}");
}

#[test]
fn test_same_seed_same_tensor() {
    let cma = CapitalMarketAssumptions::default();
    let generator = log_safe(&cma, 12.0, &TailToggles::default());
    let a = generator
        .generate(5, 1_000, &mut SmallRng::seed_from_u64(7))
        .unwrap();
    let b = generator
        .generate(5, 1_000, &mut SmallRng::seed_from_u64(7))
        .unwrap();
    assert_eq!(a, b);

    let c = generator
        .generate(5, 1_000, &mut SmallRng::seed_from_u64(8))
        .unwrap();
    assert_ne!(a, c);
}

#[test]
fn test_gaussian_mean_and_correlation() {
    let cma = CapitalMarketAssumptions::default();
    let covariance = CovarianceModel::from_assumptions(&cma).unwrap();
    let generator = GaussianGenerator::new(cma.expected_returns(), &covariance);
    let mut rng = SmallRng::seed_from_u64(1);
    let tensor = generator.generate(1, 100_000, &mut rng).unwrap();

    let means = tensor.asset_means();
    assert!((means[Asset::Stocks.index()] - 0.08).abs() < 0.003);
    assert!((means[Asset::Bonds.index()] - 0.045).abs() < 0.002);

    let stocks: Vec<f64> = tensor.asset_values(Asset::Stocks).collect();
    let crypto: Vec<f64> = tensor.asset_values(Asset::Crypto).collect();
    let cov = stocks
        .iter()
        .zip(&crypto)
        .map(|(s, c)| (s - 0.08) * (c - 0.20))
        .sum::<f64>()
        / stocks.len() as f64;
    let rho = cov / (0.17 * 0.80);
    assert!((rho - 0.5).abs() < 0.02, "rho {rho}");
}

#[test]
fn test_generator_names() {
    let cma = CapitalMarketAssumptions::default();
    let covariance = CovarianceModel::from_assumptions(&cma).unwrap();
    let toggles = TailToggles::default();
    assert_eq!(log_safe(&cma, 12.0, &toggles).name(), "log-safe");
    assert_eq!(research(&cma, &toggles).name(), "research");
    assert_eq!(
        GaussianGenerator::new(cma.expected_returns(), &covariance).name(),
        "disabled"
    );
}

/// The log-space body is only bounded when the Student-t has a variance
#[test]
fn test_invalid_df_fails_construction() {
    let cma = CapitalMarketAssumptions::default();
    let covariance = CovarianceModel::from_assumptions(&cma).unwrap();
    for df in [-1.0, 1.0, 2.0, f64::NAN] {
        let result = LogSafeGenerator::new(
            cma.expected_returns(),
            &covariance,
            df,
            &JumpTable::kou_logsafe(),
            &TailToggles::default(),
            SequenceRisk::default(),
            0,
        );
        assert!(
            matches!(result, Err(ConfigurationError::InvalidDistribution { .. })),
            "df = {df}"
        );
    }
}
