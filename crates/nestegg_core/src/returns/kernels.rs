//! Bulk sampling and transform kernels over `[cell][asset]` buffers
//!
//! A cell is one (year, path) pair. Draws are sequential so a seed fixes
//! every value; transforms run per cell and are parallel when the
//! `parallel` feature is on.

use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal, StudentT};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::jumps::KouParams;
use crate::error::ConfigurationError;
use crate::model::{ASSET_COUNT, AssetMatrix, AssetVector};

/// Run `f(cell, row)` over every asset row of `buf`
pub(crate) fn for_each_cell<F>(buf: &mut [f64], f: F)
where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    buf.par_chunks_mut(ASSET_COUNT)
        .enumerate()
        .for_each(|(cell, row)| f(cell, row));

    #[cfg(not(feature = "parallel"))]
    buf.chunks_mut(ASSET_COUNT)
        .enumerate()
        .for_each(|(cell, row)| f(cell, row));
}

/// Student-t shocks rescaled to unit variance where the variance exists
#[derive(Debug, Clone)]
pub(crate) struct StudentBody {
    dist: StudentT<f64>,
    scale: f64,
}

impl StudentBody {
    pub(crate) fn new(df: f64) -> Result<Self, ConfigurationError> {
        let dist = StudentT::new(df).map_err(|_| ConfigurationError::InvalidDistribution {
            name: "Student-t",
            reason: "degrees of freedom must be positive and finite",
        })?;
        let scale = if df > 2.0 {
            ((df - 2.0) / df).sqrt()
        } else {
            1.0
        };
        Ok(Self { dist, scale })
    }

    pub(crate) fn fill<R: Rng + ?Sized>(&self, buf: &mut [f64], rng: &mut R) {
        for v in buf.iter_mut() {
            *v = self.dist.sample(rng) * self.scale;
        }
    }
}

pub(crate) fn fill_standard_normal<R: Rng + ?Sized>(buf: &mut [f64], rng: &mut R) {
    for v in buf.iter_mut() {
        *v = StandardNormal.sample(rng);
    }
}

/// Replace each row `z` with `chol * z + shift`
pub(crate) fn correlate(buf: &mut [f64], chol: &AssetMatrix, shift: &AssetVector) {
    for_each_cell(buf, |_, row| {
        let z = AssetVector::from_column_slice(row);
        let out = chol * z + shift;
        row.copy_from_slice(out.as_slice());
    });
}

/// Poisson-counted jump totals per cell, each count optionally capped.
///
/// Counts for every cell are drawn before any sizes. Returns `None` when the
/// process is switched off or no cell jumped.
pub(crate) fn compound_jumps<R: Rng + ?Sized>(
    cells: usize,
    params: &KouParams,
    cap: Option<u32>,
    rng: &mut R,
) -> Result<Option<Vec<f64>>, ConfigurationError> {
    if params.intensity <= 0.0 || cells == 0 {
        return Ok(None);
    }
    let poisson =
        Poisson::new(params.intensity).map_err(|_| ConfigurationError::InvalidDistribution {
            name: "Poisson",
            reason: "jump intensity must be positive and finite",
        })?;

    let counts: Vec<u32> = (0..cells)
        .map(|_| {
            let draw: f64 = poisson.sample(rng);
            let n = draw as u32;
            cap.map_or(n, |c| n.min(c))
        })
        .collect();
    if counts.iter().all(|&n| n == 0) {
        return Ok(None);
    }

    let totals = counts
        .iter()
        .map(|&n| (0..n).map(|_| params.sample_size(rng)).sum::<f64>())
        .collect();
    Ok(Some(totals))
}

/// At most one jump per cell, gated by `P = 1 - exp(-lambda_year)`.
///
/// `intensity_for_year` maps the year index to that year's lambda.
pub(crate) fn bernoulli_jumps<R, F>(
    years: usize,
    paths: usize,
    params: &KouParams,
    intensity_for_year: F,
    rng: &mut R,
) -> Option<Vec<f64>>
where
    R: Rng + ?Sized,
    F: Fn(usize) -> f64,
{
    if params.intensity <= 0.0 || years == 0 || paths == 0 {
        return None;
    }

    let mut hits = vec![false; years * paths];
    for (year, row) in hits.chunks_mut(paths).enumerate() {
        let p_event = 1.0 - (-intensity_for_year(year)).exp();
        for hit in row.iter_mut() {
            *hit = rng.random::<f64>() < p_event;
        }
    }
    if !hits.contains(&true) {
        return None;
    }

    Some(
        hits.iter()
            .map(|&hit| if hit { params.sample_size(rng) } else { 0.0 })
            .collect(),
    )
}

/// `row += loadings * jumps[cell]`
pub(crate) fn add_jumps(buf: &mut [f64], jumps: &[f64], loadings: &AssetVector) {
    for_each_cell(buf, |cell, row| {
        let jump = jumps[cell];
        if jump != 0.0 {
            for (v, w) in row.iter_mut().zip(loadings.iter()) {
                *v += w * jump;
            }
        }
    });
}

/// Add a single asset's per-cell jumps
pub(crate) fn add_asset_jumps(buf: &mut [f64], jumps: &[f64], asset: usize) {
    for_each_cell(buf, |cell, row| row[asset] += jumps[cell]);
}

/// Log returns to arithmetic returns, then the per-asset floor
pub(crate) fn exp_with_floor(buf: &mut [f64], floor: &AssetVector) {
    for_each_cell(buf, |_, row| {
        for (v, lo) in row.iter_mut().zip(floor.iter()) {
            *v = v.exp_m1().max(*lo);
        }
    });
}

/// Clip arithmetic returns into `[floor, cap]`
pub(crate) fn clip(buf: &mut [f64], floor: &AssetVector, cap: Option<&AssetVector>) {
    for_each_cell(buf, |_, row| {
        for (i, v) in row.iter_mut().enumerate() {
            let upper = cap.map_or(f64::INFINITY, |c| c[i]);
            *v = v.clamp(floor[i], upper);
        }
    });
}
