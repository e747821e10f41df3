use rand::RngCore;
use tracing::debug;

use super::jumps::{ActiveJumps, JumpTable, SequenceRisk, TailToggles};
use super::kernels::{
    StudentBody, add_asset_jumps, add_jumps, bernoulli_jumps, compound_jumps, correlate,
    exp_with_floor,
};
use super::{ReturnGenerator, ReturnTensor};
use crate::covariance::CovarianceModel;
use crate::error::ConfigurationError;
use crate::model::{ASSET_COUNT, AssetMatrix, AssetVector};

/// Pilot means are clipped into this range before the drift correction
const PILOT_MEAN_RANGE: (f64, f64) = (-0.95, 5.0);

/// Kou jump-diffusion in log-return space.
///
/// Steps per draw:
/// 1. correlated, unit-variance Student-t body around `ln(1 + mu)`
/// 2. at most one market co-jump per (year, path)
/// 3. capped Poisson idiosyncratic jumps per asset
/// 4. `exp(x) - 1`, then the per-asset floor
///
/// With `pilot_paths > 0` a one-year pilot of that many paths is drawn first
/// from the same generator and the log drift is shifted once so realised
/// arithmetic means match `mu`.
#[derive(Debug, Clone)]
pub struct LogSafeGenerator {
    mu: AssetVector,
    mu_log: AssetVector,
    cholesky_log: AssetMatrix,
    body: StudentBody,
    jumps: ActiveJumps,
    sequence_risk: SequenceRisk,
    pilot_paths: usize,
}

impl LogSafeGenerator {
    pub fn new(
        mu: AssetVector,
        covariance: &CovarianceModel,
        df: f64,
        table: &JumpTable,
        toggles: &TailToggles,
        sequence_risk: SequenceRisk,
        pilot_paths: usize,
    ) -> Result<Self, ConfigurationError> {
        // exp of an unscaled heavy-tailed body overflows to +inf
        if df.is_nan() || df <= 2.0 {
            return Err(ConfigurationError::InvalidDistribution {
                name: "Student-t",
                reason: "log-space body needs more than 2 degrees of freedom",
            });
        }
        Ok(Self {
            mu,
            mu_log: mu.map(f64::ln_1p),
            cholesky_log: covariance.log_space_cholesky(&mu)?,
            body: StudentBody::new(df)?,
            jumps: table.adjusted(toggles),
            sequence_risk,
            pilot_paths,
        })
    }

    /// Log drift after the pilot correction
    fn corrected_drift(&self, rng: &mut dyn RngCore) -> Result<AssetVector, ConfigurationError> {
        if self.pilot_paths == 0 {
            return Ok(self.mu_log);
        }
        let pilot = self.simulate(1, self.pilot_paths, &self.mu_log, rng)?;
        let realised = pilot.asset_means();
        let target = self.mu.map(f64::ln_1p);
        let achieved = realised.map(|m| m.clamp(PILOT_MEAN_RANGE.0, PILOT_MEAN_RANGE.1).ln_1p());
        let delta = target - achieved;
        debug!(
            pilot_paths = self.pilot_paths,
            max_shift = delta.amax(),
            "applied pilot drift correction"
        );
        Ok(self.mu_log + delta)
    }

    fn simulate(
        &self,
        years: usize,
        paths: usize,
        mu_log: &AssetVector,
        rng: &mut dyn RngCore,
    ) -> Result<ReturnTensor, ConfigurationError> {
        let cells = years * paths;
        let mut buf = vec![0.0; cells * ASSET_COUNT];
        self.body.fill(&mut buf, rng);
        correlate(&mut buf, &self.cholesky_log, mu_log);

        let market = &self.jumps.market;
        let base = market.params.intensity;
        let intensity = |year: usize| self.sequence_risk.intensity(base, year);
        if let Some(jumps) = bernoulli_jumps(years, paths, &market.params, intensity, rng) {
            add_jumps(&mut buf, &jumps, &market.loadings());
        }

        for (asset, params) in self.jumps.per_asset.iter() {
            let cap = self.jumps.max_idiosyncratic_jumps;
            if let Some(jumps) = compound_jumps(cells, params, cap, rng)? {
                add_asset_jumps(&mut buf, &jumps, asset.index());
            }
        }

        exp_with_floor(&mut buf, &self.jumps.floor);
        Ok(ReturnTensor::from_raw(years, paths, buf))
    }
}

impl ReturnGenerator for LogSafeGenerator {
    fn name(&self) -> &'static str {
        "log-safe"
    }

    fn generate(
        &self,
        years: usize,
        paths: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ReturnTensor, ConfigurationError> {
        let drift = self.corrected_drift(rng)?;
        self.simulate(years, paths, &drift, rng)
    }
}
