use rand::RngCore;

use super::jumps::{ActiveJumps, JumpTable, TailToggles};
use super::kernels::{StudentBody, add_asset_jumps, add_jumps, clip, compound_jumps, correlate};
use super::{ReturnGenerator, ReturnTensor};
use crate::covariance::CovarianceModel;
use crate::error::ConfigurationError;
use crate::model::{ASSET_COUNT, AssetMatrix, AssetVector};

/// Student-t body plus Kou jumps added directly to arithmetic returns.
///
/// Market jumps are Poisson counted with no cap, so the result relies on the
/// table's `[floor, cap]` clip to stay above -100%.
#[derive(Debug, Clone)]
pub struct ResearchGenerator {
    mu: AssetVector,
    cholesky: AssetMatrix,
    body: StudentBody,
    jumps: ActiveJumps,
}

impl ResearchGenerator {
    pub fn new(
        mu: AssetVector,
        covariance: &CovarianceModel,
        df: f64,
        table: &JumpTable,
        toggles: &TailToggles,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            mu,
            cholesky: covariance.cholesky,
            body: StudentBody::new(df)?,
            jumps: table.adjusted(toggles),
        })
    }
}

impl ReturnGenerator for ResearchGenerator {
    fn name(&self) -> &'static str {
        "research"
    }

    fn generate(
        &self,
        years: usize,
        paths: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ReturnTensor, ConfigurationError> {
        let cells = years * paths;
        let mut buf = vec![0.0; cells * ASSET_COUNT];
        self.body.fill(&mut buf, rng);
        correlate(&mut buf, &self.cholesky, &self.mu);

        let market = &self.jumps.market;
        if let Some(jumps) = compound_jumps(cells, &market.params, None, rng)? {
            add_jumps(&mut buf, &jumps, &market.loadings());
        }

        for (asset, params) in self.jumps.per_asset.iter() {
            let capped = self.jumps.max_idiosyncratic_jumps;
            if let Some(jumps) = compound_jumps(cells, params, capped, rng)? {
                add_asset_jumps(&mut buf, &jumps, asset.index());
            }
        }

        clip(&mut buf, &self.jumps.floor, self.jumps.cap.as_ref());
        Ok(ReturnTensor::from_raw(years, paths, buf))
    }
}
