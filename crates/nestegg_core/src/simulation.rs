//! Portfolio Evolution Loop
//!
//! [`Engine`] ties the pieces together for one scenario:
//!
//! 1. validate the scenario and build the covariance model
//! 2. aggregate accounts into one static allocation
//! 3. draw the whole return tensor once from a single seeded generator
//! 4. step every path forward year by year
//! 5. reduce the balance matrix to a [`SimulationSummary`]
//!
//! Each call to [`Engine::run`] owns its buffers and random generator, so one
//! engine can be run repeatedly and separate engines can run concurrently.

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cash_flows::{CashFlowSchedule, YearCashFlow};
use crate::covariance::CovarianceModel;
use crate::error::{ConfigurationError, Result};
use crate::model::{
    Account, AssetVector, BalanceMatrix, BlackSwanEvent, Scenario, SimulationSummary,
};
use crate::returns::{
    GaussianGenerator, JumpTable, LogSafeGenerator, ResearchGenerator, ReturnGenerator,
    ReturnTensor, SequenceRisk, TailToggles,
};
use crate::summary::summarize;

pub const DEFAULT_PILOT_PATHS: usize = 40_000;

/// Which return generator to use when the scenario enables fat tails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorKind {
    #[default]
    LogSafe,
    Research,
    Disabled,
}

impl GeneratorKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            GeneratorKind::LogSafe => "log-safe",
            GeneratorKind::Research => "research",
            GeneratorKind::Disabled => "disabled",
        }
    }
}

/// Engine settings that are not part of the scenario itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub generator: GeneratorKind,
    /// `None` draws fresh entropy on every run
    pub seed: Option<u64>,
    /// One-year pilot size for the log-safe drift correction; 0 disables it
    pub pilot_paths: usize,
    pub sequence_risk: SequenceRisk,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorKind::default(),
            seed: None,
            pilot_paths: DEFAULT_PILOT_PATHS,
            sequence_risk: SequenceRisk::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_generator(mut self, generator: GeneratorKind) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_pilot_paths(mut self, pilot_paths: usize) -> Self {
        self.pilot_paths = pilot_paths;
        self
    }

    #[must_use]
    pub fn with_sequence_risk(mut self, sequence_risk: SequenceRisk) -> Self {
        self.sequence_risk = sequence_risk;
        self
    }
}

/// Everything one run produced, for callers that need more than the summary
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub ages: Vec<u32>,
    pub returns: ReturnTensor,
    /// `[year][path]` portfolio returns
    pub portfolio_returns: Vec<f64>,
    pub cash_flows: CashFlowSchedule,
    pub balances: BalanceMatrix,
    pub summary: SimulationSummary,
}

/// Monte Carlo engine for a single validated scenario
pub struct Engine<'a> {
    scenario: &'a Scenario,
    config: EngineConfig,
    covariance: CovarianceModel,
    weights: AssetVector,
    initial_balance: f64,
    generator: Box<dyn ReturnGenerator>,
}

impl<'a> Engine<'a> {
    pub fn new(scenario: &'a Scenario, config: EngineConfig) -> Result<Self> {
        scenario.validate()?;
        let covariance = CovarianceModel::from_assumptions(&scenario.cma)?;
        let (weights, initial_balance) = portfolio_weights(&scenario.accounts)?;
        let generator = build_generator(scenario, &config, &covariance)?;

        debug!(
            generator = generator.name(),
            years = scenario.horizon(),
            paths = scenario.sims,
            initial_balance,
            "engine ready"
        );

        Ok(Self {
            scenario,
            config,
            covariance,
            weights,
            initial_balance,
            generator,
        })
    }

    #[must_use]
    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Balance-weighted allocation, fixed for the whole horizon
    #[must_use]
    pub fn weights(&self) -> &AssetVector {
        &self.weights
    }

    #[must_use]
    pub fn covariance(&self) -> &CovarianceModel {
        &self.covariance
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<SimulationSummary> {
        Ok(self.simulate()?.summary)
    }

    pub fn simulate(&self) -> Result<SimulationOutput> {
        let started = Instant::now();
        let years = self.scenario.horizon();
        let paths = self.scenario.sims;

        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let returns = self.generator.generate(years, paths, &mut rng)?;
        let portfolio_returns = returns.portfolio_returns(&self.weights);

        let cash_flows = CashFlowSchedule::build(self.scenario);
        let balances = evolve_balances(
            self.initial_balance,
            &cash_flows,
            &portfolio_returns,
            paths,
            self.scenario.active_black_swan(),
        );

        let ages = self.scenario.ages();
        let summary = summarize(ages.clone(), &balances);

        info!(
            generator = self.generator.name(),
            years,
            paths,
            success_prob = summary.success_prob,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation complete"
        );

        Ok(SimulationOutput {
            ages,
            returns,
            portfolio_returns,
            cash_flows,
            balances,
            summary,
        })
    }
}

/// Balance-weighted aggregate allocation and the total starting balance
pub fn portfolio_weights(
    accounts: &[Account],
) -> std::result::Result<(AssetVector, f64), ConfigurationError> {
    let total: f64 = accounts.iter().map(|a| a.balance).sum();
    if total <= 0.0 {
        return Err(ConfigurationError::NonPositiveBalance { total });
    }
    let weights = accounts.iter().fold(AssetVector::zeros(), |acc, account| {
        acc + account.normalized_allocation() * (account.balance / total)
    });
    Ok((weights, total))
}

fn build_generator(
    scenario: &Scenario,
    config: &EngineConfig,
    covariance: &CovarianceModel,
) -> std::result::Result<Box<dyn ReturnGenerator>, ConfigurationError> {
    let cma = &scenario.cma;
    let mu = cma.expected_returns();
    let kind = if cma.fat_tails {
        config.generator
    } else {
        GeneratorKind::Disabled
    };
    let toggles = TailToggles::from_assumptions(cma, scenario.active_black_swan().is_some());

    let generator: Box<dyn ReturnGenerator> = match kind {
        GeneratorKind::LogSafe => Box::new(LogSafeGenerator::new(
            mu,
            covariance,
            cma.t_df,
            &JumpTable::kou_logsafe(),
            &toggles,
            config.sequence_risk,
            config.pilot_paths,
        )?),
        GeneratorKind::Research => Box::new(ResearchGenerator::new(
            mu,
            covariance,
            cma.t_df,
            &JumpTable::research(),
            &toggles,
        )?),
        GeneratorKind::Disabled => Box::new(GaussianGenerator::new(mu, covariance)),
    };
    if kind != GeneratorKind::Disabled {
        debug!(?toggles, "tail toggles");
    }
    Ok(generator)
}

/// Advance one path by one year.
///
/// Lump and scripted drop at the start of the year, half the year's growth,
/// the mid-year outflows, then the other half. A depleted path stays at zero.
#[must_use]
pub fn step_balance(
    previous: f64,
    portfolio_return: f64,
    flow: &YearCashFlow,
    drop: Option<f64>,
) -> f64 {
    if previous <= 0.0 {
        return 0.0;
    }
    let mut start = previous + flow.lump;
    if let Some(drop) = drop {
        start *= 1.0 - drop;
    }
    let half = 1.0 + portfolio_return / 2.0;
    let mid = start * half - flow.toys - flow.gross_withdrawal;
    if mid <= 0.0 {
        return 0.0;
    }
    (mid * half).max(0.0)
}

/// Run every path through the schedule. Row 0 is `initial` everywhere.
#[must_use]
pub fn evolve_balances(
    initial: f64,
    schedule: &CashFlowSchedule,
    portfolio_returns: &[f64],
    paths: usize,
    black_swan: Option<&BlackSwanEvent>,
) -> BalanceMatrix {
    let mut balances = BalanceMatrix::new(schedule.len() + 1, paths, initial);

    for (i, flow) in schedule.iter().enumerate() {
        let year = i + 1;
        let returns = &portfolio_returns[i * paths..year * paths];
        let drop = black_swan
            .filter(|event| event.age == flow.age)
            .map(|event| event.portfolio_drop);
        if drop.is_some() {
            debug!(age = flow.age, ?drop, "scripted drop applied");
        }

        let (previous, next) = balances.step_rows(year);

        #[cfg(feature = "parallel")]
        next.par_iter_mut()
            .zip(previous.par_iter())
            .zip(returns.par_iter())
            .for_each(|((b, p), r)| *b = step_balance(*p, *r, flow, drop));

        #[cfg(not(feature = "parallel"))]
        next.iter_mut()
            .zip(previous.iter())
            .zip(returns.iter())
            .for_each(|((b, p), r)| *b = step_balance(*p, *r, flow, drop));
    }

    balances
}
