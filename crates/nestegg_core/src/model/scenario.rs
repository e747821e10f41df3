//! Scenario inputs
//!
//! A [`Scenario`] is the complete, immutable description of one household:
//! accounts, market assumptions, taxes, spending, income and one-time events.
//! Field defaults match the long-standing example inputs so partially specified
//! scenario files deserialize into something runnable.

use serde::{Deserialize, Serialize};

use super::assets::{Asset, AssetMap, AssetMatrix, AssetVector};
use crate::error::ValidationError;

pub const MIN_SIMS: usize = 500;
pub const MAX_SIMS: usize = 100_000;
/// Longest consulting ladder a scenario may describe
pub const MAX_CONSULTING_YEARS: u32 = 20;

fn default_name() -> String {
    "Base".to_string()
}

fn default_current_age() -> u32 {
    55
}

fn default_end_age() -> u32 {
    90
}

fn default_sims() -> usize {
    10_000
}

fn default_cola() -> f64 {
    0.02
}

/// An investment account and its target mix.
///
/// Allocations need not sum to one; they are renormalised when the portfolio
/// is aggregated. An account with no allocation at all is treated as cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Free-text label ("401k", "IRA", "Taxable", ...)
    pub kind: String,
    pub balance: f64,
    #[serde(default)]
    pub stocks: f64,
    #[serde(default)]
    pub bonds: f64,
    #[serde(default)]
    pub crypto: f64,
    #[serde(default)]
    pub cds: f64,
    #[serde(default)]
    pub cash: f64,
}

impl Account {
    #[must_use]
    pub fn new(kind: impl Into<String>, balance: f64) -> Self {
        Self {
            kind: kind.into(),
            balance,
            stocks: 0.0,
            bonds: 0.0,
            crypto: 0.0,
            cds: 0.0,
            cash: 0.0,
        }
    }

    /// Set the raw allocation fraction for one asset class
    #[must_use]
    pub fn with(mut self, asset: Asset, fraction: f64) -> Self {
        match asset {
            Asset::Stocks => self.stocks = fraction,
            Asset::Bonds => self.bonds = fraction,
            Asset::Crypto => self.crypto = fraction,
            Asset::Cds => self.cds = fraction,
            Asset::Cash => self.cash = fraction,
        }
        self
    }

    /// Allocation exactly as entered
    #[must_use]
    pub fn allocation(&self) -> AssetMap<f64> {
        AssetMap::new(self.stocks, self.bonds, self.crypto, self.cds, self.cash)
    }

    /// Allocation weights summing to one (all cash when nothing was entered)
    #[must_use]
    pub fn normalized_allocation(&self) -> AssetVector {
        let raw = self.allocation();
        let total = raw.sum();
        if total == 0.0 {
            let mut cash_only = AssetVector::zeros();
            cash_only[Asset::Cash.index()] = 1.0;
            return cash_only;
        }
        raw.to_vector() / total
    }
}

/// Expected returns, volatilities and correlations, plus the fat-tail dials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalMarketAssumptions {
    /// Arithmetic annual expected return per asset
    pub exp_ret: AssetMap<f64>,
    /// Annual volatility per asset
    pub vol: AssetMap<f64>,
    /// Symmetric correlation matrix with a unit diagonal
    pub corr: AssetMap<AssetMap<f64>>,
    pub fat_tails: bool,
    /// Student-t degrees of freedom; lower is heavier
    pub t_df: f64,
    /// Skew dial: below 0.9 is negative, above 1.1 positive
    pub tail_boost: f64,
    /// Frequency dial: 0.04 and above selects high frequency
    pub tail_prob: f64,
}

impl Default for CapitalMarketAssumptions {
    fn default() -> Self {
        Self {
            exp_ret: AssetMap::new(0.08, 0.045, 0.20, 0.04, 0.03),
            vol: AssetMap::new(0.17, 0.07, 0.80, 0.02, 0.01),
            corr: AssetMap::new(
                AssetMap::new(1.0, 0.2, 0.5, -0.1, -0.2),
                AssetMap::new(0.2, 1.0, 0.1, 0.3, 0.2),
                AssetMap::new(0.5, 0.1, 1.0, 0.0, -0.1),
                AssetMap::new(-0.1, 0.3, 0.0, 1.0, 0.4),
                AssetMap::new(-0.2, 0.2, -0.1, 0.4, 1.0),
            ),
            fat_tails: true,
            t_df: 12.0,
            tail_boost: 1.0,
            tail_prob: 0.02,
        }
    }
}

impl CapitalMarketAssumptions {
    #[must_use]
    pub fn expected_returns(&self) -> AssetVector {
        self.exp_ret.to_vector()
    }

    #[must_use]
    pub fn volatilities(&self) -> AssetVector {
        self.vol.to_vector()
    }

    #[must_use]
    pub fn correlation(&self) -> AssetMatrix {
        self.corr.to_matrix()
    }
}

/// Two flat effective-rate haircuts; not a bracket model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxes {
    pub effective_rate: f64,
    /// Share of portfolio withdrawals that is taxable
    pub taxable_portfolio_ratio: f64,
    /// Share of income that is taxable
    pub taxable_income_ratio: f64,
}

impl Default for Taxes {
    fn default() -> Self {
        Self {
            effective_rate: 0.20,
            taxable_portfolio_ratio: 0.75,
            taxable_income_ratio: 0.80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spending {
    pub base_annual: f64,
    /// Replaces `base_annual` from `reduce_at_age` onwards
    pub reduced_annual: f64,
    pub reduce_at_age: u32,
    pub inflation: f64,
}

impl Default for Spending {
    fn default() -> Self {
        Self {
            base_annual: 100_000.0,
            reduced_annual: 70_000.0,
            reduce_at_age: 57,
            inflation: 0.02,
        }
    }
}

/// Consulting income for `years` years from `start_age`, growing at `growth`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultingLadder {
    pub start_age: u32,
    pub years: u32,
    pub start_amount: f64,
    pub growth: f64,
}

impl Default for ConsultingLadder {
    fn default() -> Self {
        Self {
            start_age: 55,
            years: 5,
            start_amount: 25_000.0,
            growth: 0.10,
        }
    }
}

/// Recurring monthly income (pension, social security) for ages
/// `start_age..=end_age`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeStream {
    pub start_age: u32,
    pub end_age: u32,
    pub monthly: f64,
    #[serde(default = "default_cola")]
    pub cola: f64,
}

/// One-time inflow (inheritance, home sale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpEvent {
    pub age: u32,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

/// One-time outflow (car, vacation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToyPurchase {
    pub age: u32,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

/// Scripted proportional drop applied at the start of the year the household
/// turns `age`, before any growth.
///
/// The event is opt-in: a `black_swan` block without `enabled: true` is kept
/// on the scenario but never applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackSwanEvent {
    #[serde(default)]
    pub enabled: bool,
    pub age: u32,
    pub portfolio_drop: f64,
}

impl Default for BlackSwanEvent {
    fn default() -> Self {
        Self {
            enabled: false,
            age: 67,
            portfolio_drop: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Label only; the engine never looks at it
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_current_age")]
    pub current_age: u32,
    #[serde(default = "default_end_age")]
    pub end_age: u32,
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub cma: CapitalMarketAssumptions,
    #[serde(default)]
    pub taxes: Taxes,
    #[serde(default)]
    pub spending: Spending,
    #[serde(default)]
    pub consulting: ConsultingLadder,
    #[serde(default)]
    pub incomes: Vec<IncomeStream>,
    #[serde(default)]
    pub lumps: Vec<LumpEvent>,
    #[serde(default)]
    pub toys: Vec<ToyPurchase>,
    #[serde(default)]
    pub black_swan: Option<BlackSwanEvent>,
    /// Number of simulated paths
    #[serde(default = "default_sims")]
    pub sims: usize,
}

impl Scenario {
    /// A scenario with default assumptions and the given accounts
    #[must_use]
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            name: default_name(),
            current_age: default_current_age(),
            end_age: default_end_age(),
            accounts,
            cma: CapitalMarketAssumptions::default(),
            taxes: Taxes::default(),
            spending: Spending::default(),
            consulting: ConsultingLadder::default(),
            incomes: Vec::new(),
            lumps: Vec::new(),
            toys: Vec::new(),
            black_swan: None,
            sims: default_sims(),
        }
    }

    /// Worked example: a 45-year-old couple with three accounts, Social
    /// Security for both from 67, a downsizing at 65 and one big trip.
    #[must_use]
    pub fn example() -> Self {
        Self {
            name: "Example".to_string(),
            current_age: 45,
            end_age: 90,
            accounts: vec![
                Account::new("401k", 800_000.0)
                    .with(Asset::Stocks, 0.7)
                    .with(Asset::Bonds, 0.3),
                Account::new("Taxable", 400_000.0)
                    .with(Asset::Stocks, 0.6)
                    .with(Asset::Bonds, 0.3)
                    .with(Asset::Cash, 0.1),
                Account::new("IRA", 300_000.0)
                    .with(Asset::Stocks, 0.6)
                    .with(Asset::Bonds, 0.4),
            ],
            consulting: ConsultingLadder {
                start_age: 46,
                years: 9,
                start_amount: 100_000.0,
                growth: 0.02,
            },
            spending: Spending {
                base_annual: 80_000.0,
                reduced_annual: 60_000.0,
                reduce_at_age: 65,
                inflation: 0.025,
            },
            incomes: vec![
                IncomeStream {
                    start_age: 55,
                    end_age: 60,
                    monthly: 2_000.0,
                    cola: 0.02,
                },
                IncomeStream {
                    start_age: 67,
                    end_age: 90,
                    monthly: 3_000.0,
                    cola: 0.02,
                },
                IncomeStream {
                    start_age: 67,
                    end_age: 90,
                    monthly: 2_000.0,
                    cola: 0.02,
                },
            ],
            lumps: vec![LumpEvent {
                age: 65,
                amount: 200_000.0,
                description: "Home downsizing".to_string(),
            }],
            toys: vec![ToyPurchase {
                age: 65,
                amount: 30_000.0,
                description: "Dream vacation".to_string(),
            }],
            ..Self::with_accounts(Vec::new())
        }
    }

    /// Number of simulated years
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.end_age.saturating_sub(self.current_age) as usize
    }

    /// `current_age..=end_age`, one entry per balance-matrix row
    #[must_use]
    pub fn ages(&self) -> Vec<u32> {
        (self.current_age..=self.end_age).collect()
    }

    #[must_use]
    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    /// The scripted shock, if one is configured and switched on
    #[must_use]
    pub fn active_black_swan(&self) -> Option<&BlackSwanEvent> {
        self.black_swan.as_ref().filter(|event| event.enabled)
    }

    /// Range and finiteness checks on every scalar input.
    ///
    /// Positive-definiteness of the correlation input and a positive total
    /// balance are checked when the engine is built, since those are
    /// configuration errors rather than field-level ones.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_SIMS..=MAX_SIMS).contains(&self.sims) {
            return Err(ValidationError::SimsOutOfRange { sims: self.sims });
        }
        if self.end_age <= self.current_age {
            return Err(ValidationError::AgeRange {
                current_age: self.current_age,
                end_age: self.end_age,
            });
        }

        for account in &self.accounts {
            finite(&format!("accounts[{}].balance", account.kind), account.balance)?;
            if account.balance < 0.0 {
                return Err(ValidationError::NegativeBalance {
                    account: account.kind.clone(),
                    balance: account.balance,
                });
            }
            for (asset, fraction) in account.allocation().iter() {
                let field = format!("accounts[{}].{asset}", account.kind);
                finite(&field, *fraction)?;
                if *fraction < 0.0 {
                    return Err(ValidationError::FractionOutOfRange {
                        field,
                        value: *fraction,
                    });
                }
            }
        }

        for (asset, mu) in self.cma.exp_ret.iter() {
            let field = format!("cma.exp_ret.{asset}");
            finite(&field, *mu)?;
            // log-space generators take ln(1 + mu)
            if *mu <= -1.0 {
                return Err(ValidationError::FractionOutOfRange { field, value: *mu });
            }
        }
        for (asset, vol) in self.cma.vol.iter() {
            let field = format!("cma.vol.{asset}");
            finite(&field, *vol)?;
            if *vol < 0.0 {
                return Err(ValidationError::FractionOutOfRange { field, value: *vol });
            }
        }
        for (row, values) in self.cma.corr.iter() {
            for (col, rho) in values.iter() {
                let field = format!("cma.corr.{row}.{col}");
                finite(&field, *rho)?;
                if rho.abs() > 1.0 {
                    return Err(ValidationError::FractionOutOfRange { field, value: *rho });
                }
            }
        }
        finite("cma.t_df", self.cma.t_df)?;
        // below 2 degrees of freedom the body has no variance to scale to
        if self.cma.t_df <= 2.0 {
            return Err(ValidationError::FractionOutOfRange {
                field: "cma.t_df".to_string(),
                value: self.cma.t_df,
            });
        }
        finite("cma.tail_boost", self.cma.tail_boost)?;
        finite("cma.tail_prob", self.cma.tail_prob)?;

        unit_fraction("taxes.effective_rate", self.taxes.effective_rate)?;
        unit_fraction(
            "taxes.taxable_portfolio_ratio",
            self.taxes.taxable_portfolio_ratio,
        )?;
        unit_fraction("taxes.taxable_income_ratio", self.taxes.taxable_income_ratio)?;

        finite("spending.base_annual", self.spending.base_annual)?;
        finite("spending.reduced_annual", self.spending.reduced_annual)?;
        finite("spending.inflation", self.spending.inflation)?;
        finite("consulting.start_amount", self.consulting.start_amount)?;
        finite("consulting.growth", self.consulting.growth)?;
        if self.consulting.years > MAX_CONSULTING_YEARS {
            return Err(ValidationError::FractionOutOfRange {
                field: "consulting.years".to_string(),
                value: f64::from(self.consulting.years),
            });
        }

        for (i, stream) in self.incomes.iter().enumerate() {
            finite(&format!("incomes[{i}].monthly"), stream.monthly)?;
            finite(&format!("incomes[{i}].cola"), stream.cola)?;
        }
        for (i, lump) in self.lumps.iter().enumerate() {
            finite(&format!("lumps[{i}].amount"), lump.amount)?;
        }
        for (i, toy) in self.toys.iter().enumerate() {
            finite(&format!("toys[{i}].amount"), toy.amount)?;
        }
        if let Some(event) = &self.black_swan {
            unit_fraction("black_swan.portfolio_drop", event.portfolio_drop)?;
        }

        Ok(())
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue {
            field: field.to_string(),
        })
    }
}

fn unit_fraction(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::FractionOutOfRange {
            field: field.to_string(),
            value,
        })
    }
}
