//! Integration tests for the nestegg engine
//!
//! Tests are organized by topic:
//! - `covariance` - Covariance and Cholesky construction
//! - `returns` - Return generators: bounds, calibration, reproducibility
//! - `cash_flows` - Income, spending, taxes and one-time events per age
//! - `simulation` - Evolution loop and engine wiring
//! - `scenario` - End-to-end runs and fat-tail impact ordering
//! - `properties` - Randomised invariants (proptest)

mod cash_flows;
mod covariance;
mod returns;

use crate::model::{Account, Asset, ConsultingLadder, Scenario, Spending, Taxes};

/// One account, 100% stocks, no cash flows and no taxes
pub(crate) fn all_stock_scenario(balance: f64, years: u32, sims: usize) -> Scenario {
    let mut scenario =
        Scenario::with_accounts(vec![Account::new("401k", balance).with(Asset::Stocks, 1.0)]);
    scenario.current_age = 55;
    scenario.end_age = 55 + years;
    scenario.sims = sims;
    scenario.spending = Spending {
        base_annual: 0.0,
        reduced_annual: 0.0,
        reduce_at_age: 65,
        inflation: 0.0,
    };
    scenario.consulting = ConsultingLadder {
        start_age: 55,
        years: 0,
        start_amount: 0.0,
        growth: 0.0,
    };
    scenario.taxes = Taxes {
        effective_rate: 0.0,
        taxable_portfolio_ratio: 0.0,
        taxable_income_ratio: 0.0,
    };
    scenario
}

/// 60/40 retiree drawing 60k a year for 35 years
pub(crate) fn sixty_forty_scenario(sims: usize) -> Scenario {
    let mut scenario = Scenario::with_accounts(vec![
        Account::new("401k", 1_500_000.0)
            .with(Asset::Stocks, 0.6)
            .with(Asset::Bonds, 0.4),
    ]);
    scenario.name = "SixtyForty".to_string();
    scenario.sims = sims;
    scenario.spending = Spending {
        base_annual: 60_000.0,
        reduced_annual: 60_000.0,
        reduce_at_age: 65,
        inflation: 0.025,
    };
    scenario.consulting = ConsultingLadder {
        start_age: 55,
        years: 0,
        start_amount: 0.0,
        growth: 0.0,
    };
    scenario.taxes = Taxes {
        effective_rate: 0.15,
        taxable_portfolio_ratio: 0.5,
        taxable_income_ratio: 1.0,
    };
    scenario
}
