//! Cash-Flow Calculator
//!
//! Scalar, path-independent income and spending per age. Every simulated path
//! sees the same cash flows in a given year; only returns differ.

use serde::{Deserialize, Serialize};

use crate::model::Scenario;

fn grown(amount: f64, rate: f64, years: i32) -> f64 {
    amount * (1.0 + rate).powi(years)
}

/// Consulting ladder plus every active income stream, before tax
#[must_use]
pub fn year_income(scenario: &Scenario, age: u32) -> f64 {
    let ladder = &scenario.consulting;
    let mut income = 0.0;
    if age >= ladder.start_age && age - ladder.start_age < ladder.years {
        income += grown(
            ladder.start_amount,
            ladder.growth,
            (age - ladder.start_age) as i32,
        );
    }
    for stream in &scenario.incomes {
        if (stream.start_age..=stream.end_age).contains(&age) {
            income += grown(
                stream.monthly * 12.0,
                stream.cola,
                (age - stream.start_age) as i32,
            );
        }
    }
    income
}

/// Base or reduced spending, inflated from the scenario's current age
#[must_use]
pub fn year_spending(scenario: &Scenario, age: u32) -> f64 {
    let spending = &scenario.spending;
    let base = if age >= spending.reduce_at_age {
        spending.reduced_annual
    } else {
        spending.base_annual
    };
    grown(
        base,
        spending.inflation,
        age as i32 - scenario.current_age as i32,
    )
}

/// Everything the evolution loop needs for one simulated year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearCashFlow {
    pub age: u32,
    pub income: f64,
    pub income_tax: f64,
    /// Income after tax, never negative
    pub net_income: f64,
    pub spending: f64,
    /// Spending not covered by net income, never negative
    pub net_withdrawal: f64,
    pub withdrawal_tax: f64,
    /// Net withdrawal grossed up for tax; what leaves the portfolio
    pub gross_withdrawal: f64,
    pub lump: f64,
    pub toys: f64,
}

impl YearCashFlow {
    #[must_use]
    pub fn for_age(scenario: &Scenario, age: u32) -> Self {
        let taxes = &scenario.taxes;
        let income = year_income(scenario, age);
        let spending = year_spending(scenario, age);

        let income_tax = income * taxes.taxable_income_ratio * taxes.effective_rate;
        let net_income = (income - income_tax).max(0.0);
        let net_withdrawal = (spending - net_income).max(0.0);
        let withdrawal_tax = net_withdrawal * taxes.taxable_portfolio_ratio * taxes.effective_rate;

        // a later lump at the same age replaces an earlier one
        let lump = scenario
            .lumps
            .iter()
            .rev()
            .find(|l| l.age == age)
            .map_or(0.0, |l| l.amount);
        let toys = scenario
            .toys
            .iter()
            .filter(|t| t.age == age)
            .map(|t| t.amount)
            .sum();

        Self {
            age,
            income,
            income_tax,
            net_income,
            spending,
            net_withdrawal,
            withdrawal_tax,
            gross_withdrawal: net_withdrawal + withdrawal_tax,
            lump,
            toys,
        }
    }
}

/// One [`YearCashFlow`] per simulated year, ages `current_age + 1 ..= end_age`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub years: Vec<YearCashFlow>,
}

impl CashFlowSchedule {
    #[must_use]
    pub fn build(scenario: &Scenario) -> Self {
        let years = (scenario.current_age + 1..=scenario.end_age)
            .map(|age| YearCashFlow::for_age(scenario, age))
            .collect();
        Self { years }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.years.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &YearCashFlow> {
        self.years.iter()
    }
}
