//! Tests for per-age cash flows
//!
//! These tests verify that:
//! - The consulting ladder is active for exactly `years` years and grows
//! - Income streams are inclusive of both end ages and apply COLA
//! - Spending steps down at the reduction age and inflates from today
//! - Taxes are flat haircuts and net figures never go negative
//! - One-time events land on the right age

use crate::cash_flows::{CashFlowSchedule, YearCashFlow, year_income, year_spending};
use crate::model::{
    Account, Asset, ConsultingLadder, IncomeStream, LumpEvent, Scenario, Spending, Taxes,
    ToyPurchase,
};

fn bare() -> Scenario {
    let mut scenario =
        Scenario::with_accounts(vec![Account::new("IRA", 1_000_000.0).with(Asset::Stocks, 1.0)]);
    scenario.current_age = 50;
    scenario.end_age = 80;
    scenario.consulting = ConsultingLadder {
        start_age: 50,
        years: 0,
        start_amount: 0.0,
        growth: 0.0,
    };
    scenario.spending = Spending {
        base_annual: 0.0,
        reduced_annual: 0.0,
        reduce_at_age: 60,
        inflation: 0.0,
    };
    scenario
}

#[test]
fn test_consulting_window_and_growth() {
    let mut scenario = bare();
    scenario.consulting = ConsultingLadder {
        start_age: 52,
        years: 3,
        start_amount: 100_000.0,
        growth: 0.10,
    };
    assert_eq!(year_income(&scenario, 51), 0.0);
    assert_eq!(year_income(&scenario, 52), 100_000.0);
    assert!((year_income(&scenario, 53) - 110_000.0).abs() < 1e-6);
    assert!((year_income(&scenario, 54) - 121_000.0).abs() < 1e-6);
    // start_age + years is the first age without consulting
    assert_eq!(year_income(&scenario, 55), 0.0);
}

/// A ladder that runs to the end of the `u32` range is still a plain window
#[test]
fn test_consulting_window_near_u32_max() {
    let mut scenario = bare();
    scenario.consulting = ConsultingLadder {
        start_age: 60,
        years: u32::MAX,
        start_amount: 50_000.0,
        growth: 0.0,
    };
    assert_eq!(year_income(&scenario, 59), 0.0);
    assert_eq!(year_income(&scenario, 60), 50_000.0);
    assert_eq!(year_income(&scenario, 80), 50_000.0);
}

#[test]
fn test_income_stream_is_inclusive_with_cola() {
    let mut scenario = bare();
    scenario.incomes = vec![IncomeStream {
        start_age: 67,
        end_age: 70,
        monthly: 1_000.0,
        cola: 0.02,
    }];
    assert_eq!(year_income(&scenario, 66), 0.0);
    assert_eq!(year_income(&scenario, 67), 12_000.0);
    assert!((year_income(&scenario, 70) - 12_000.0 * 1.02_f64.powi(3)).abs() < 1e-6);
    assert_eq!(year_income(&scenario, 71), 0.0);
}

#[test]
fn test_overlapping_streams_add_up() {
    let mut scenario = bare();
    scenario.incomes = vec![
        IncomeStream {
            start_age: 60,
            end_age: 90,
            monthly: 1_000.0,
            cola: 0.0,
        },
        IncomeStream {
            start_age: 60,
            end_age: 90,
            monthly: 500.0,
            cola: 0.0,
        },
    ];
    assert_eq!(year_income(&scenario, 65), 18_000.0);
}

#[test]
fn test_spending_steps_down_and_inflates() {
    let mut scenario = bare();
    scenario.spending = Spending {
        base_annual: 100_000.0,
        reduced_annual: 70_000.0,
        reduce_at_age: 60,
        inflation: 0.03,
    };
    assert_eq!(year_spending(&scenario, 50), 100_000.0);
    assert!((year_spending(&scenario, 59) - 100_000.0 * 1.03_f64.powi(9)).abs() < 1e-6);
    // inflation keeps counting from current_age after the step-down
    assert!((year_spending(&scenario, 60) - 70_000.0 * 1.03_f64.powi(10)).abs() < 1e-6);
}

#[test]
fn test_tax_math() {
    let mut scenario = bare();
    scenario.taxes = Taxes {
        effective_rate: 0.20,
        taxable_portfolio_ratio: 0.75,
        taxable_income_ratio: 0.80,
    };
    scenario.consulting = ConsultingLadder {
        start_age: 50,
        years: 20,
        start_amount: 50_000.0,
        growth: 0.0,
    };
    scenario.spending.base_annual = 100_000.0;

    let flow = YearCashFlow::for_age(&scenario, 55);
    assert!((flow.income_tax - 8_000.0).abs() < 1e-9);
    assert!((flow.net_income - 42_000.0).abs() < 1e-9);
    assert!((flow.net_withdrawal - 58_000.0).abs() < 1e-9);
    assert!((flow.withdrawal_tax - 8_700.0).abs() < 1e-9);
    assert!((flow.gross_withdrawal - 66_700.0).abs() < 1e-9);
}

/// Income above spending does not flow back into the portfolio
#[test]
fn test_surplus_income_is_not_reinvested() {
    let mut scenario = bare();
    scenario.consulting = ConsultingLadder {
        start_age: 50,
        years: 10,
        start_amount: 200_000.0,
        growth: 0.0,
    };
    scenario.spending.base_annual = 50_000.0;
    let flow = YearCashFlow::for_age(&scenario, 51);
    assert_eq!(flow.net_withdrawal, 0.0);
    assert_eq!(flow.gross_withdrawal, 0.0);
}

#[test]
fn test_negative_income_clamps_net_income() {
    let mut scenario = bare();
    scenario.incomes = vec![IncomeStream {
        start_age: 50,
        end_age: 80,
        monthly: -1_000.0,
        cola: 0.0,
    }];
    scenario.spending.base_annual = 10_000.0;
    let flow = YearCashFlow::for_age(&scenario, 51);
    assert_eq!(flow.net_income, 0.0);
    assert_eq!(flow.net_withdrawal, 10_000.0);
}

#[test]
fn test_last_lump_at_an_age_wins() {
    let mut scenario = bare();
    scenario.lumps = vec![
        LumpEvent {
            age: 60,
            amount: 100_000.0,
            description: "first".to_string(),
        },
        LumpEvent {
            age: 60,
            amount: 250_000.0,
            description: "second".to_string(),
        },
    ];
    assert_eq!(YearCashFlow::for_age(&scenario, 60).lump, 250_000.0);
    assert_eq!(YearCashFlow::for_age(&scenario, 61).lump, 0.0);
}

#[test]
fn test_toys_at_the_same_age_are_summed() {
    let mut scenario = bare();
    scenario.toys = vec![
        ToyPurchase {
            age: 62,
            amount: 30_000.0,
            description: "car".to_string(),
        },
        ToyPurchase {
            age: 62,
            amount: 10_000.0,
            description: "boat".to_string(),
        },
    ];
    assert_eq!(YearCashFlow::for_age(&scenario, 62).toys, 40_000.0);
}

#[test]
fn test_schedule_covers_every_simulated_year() {
    let scenario = Scenario::example();
    let schedule = CashFlowSchedule::build(&scenario);
    assert_eq!(schedule.len(), scenario.horizon());
    assert_eq!(schedule.years[0].age, scenario.current_age + 1);
    assert_eq!(
        schedule.iter().last().map(|flow| flow.age),
        Some(scenario.end_age)
    );
    assert!(schedule.iter().all(|flow| flow.net_income >= 0.0));
    assert!(schedule.iter().all(|flow| flow.net_withdrawal >= 0.0));

    let at_65 = schedule.iter().find(|flow| flow.age == 65).unwrap();
    assert_eq!(at_65.lump, 200_000.0);
    assert_eq!(at_65.toys, 30_000.0);
}
