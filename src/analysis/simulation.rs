// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Day-by-day balance projection.
//!
//! Each simulated day applies, in order: payday rules matching the day of
//! month, unpaid installments due that exact day, and the weighted share of
//! every budget whose allocation window covers the day. The balance is then
//! checked against the warning threshold (at most one warning per date) and
//! the day is recorded.

use super::income::IncomeRule;
use super::weights::{Weights, spending_weights, weekday_index};
use crate::models::{Budget, Installment, Transaction};
use crate::utils::display_date;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UNNAMED_PAYMENT: &str = "Unnamed Payment";

/// A budget prepared for simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProjection {
    pub budget_id: Option<i64>,
    pub category_id: Option<i64>,
    pub weights: Weights,
    pub total_remaining_weight: Decimal,
    /// Target plus what was already booked in the category since the budget
    /// started. Not clamped: an overspent budget carries a negative remainder.
    pub remaining: Decimal,
    pub allocation_start: NaiveDate,
    pub allocation_end: NaiveDate,
}

impl BudgetProjection {
    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.allocation_start && day <= self.allocation_end
    }

    /// The budget's spend on `day`; zero when no weight remains.
    pub fn share_on(&self, day: NaiveDate) -> Decimal {
        if self.total_remaining_weight <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.weights[weekday_index(day)] / self.total_remaining_weight * self.remaining
    }
}

pub fn project_budget(
    budget: &Budget,
    history: &[Transaction],
    sim_start: NaiveDate,
) -> BudgetProjection {
    let booked: Decimal = history
        .iter()
        .filter(|t| {
            t.category_id == budget.category_id
                && t.date >= budget.start_date
                && t.date < sim_start
        })
        .map(|t| t.amount)
        .sum();
    let weights = spending_weights(history, budget.category_id);
    let allocation_start = sim_start.max(budget.start_date);
    let total_remaining_weight = allocation_start
        .iter_days()
        .take_while(|d| *d <= budget.end_date)
        .map(|d| weights[weekday_index(d)])
        .sum();
    BudgetProjection {
        budget_id: budget.id,
        category_id: budget.category_id,
        weights,
        total_remaining_weight,
        remaining: budget.target_amount + booked,
        allocation_start,
        allocation_end: budget.end_date,
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationInput {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub starting_balance: Decimal,
    pub income_rules: Vec<IncomeRule>,
    pub installments: Vec<Installment>,
    pub budgets: Vec<BudgetProjection>,
    pub warning_threshold: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalancePoint {
    pub date: NaiveDate,
    pub balance: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningDetails {
    pub balance: Decimal,
    pub threshold: Decimal,
    pub daily_expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWarning {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: NaiveDate,
    pub details: WarningDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub lowest_projected_balance: Decimal,
    pub average_projected_balance: Decimal,
    pub total_projected_income: Decimal,
    pub total_projected_expenses: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub daily_balances: Vec<DailyBalancePoint>,
    pub summary_metrics: SummaryMetrics,
    pub warnings: Vec<ForecastWarning>,
    pub warning_threshold: Decimal,
}

fn warning_reason(due: &[&Installment], daily_expense: Decimal) -> String {
    let installment_total: Decimal = due.iter().map(|i| i.payment).sum();
    let variable_total = daily_expense - installment_total;

    let mut largest: Option<&Installment> = None;
    for inst in due {
        if inst.payment > largest.map_or(Decimal::ZERO, |l| l.payment) {
            largest = Some(inst);
        }
    }
    let share = daily_expense * Decimal::new(6, 1);
    match largest {
        Some(l) if l.payment > share => format!(
            "a large payment of {:.2} for \"{}\"",
            l.payment,
            l.item_name.as_deref().unwrap_or(UNNAMED_PAYMENT)
        ),
        _ if installment_total > Decimal::ZERO && variable_total > Decimal::ZERO => format!(
            "payments totaling {:.2} and projected spending of {:.2}",
            installment_total, variable_total
        ),
        _ if installment_total > Decimal::ZERO => {
            format!("payments totaling {:.2}", installment_total)
        }
        _ if variable_total > Decimal::ZERO => {
            format!("high projected spending of {:.2}", variable_total)
        }
        _ => "a combination of expenses".to_string(),
    }
}

pub fn simulate(input: &SimulationInput) -> Forecast {
    let threshold = input.warning_threshold;
    let mut balance = input.starting_balance;
    let mut points: Vec<DailyBalancePoint> = Vec::new();
    let mut warnings: Vec<ForecastWarning> = Vec::new();

    for day in input.start.iter_days().take_while(|d| *d <= input.end) {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;

        for rule in input.income_rules.iter().filter(|r| r.applies_on(day.day())) {
            balance += rule.amount;
            income += rule.amount;
        }

        let due: Vec<&Installment> = input
            .installments
            .iter()
            .filter(|i| !i.paid && i.due_date == day)
            .collect();
        for inst in &due {
            balance -= inst.payment;
            expense += inst.payment;
        }

        for budget in input.budgets.iter().filter(|b| b.covers(day)) {
            let spend = budget.share_on(day);
            balance -= spend;
            expense += spend;
        }

        if balance < threshold && !warnings.iter().any(|w| w.date == day) {
            let reason = warning_reason(&due, expense);
            warnings.push(ForecastWarning {
                message: format!(
                    "Alert for {}: Balance may drop below threshold ({}) due to {}.",
                    display_date(day),
                    threshold.normalize(),
                    reason
                ),
                kind: "warning".to_string(),
                date: day,
                details: WarningDetails {
                    balance,
                    threshold,
                    daily_expense: expense,
                },
            });
        }

        points.push(DailyBalancePoint {
            date: day,
            balance,
            income,
            expense,
        });
    }

    let summary_metrics = summarize(&points, &input.currency);
    Forecast {
        daily_balances: points,
        summary_metrics,
        warnings,
        warning_threshold: threshold,
    }
}

fn summarize(points: &[DailyBalancePoint], currency: &str) -> SummaryMetrics {
    let lowest = points
        .iter()
        .map(|p| p.balance)
        .min()
        .unwrap_or(Decimal::ZERO);
    let average = if points.is_empty() {
        Decimal::ZERO
    } else {
        points.iter().map(|p| p.balance).sum::<Decimal>() / Decimal::from(points.len())
    };
    SummaryMetrics {
        lowest_projected_balance: lowest,
        average_projected_balance: average,
        total_projected_income: points.iter().map(|p| p.income).sum(),
        total_projected_expenses: points.iter().map(|p| p.expense).sum(),
        currency: currency.to_string(),
    }
}
