// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Payday inference from a year of income transactions.

use super::categories::CategoryIndex;
use crate::models::Transaction;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fewer income events than this and the fallback estimate is used.
pub const MIN_INCOME_EVENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRule {
    pub frequency: Frequency,
    pub day_of_month: u32,
    pub amount: Decimal,
}

impl IncomeRule {
    pub fn monthly(day_of_month: u32, amount: Decimal) -> Self {
        Self {
            frequency: Frequency::Monthly,
            day_of_month,
            amount,
        }
    }

    pub fn fallback(estimate: Decimal) -> Self {
        Self::monthly(1, estimate)
    }

    pub fn applies_on(&self, day_of_month: u32) -> bool {
        match self.frequency {
            Frequency::Monthly => self.day_of_month == day_of_month,
        }
    }
}

/// Income transactions are those with a positive amount in an earning category.
pub fn income_transactions<'a>(
    transactions: &'a [Transaction],
    categories: &'a CategoryIndex,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions
        .iter()
        .filter(|t| t.is_income() && categories.is_earning(t.category_id))
}

/// Infers one monthly payday, two semi-monthly paydays, or falls back to the
/// user's estimate on day 1.
///
/// Days of month with equal counts keep the order in which they were first
/// seen in `transactions`.
pub fn infer_income_schedule(
    transactions: &[Transaction],
    categories: &CategoryIndex,
    fallback_estimate: Decimal,
) -> Vec<IncomeRule> {
    let incomes: Vec<&Transaction> = income_transactions(transactions, categories).collect();
    if incomes.len() < MIN_INCOME_EVENTS {
        return vec![IncomeRule::fallback(fallback_estimate)];
    }

    let mut day_counts: Vec<(u32, usize)> = Vec::new();
    let mut months: Vec<(i32, u32)> = Vec::new();
    let mut total = Decimal::ZERO;
    for t in &incomes {
        let day = t.date.day();
        match day_counts.iter_mut().find(|(d, _)| *d == day) {
            Some((_, n)) => *n += 1,
            None => day_counts.push((day, 1)),
        }
        let month = (t.date.year(), t.date.month());
        if !months.contains(&month) {
            months.push(month);
        }
        total += t.amount;
    }
    // Stable, so ties stay in first-seen order.
    day_counts.sort_by(|a, b| b.1.cmp(&a.1));

    let month_count = Decimal::from(months.len());
    let average_monthly = total / month_count;
    let per_month = Decimal::from(incomes.len()) / month_count;

    let between = |lo: Decimal, hi: Decimal| per_month > lo && per_month < hi;
    if between(Decimal::new(8, 1), Decimal::new(14, 1)) {
        vec![IncomeRule::monthly(day_counts[0].0, average_monthly)]
    } else if between(Decimal::new(18, 1), Decimal::new(24, 1)) && day_counts.len() >= 2 {
        let half = average_monthly / Decimal::from(2);
        vec![
            IncomeRule::monthly(day_counts[0].0, half),
            IncomeRule::monthly(day_counts[1].0, half),
        ]
    } else {
        vec![IncomeRule::fallback(fallback_estimate)]
    }
}
