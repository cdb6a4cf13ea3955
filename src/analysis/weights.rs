// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Transaction;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Share of spending per weekday, indexed Sunday = 0 through Saturday = 6.
pub type Weights = [Decimal; 7];

pub fn weekday_index(d: NaiveDate) -> usize {
    d.weekday().num_days_from_sunday() as usize
}

pub fn uniform_weights() -> Weights {
    [Decimal::ONE / Decimal::from(7); 7]
}

/// Distribution of a category's past expenses over the days of the week.
/// Uniform when the category has no expense history.
pub fn spending_weights(history: &[Transaction], category_id: Option<i64>) -> Weights {
    let mut totals = [Decimal::ZERO; 7];
    let mut seen = false;
    for t in history
        .iter()
        .filter(|t| t.category_id == category_id && t.is_expense())
    {
        totals[weekday_index(t.date)] += t.amount.abs();
        seen = true;
    }
    let sum: Decimal = totals.iter().copied().sum();
    if !seen || sum.is_zero() {
        return uniform_weights();
    }
    totals.map(|v| v / sum)
}
