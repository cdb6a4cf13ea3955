// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month and category roll-ups of earning and spending history.

use super::CategoryIndex;
use crate::models::Transaction;
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// `YYYY-MM`.
pub fn month_key(d: NaiveDate) -> String {
    d.format("%Y-%m").to_string()
}

/// "June 2025".
pub fn month_name(d: NaiveDate) -> String {
    d.format("%B %Y").to_string()
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

pub fn last_of_month(d: NaiveDate) -> NaiveDate {
    first_of_month(d)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(d)
}

/// Whole calendar months from `start`'s month to `end`'s month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32
}

fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

fn earnings<'a>(
    transactions: &'a [Transaction],
    categories: &'a CategoryIndex,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions
        .iter()
        .filter(move |t| categories.is_earning(t.category_id))
}

fn spending<'a>(
    transactions: &'a [Transaction],
    categories: &'a CategoryIndex,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions.iter().filter(move |t| {
        t.category_id
            .is_some_and(|id| categories.spending.contains(&id))
    })
}

/// Average of the per-month earning totals over the months that have any
/// earning at all. Zero without earnings.
pub fn average_monthly_income(transactions: &[Transaction], categories: &CategoryIndex) -> Decimal {
    let mut months: BTreeMap<String, Decimal> = BTreeMap::new();
    for t in earnings(transactions, categories) {
        *months.entry(month_key(t.date)).or_default() += t.amount;
    }
    if months.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = months.values().copied().sum();
    (total / Decimal::from(months.len())).round_dp(2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsComparison {
    pub last_month_earnings: Decimal,
    pub previous_month_earnings: Decimal,
    pub percentage_change: Decimal,
    pub currency: String,
    pub last_month_name: String,
    pub previous_month_name: String,
}

/// Earnings of the two full calendar months before `today`.
pub fn earnings_comparison(
    transactions: &[Transaction],
    categories: &CategoryIndex,
    today: NaiveDate,
    currency: &str,
) -> EarningsComparison {
    let this_month = first_of_month(today);
    let last = this_month
        .checked_sub_months(Months::new(1))
        .unwrap_or(this_month);
    let previous = this_month
        .checked_sub_months(Months::new(2))
        .unwrap_or(this_month);
    let (last_key, previous_key) = (month_key(last), month_key(previous));

    let (mut last_total, mut previous_total) = (Decimal::ZERO, Decimal::ZERO);
    for t in earnings(transactions, categories) {
        let key = month_key(t.date);
        if key == last_key {
            last_total += t.amount;
        } else if key == previous_key {
            previous_total += t.amount;
        }
    }
    EarningsComparison {
        last_month_earnings: last_total,
        previous_month_earnings: previous_total,
        percentage_change: percent_change(last_total, previous_total),
        currency: currency.to_string(),
        last_month_name: month_name(last),
        previous_month_name: month_name(previous),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSpending {
    pub month: String,
    pub month_name: String,
    pub total_amount: Decimal,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingStatistics {
    pub total_spending: Decimal,
    pub total_records: usize,
    pub average_monthly_spending: Decimal,
    pub month_over_month_change: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySpendingReport {
    pub monthly_data: Vec<MonthSpending>,
    pub statistics: SpendingStatistics,
}

/// Spending-category totals per month of `start..=end`. Every month in the
/// range appears, empty months with zero. A month's total is the absolute
/// value of its signed sum, so refunds offset purchases.
pub fn monthly_spending(
    transactions: &[Transaction],
    categories: &CategoryIndex,
    start: NaiveDate,
    end: NaiveDate,
    currency: &str,
) -> MonthlySpendingReport {
    let mut months: BTreeMap<String, (NaiveDate, Decimal, usize)> = BTreeMap::new();
    let mut cursor = first_of_month(start);
    while cursor <= end {
        months.insert(month_key(cursor), (cursor, Decimal::ZERO, 0));
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    for t in spending(transactions, categories).filter(|t| t.date >= start && t.date <= end) {
        if let Some(entry) = months.get_mut(&month_key(t.date)) {
            entry.1 += t.amount;
            entry.2 += 1;
        }
    }

    let monthly_data: Vec<MonthSpending> = months
        .into_iter()
        .map(|(month, (first, sum, count))| MonthSpending {
            month,
            month_name: month_name(first),
            total_amount: sum.abs(),
            record_count: count,
        })
        .collect();

    let total_spending: Decimal = monthly_data.iter().map(|m| m.total_amount).sum();
    let total_records: usize = monthly_data.iter().map(|m| m.record_count).sum();
    let average_monthly_spending = if monthly_data.is_empty() {
        Decimal::ZERO
    } else {
        (total_spending / Decimal::from(monthly_data.len())).round_dp(2)
    };
    let month_over_month_change = match monthly_data.as_slice() {
        [.., previous, last] => percent_change(last.total_amount, previous.total_amount),
        _ => Decimal::ZERO,
    };
    MonthlySpendingReport {
        statistics: SpendingStatistics {
            total_spending: total_spending.round_dp(2),
            total_records,
            average_monthly_spending,
            month_over_month_change,
            currency: currency.to_string(),
        },
        monthly_data,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    pub total_amount: Decimal,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpendingReport {
    pub categories: Vec<CategorySpending>,
    pub total_spending: Decimal,
    pub total_records: usize,
    pub categories_with_spending: usize,
}

/// Spending per category, largest first. Categories whose signed sum nets to
/// zero are left out.
pub fn category_spending(
    transactions: &[Transaction],
    categories: &CategoryIndex,
) -> CategorySpendingReport {
    let mut totals: BTreeMap<i64, (Decimal, usize)> = categories
        .spending
        .iter()
        .map(|id| (*id, (Decimal::ZERO, 0)))
        .collect();
    for t in spending(transactions, categories) {
        if let Some(entry) = t.category_id.and_then(|id| totals.get_mut(&id)) {
            entry.0 += t.amount;
            entry.1 += 1;
        }
    }
    let mut rows: Vec<CategorySpending> = totals
        .into_iter()
        .filter(|(_, (sum, _))| !sum.is_zero())
        .map(|(id, (sum, count))| CategorySpending {
            category_id: id,
            category_name: categories.name_of(id).unwrap_or_default().to_string(),
            total_amount: sum.abs(),
            record_count: count,
        })
        .collect();
    rows.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
    CategorySpendingReport {
        total_spending: rows.iter().map(|r| r.total_amount).sum(),
        total_records: rows.iter().map(|r| r.record_count).sum(),
        categories_with_spending: rows.len(),
        categories: rows,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeEarnings {
    pub total_earnings: Decimal,
    pub record_count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub months_span: i32,
    pub average_per_month: Decimal,
    pub currency: String,
}

/// Earnings in `start..=end`, averaged over the calendar months the range
/// touches.
pub fn range_earnings(
    transactions: &[Transaction],
    categories: &CategoryIndex,
    start: NaiveDate,
    end: NaiveDate,
    currency: &str,
) -> RangeEarnings {
    let (total, count) = earnings(transactions, categories)
        .filter(|t| t.date >= start && t.date <= end)
        .fold((Decimal::ZERO, 0usize), |(sum, n), t| (sum + t.amount, n + 1));
    let months_span = months_between(start, end) + 1;
    let average_per_month = if months_span > 0 {
        (total / Decimal::from(months_span)).round_dp(2)
    } else {
        total
    };
    RangeEarnings {
        total_earnings: total,
        record_count: count,
        start_date: start,
        end_date: end,
        months_span,
        average_per_month,
        currency: currency.to_string(),
    }
}
