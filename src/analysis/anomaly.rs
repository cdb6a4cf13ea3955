// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Flags recent expenses that are far above their category's long-run mean.

use super::categories::CategoryIndex;
use crate::models::Transaction;
use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct AnomalyWindows {
    /// Expenses at least this old form the baseline.
    pub history_days: i64,
    /// Expenses newer than this are checked.
    pub recent_days: i64,
}

impl Default for AnomalyWindows {
    fn default() -> Self {
        Self {
            history_days: 90,
            recent_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub checked_transactions: usize,
    pub found_anomalies: usize,
    pub sensitivity: Decimal,
    pub historical_data_points: usize,
    pub category_averages: BTreeMap<i64, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    pub summary: AnomalySummary,
}

pub fn detect_anomalies(
    transactions: &[Transaction],
    categories: &CategoryIndex,
    sensitivity: Decimal,
    today: NaiveDate,
    windows: AnomalyWindows,
) -> AnomalyReport {
    let history_cutoff = today - Duration::days(windows.history_days);
    let recent_cutoff = today - Duration::days(windows.recent_days);
    let expenses = transactions.iter().filter(|t| t.is_expense());

    let mut sums: BTreeMap<i64, (Decimal, u32)> = BTreeMap::new();
    let mut historical = 0usize;
    for t in expenses.clone().filter(|t| t.date <= history_cutoff) {
        historical += 1;
        if let Some(cat) = t.category_id {
            let e = sums.entry(cat).or_insert((Decimal::ZERO, 0));
            e.0 += t.amount.abs();
            e.1 += 1;
        }
    }
    let averages: BTreeMap<i64, Decimal> = sums
        .into_iter()
        .map(|(cat, (sum, n))| (cat, sum / Decimal::from(n)))
        .collect();

    let recent: Vec<&Transaction> = expenses.filter(|t| t.date > recent_cutoff).collect();
    let anomalies: Vec<Anomaly> = recent
        .iter()
        .filter_map(|t| {
            let avg = *averages.get(&t.category_id?)?;
            let spent = t.amount.abs();
            if avg.is_zero() || spent <= avg * sensitivity {
                return None;
            }
            let times = (spent / avg).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            Some(Anomaly {
                id: t.id,
                date: t.date,
                amount: t.amount,
                description: t.description.clone(),
                category_id: t.category_id,
                category_name: t
                    .category_id
                    .and_then(|id| categories.name_of(id))
                    .unwrap_or("Unknown")
                    .to_string(),
                reason: format!(
                    "This transaction is ~{}x higher than the average for this category.",
                    times
                ),
            })
        })
        .collect();

    AnomalyReport {
        summary: AnomalySummary {
            checked_transactions: recent.len(),
            found_anomalies: anomalies.len(),
            sensitivity,
            historical_data_points: historical,
            category_averages: averages,
        },
        anomalies,
    }
}
