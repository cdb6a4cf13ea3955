// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring-payment detection over expense history.
//!
//! Expenses are grouped by a normalised description plus the absolute amount.
//! A group of two or more whose mean gap between payments lands near 30, 14
//! or 7 days becomes a subscription candidate.

use crate::models::{Subscription, Transaction};
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Maximum number of transactions scanned for candidates.
pub const SCAN_LIMIT: usize = 10_000;

const TOLERANCE_DAYS: f64 = 3.0;

static DATES_AND_TIMES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2,4}[-/]\d{2,4}[-/]\d{2,4}|\d{2}:\d{2}").expect("date/time pattern")
});
static LONG_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]{6,}").expect("token pattern"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    Monthly,
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    Weekly,
}

impl Recurrence {
    pub fn classify(mean_interval_days: f64) -> Option<Self> {
        let near = |target: f64| (mean_interval_days - target).abs() <= TOLERANCE_DAYS;
        if near(30.0) {
            Some(Recurrence::Monthly)
        } else if near(14.0) {
            Some(Recurrence::BiWeekly)
        } else if near(7.0) {
            Some(Recurrence::Weekly)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Monthly => "Monthly",
            Recurrence::BiWeekly => "Bi-Weekly",
            Recurrence::Weekly => "Weekly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceCandidate {
    pub description: String,
    pub normalized_description: String,
    pub amount: Decimal,
    pub category: Option<i64>,
    pub recurrence: Recurrence,
    pub average_interval_days: i64,
    pub last_payment_date: NaiveDate,
    pub next_possible_payment_date: NaiveDate,
    pub all_payments: Vec<Payment>,
}

/// Lower-cases, strips dates, `HH:MM` times and every run of six or more
/// ASCII letters/digits, then collapses whitespace. Long words go too, so a
/// plain "Netflix" normalises to an empty key and is never grouped.
pub fn normalize_description(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = DATES_AND_TIMES.replace_all(&lowered, "");
    let stripped = LONG_TOKEN.replace_all(&stripped, "");
    SPACES.replace_all(&stripped, " ").trim().to_string()
}

fn group_key(t: &Transaction) -> Option<(String, String)> {
    let norm = normalize_description(t.description.as_deref()?);
    if norm.is_empty() {
        return None;
    }
    let key = format!("{}|{:.2}", norm, t.amount.abs());
    Some((key, norm))
}

/// Pure function of the transaction history; groups keep the order in which
/// their first member appears.
pub fn detect_recurring(transactions: &[Transaction]) -> Vec<RecurrenceCandidate> {
    let mut order: Vec<(String, Vec<&Transaction>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        let Some((key, norm)) = group_key(t) else {
            continue;
        };
        match index.get(&key) {
            Some(&i) => order[i].1.push(t),
            None => {
                index.insert(key, order.len());
                order.push((norm, vec![t]));
            }
        }
    }
    debug!(groups = order.len(), "grouped expenses for recurrence");
    order
        .into_iter()
        .filter_map(|(norm, group)| analyze_group(norm, group))
        .collect()
}

fn analyze_group(norm: String, mut group: Vec<&Transaction>) -> Option<RecurrenceCandidate> {
    if group.len() < 2 {
        return None;
    }
    group.sort_by_key(|t| t.date);
    let intervals: Vec<i64> = group
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days().abs())
        .collect();
    let mean = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;
    let recurrence = Recurrence::classify(mean)?;
    let rounded = mean.round() as i64;

    let first = group[0];
    let last = group[group.len() - 1];
    Some(RecurrenceCandidate {
        description: first.description.clone().unwrap_or_default(),
        normalized_description: norm,
        amount: first.amount,
        category: first.category_id,
        recurrence,
        average_interval_days: rounded,
        last_payment_date: last.date,
        next_possible_payment_date: last.date + Duration::days(rounded),
        all_payments: group
            .iter()
            .map(|t| Payment {
                date: t.date,
                amount: t.amount,
            })
            .collect(),
    })
}

/// Drops candidates the user already tracks, matching subscription names
/// case-insensitively against the raw or normalised description.
pub fn filter_tracked(
    candidates: Vec<RecurrenceCandidate>,
    tracked: &[Subscription],
) -> Vec<RecurrenceCandidate> {
    let names: HashSet<String> = tracked
        .iter()
        .map(|s| s.name.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    candidates
        .into_iter()
        .filter(|c| {
            !names.contains(&c.description.trim().to_lowercase())
                && !names.contains(&c.normalized_description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalisation_strips_dates_times_and_long_tokens() {
        assert_eq!(
            normalize_description("  NETFLIX.COM 2024-01-05 10:32 REF9X8Y7Z  "),
            ".com"
        );
        assert_eq!(normalize_description("12/01/2024 AB12CD34"), "");
        assert_eq!(normalize_description("Gym Pass  12:00"), "gym pass");
    }

    #[test]
    fn long_words_without_digits_are_stripped() {
        assert_eq!(normalize_description("NETFLIX"), "");
        assert_eq!(normalize_description("Spotify Premium"), "");
        assert_eq!(normalize_description("Apple One Family"), "apple one");
        assert_eq!(normalize_description("Tidal HiFi"), "tidal hifi");
    }

    #[test]
    fn patterns_compile() {
        assert!(DATES_AND_TIMES.is_match("10:32"));
        assert!(LONG_TOKEN.is_match("ab12cd"));
        assert!(SPACES.is_match("a  b"));
    }

    #[test]
    fn classification_bands() {
        assert_eq!(Recurrence::classify(29.7), Some(Recurrence::Monthly));
        assert_eq!(Recurrence::classify(16.5), Some(Recurrence::BiWeekly));
        assert_eq!(Recurrence::classify(4.0), Some(Recurrence::Weekly));
        assert_eq!(Recurrence::classify(21.0), None);
    }
}
