// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Rule-based cash-flow alerts over upcoming installments. No simulation.

use super::categories::CategoryIndex;
use crate::config::AlertThresholds;
use crate::models::{Budget, Installment};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const UNKNOWN_CATEGORY: &str = "Unknown Category";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Urgent,
    Critical,
    Warning,
}

/// Where the user should go to act on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertAction {
    Installments,
    Budgets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowAlert {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub call_to_action: AlertAction,
}

/// Everything the rules look at, already fetched for the lookahead window.
#[derive(Debug, Clone)]
pub struct AlertInput<'a> {
    pub today: NaiveDate,
    pub installments: &'a [Installment],
    pub budgets: &'a [Budget],
    pub categories: &'a CategoryIndex,
    pub monthly_income_estimate: Decimal,
    pub currency: &'a str,
}

fn exceeds(amount: Decimal, absolute: Decimal, estimate: Decimal, ratio: Decimal) -> bool {
    amount > absolute || (estimate > Decimal::ZERO && amount > estimate * ratio)
}

pub fn cash_flow_alerts(input: &AlertInput<'_>, limits: &AlertThresholds) -> Vec<CashFlowAlert> {
    let mut alerts = Vec::new();
    let estimate = input.monthly_income_estimate;

    let major_until = input.today + Duration::days(limits.major_window_days);
    for inst in input.installments.iter().filter(|i| i.due_date <= major_until) {
        if exceeds(
            inst.payment,
            limits.major_absolute,
            estimate,
            limits.major_income_ratio,
        ) {
            let days = (inst.due_date - input.today).num_days();
            alerts.push(CashFlowAlert {
                message: format!(
                    "URGENT: A major installment of {:.2} {} is due in {} days.",
                    inst.payment, input.currency, days
                ),
                kind: AlertKind::Urgent,
                call_to_action: AlertAction::Installments,
            });
        }
    }

    let concentration_until = input.today + Duration::days(limits.concentration_window_days);
    let concentrated: Decimal = input
        .installments
        .iter()
        .filter(|i| i.due_date <= concentration_until)
        .map(|i| i.payment)
        .sum();
    if exceeds(
        concentrated,
        limits.concentration_absolute,
        estimate,
        limits.concentration_income_ratio,
    ) {
        alerts.push(CashFlowAlert {
            message: format!(
                "PAYMENT BOMB: You have {:.2} {} in debt payments due over the next {} days.",
                concentrated, input.currency, limits.concentration_window_days
            ),
            kind: AlertKind::Critical,
            call_to_action: AlertAction::Installments,
        });
    }

    let budgeted: HashSet<Option<i64>> = input.budgets.iter().map(|b| b.category_id).collect();
    let unbudgeted: Vec<&Installment> = input
        .installments
        .iter()
        .filter(|i| !budgeted.contains(&i.category_id))
        .collect();
    if unbudgeted.iter().any(|i| i.category_id.is_some()) {
        for inst in unbudgeted {
            let name = inst
                .category_id
                .and_then(|id| input.categories.name_of(id))
                .unwrap_or(UNKNOWN_CATEGORY);
            alerts.push(CashFlowAlert {
                message: format!(
                    "PLANNING GAP: An installment for '{}' is due, but you haven't set a budget target for it.",
                    name
                ),
                kind: AlertKind::Warning,
                call_to_action: AlertAction::Budgets,
            });
        }
    }

    alerts
}
