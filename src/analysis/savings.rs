// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{SavingsGoal, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: SavingsGoal,
    /// Recomputed on every request, never stored.
    pub current_amount: Decimal,
    pub progress_percentage: Decimal,
    pub is_fully_funded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsReport {
    /// Signed; may be negative when expenses exceed income.
    pub total_savings_pool: Decimal,
    pub goals: Vec<GoalProgress>,
}

/// All-time income minus all-time expenses.
pub fn savings_pool(transactions: &[Transaction]) -> Decimal {
    let (income, expenses) = transactions.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(inc, exp), t| {
            if t.amount > Decimal::ZERO {
                (inc + t.amount, exp)
            } else {
                (inc, exp + t.amount.abs())
            }
        },
    );
    income - expenses
}

/// Funds goals in ascending priority, each up to its target, from
/// `max(0, pool)`. Goals with equal priority keep their input order.
pub fn allocate(pool: Decimal, goals: &[SavingsGoal]) -> SavingsReport {
    let mut ordered: Vec<&SavingsGoal> = goals.iter().collect();
    ordered.sort_by_key(|g| g.priority);

    let mut available = pool.max(Decimal::ZERO);
    let progress = ordered
        .into_iter()
        .map(|goal| {
            let target = goal.target_amount;
            let allocated = if available > Decimal::ZERO {
                available.min(target.max(Decimal::ZERO))
            } else {
                Decimal::ZERO
            };
            available -= allocated;
            let progress_percentage = if target > Decimal::ZERO {
                allocated / target * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            GoalProgress {
                goal: goal.clone(),
                current_amount: allocated,
                progress_percentage,
                is_fully_funded: allocated >= target,
            }
        })
        .collect();

    SavingsReport {
        total_savings_pool: pool,
        goals: progress,
    }
}
