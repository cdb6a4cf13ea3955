// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneycast::analysis::alerts::{AlertAction, AlertInput};
use moneycast::analysis::{AlertKind, CategoryIndex, cash_flow_alerts};
use moneycast::config::AlertThresholds;
use moneycast::models::{Budget, Category, Installment};
use rust_decimal::Decimal;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn installment(date: &str, payment: i64, category: Option<i64>) -> Installment {
    Installment {
        id: None,
        due_date: day(date),
        payment: Decimal::from(payment),
        category_id: category,
        item_id: None,
        paid: false,
        user_id: "u1".into(),
        item_name: None,
    }
}

fn budget(category: i64) -> Budget {
    Budget {
        id: Some(1),
        category_id: Some(category),
        target_amount: Decimal::from(1000),
        start_date: day("2025-06-01"),
        end_date: day("2025-06-30"),
        is_active: true,
        user_id: "u1".into(),
    }
}

fn categories() -> CategoryIndex {
    CategoryIndex::from_categories(
        &[Category {
            id: Some(10),
            name: Some("Electronics".into()),
            kind: Some("spending".into()),
            user_id: "u1".into(),
        }],
        "spending",
    )
}

fn run(installments: &[Installment], budgets: &[Budget], estimate: i64) -> Vec<moneycast::analysis::CashFlowAlert> {
    let cats = categories();
    cash_flow_alerts(
        &AlertInput {
            today: day("2025-06-01"),
            installments,
            budgets,
            categories: &cats,
            monthly_income_estimate: Decimal::from(estimate),
            currency: "TRY",
        },
        &AlertThresholds::default(),
    )
}

#[test]
fn large_installment_due_soon_is_urgent() {
    let alerts = run(&[installment("2025-06-04", 6000, None)], &[], 0);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Urgent);
    assert_eq!(alerts[0].call_to_action, AlertAction::Installments);
    assert_eq!(
        alerts[0].message,
        "URGENT: A major installment of 6000.00 TRY is due in 3 days."
    );
}

#[test]
fn income_relative_threshold_applies_only_with_an_estimate() {
    let inst = [installment("2025-06-05", 3000, None)];
    assert!(run(&inst, &[], 0).is_empty());
    let alerts = run(&inst, &[], 5000);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Urgent);
}

#[test]
fn payments_clustered_in_ten_days_raise_a_payment_bomb() {
    let inst = [
        installment("2025-06-02", 4000, None),
        installment("2025-06-06", 4000, None),
        installment("2025-06-09", 4000, None),
        installment("2025-06-11", 4000, None),
        installment("2025-06-25", 9000, None),
    ];
    let alerts = run(&inst, &[], 0);
    let bombs: Vec<_> = alerts.iter().filter(|a| a.kind == AlertKind::Critical).collect();
    assert_eq!(bombs.len(), 1);
    assert_eq!(
        bombs[0].message,
        "PAYMENT BOMB: You have 16000.00 TRY in debt payments due over the next 10 days."
    );
    // 9000 is more than 5000 but not due within the week.
    assert!(alerts.iter().all(|a| a.kind != AlertKind::Urgent));
}

#[test]
fn unbudgeted_installments_are_planning_gaps() {
    let inst = [
        installment("2025-06-20", 100, Some(10)),
        installment("2025-06-21", 100, Some(99)),
        installment("2025-06-22", 100, Some(11)),
    ];
    let alerts = run(&inst, &[budget(11)], 0);
    let gaps: Vec<&str> = alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Warning)
        .map(|a| a.message.as_str())
        .collect();
    assert_eq!(
        gaps,
        vec![
            "PLANNING GAP: An installment for 'Electronics' is due, but you haven't set a budget target for it.",
            "PLANNING GAP: An installment for 'Unknown Category' is due, but you haven't set a budget target for it.",
        ]
    );
    assert!(alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Warning)
        .all(|a| a.call_to_action == AlertAction::Budgets));
}

#[test]
fn uncategorised_installments_alone_are_not_gaps() {
    let alerts = run(&[installment("2025-06-20", 100, None)], &[], 0);
    assert!(alerts.is_empty());
}
