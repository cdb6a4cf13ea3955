// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate};
use moneycast::Error;
use moneycast::analysis::CategoryIndex;
use moneycast::analysis::anomaly::{AnomalyWindows, detect_anomalies};
use moneycast::config::{Config, Table};
use moneycast::models::{Category, Transaction};
use moneycast::services::Context;
use moneycast::store::LocalStore;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn expense(days_ago: i64, amount: i64, category: i64) -> Transaction {
    Transaction {
        id: Some(days_ago),
        date: today() - Duration::days(days_ago),
        amount: Decimal::from(-amount),
        category_id: Some(category),
        bank: None,
        description: Some(format!("purchase {}", days_ago)),
        ref_no: None,
        user_id: "u1".into(),
    }
}

fn categories() -> CategoryIndex {
    CategoryIndex::from_categories(
        &[Category {
            id: Some(1),
            name: Some("Dining".into()),
            kind: Some("spending".into()),
            user_id: "u1".into(),
        }],
        "spending",
    )
}

#[test]
fn recent_expense_far_above_the_baseline_is_flagged() {
    let history = vec![
        expense(120, 40, 1),
        expense(100, 60, 1),
        expense(95, 50, 1),
        expense(10, 260, 1),
        expense(5, 70, 1),
    ];
    let report = detect_anomalies(
        &history,
        &categories(),
        Decimal::from(3),
        today(),
        AnomalyWindows::default(),
    );
    assert_eq!(report.anomalies.len(), 1);
    let a = &report.anomalies[0];
    assert_eq!(a.amount, Decimal::from(-260));
    assert_eq!(a.category_name, "Dining");
    assert_eq!(
        a.reason,
        "This transaction is ~5x higher than the average for this category."
    );
    assert_eq!(report.summary.checked_transactions, 2);
    assert_eq!(report.summary.historical_data_points, 3);
    assert_eq!(report.summary.category_averages.get(&1), Some(&Decimal::from(50)));
}

#[test]
fn categories_without_a_baseline_are_never_flagged() {
    let history = vec![expense(3, 10_000, 2), expense(100, 10, 1)];
    let report = detect_anomalies(
        &history,
        &categories(),
        Decimal::from(3),
        today(),
        AnomalyWindows::default(),
    );
    assert!(report.anomalies.is_empty());
    assert_eq!(report.summary.checked_transactions, 1);
}

#[test]
fn lower_sensitivity_flags_more() {
    let history = vec![expense(200, 100, 1), expense(2, 180, 1)];
    let strict = detect_anomalies(&history, &categories(), Decimal::from(2), today(), AnomalyWindows::default());
    let loose = detect_anomalies(&history, &categories(), Decimal::new(15, 1), today(), AnomalyWindows::default());
    assert!(strict.anomalies.is_empty());
    assert_eq!(loose.anomalies.len(), 1);
}

fn seeded(sensitivity: i64) -> Context {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let config = Config::default().with_local_tables();
    let tx = |days_ago: i64, amount: &str| {
        let date = today() - Duration::days(days_ago);
        json!({"date": date.to_string(), "amount": amount, "categories_id": 1, "user_id": "u1"})
    };
    store
        .insert_rows(
            config.tables.require(Table::BankStatements).unwrap(),
            vec![tx(120, "-40"), tx(100, "-60"), tx(95, "-50"), tx(10, "-260"), tx(8, "900")],
        )
        .unwrap();
    store
        .insert_rows(
            config.tables.require(Table::Categories).unwrap(),
            vec![json!({"category_name": "Dining", "type": "spending", "user_id": "u1"})],
        )
        .unwrap();
    store
        .insert_rows(
            config.tables.require(Table::UserSettings).unwrap(),
            vec![json!({"user_id": "u1", "anomaly_detection_sensitivity": sensitivity})],
        )
        .unwrap();
    Context::new(store, config).with_today(today())
}

#[tokio::test]
async fn stored_sensitivity_applies_unless_overridden() {
    let ctx = seeded(10);
    let cancel = CancellationToken::new();
    let stored = ctx.detect_anomalies("u1", None, &cancel).await.unwrap();
    assert!(stored.anomalies.is_empty());
    assert_eq!(stored.summary.historical_data_points, 3);

    let explicit = ctx
        .detect_anomalies("u1", Some(Decimal::from(3)), &cancel)
        .await
        .unwrap();
    assert_eq!(explicit.anomalies.len(), 1);
    assert_eq!(explicit.anomalies[0].category_name, "Dining");
}

#[tokio::test]
async fn unset_sensitivity_falls_back_to_the_default() {
    let ctx = seeded(0);
    let report = ctx
        .detect_anomalies("u1", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.anomalies.len(), 1);
}

#[tokio::test]
async fn non_positive_sensitivity_is_rejected() {
    let ctx = seeded(3);
    let res = ctx
        .detect_anomalies("u1", Some(Decimal::ZERO), &CancellationToken::new())
        .await;
    assert!(matches!(res, Err(Error::Validation(_))));
}
