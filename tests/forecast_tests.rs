// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneycast::Error;
use moneycast::analysis::AlertKind;
use moneycast::config::{Config, Table};
use moneycast::services::Context;
use moneycast::services::forecast::MAX_HORIZON_DAYS;
use moneycast::store::LocalStore;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn seeded() -> Context {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let config = Config::default().with_local_tables();
    let t = |table: Table| config.tables.require(table).unwrap().to_string();

    store
        .insert_rows(
            &t(Table::Categories),
            vec![
                json!({"category_name": "Salary", "type": "earning", "user_id": "u1"}),
                json!({"category_name": "Groceries", "type": "spending", "user_id": "u1"}),
                json!({"category_name": "Furniture", "type": "spending", "user_id": "u1"}),
            ],
        )
        .unwrap();
    store
        .insert_rows(
            &t(Table::BankStatements),
            vec![
                json!({"date": "2025-03-10", "amount": "3000", "categories_id": 1, "user_id": "u1"}),
                json!({"date": "2025-04-10", "amount": "3000", "categories_id": 1, "user_id": "u1"}),
                json!({"date": "2025-05-10", "amount": "3000", "categories_id": 1, "user_id": "u1"}),
                // Tuesdays.
                json!({"date": "2025-05-13", "amount": "-100", "categories_id": 2, "user_id": "u1"}),
                json!({"date": "2025-05-20", "amount": "-100", "categories_id": 2, "user_id": "u1"}),
                json!({"date": "2025-05-27", "amount": "-100", "categories_id": 2, "user_id": "u1"}),
                json!({"date": "2025-05-27", "amount": "-99999", "categories_id": 2, "user_id": "u2"}),
            ],
        )
        .unwrap();
    store
        .insert_rows(
            &t(Table::UserSettings),
            vec![json!({"user_id": "u1", "monthly_income_estimate": 0, "warning_threshold": "7000"})],
        )
        .unwrap();
    store
        .insert_rows(
            &t(Table::Items),
            vec![json!({"item_name": "Phone", "user_id": "u1"})],
        )
        .unwrap();
    store
        .insert_rows(
            &t(Table::Installments),
            vec![
                json!({"start_date": "2025-06-05", "installment_payment": 2500, "paid": false,
                       "items_id": 1, "categories_id": 2, "user_id": "u1"}),
                json!({"start_date": "2025-06-07", "installment_payment": 13000, "paid": true,
                       "categories_id": 3, "user_id": "u1"}),
            ],
        )
        .unwrap();
    store
        .insert_rows(
            &t(Table::Budgets),
            vec![json!({"categories_id": 2, "target_amount": 900, "start_date": "2025-05-01",
                        "end_date": "2025-06-30", "is_active": true, "user_id": "u1"})],
        )
        .unwrap();

    Context::new(store, config).with_today(day("2025-06-01"))
}

#[tokio::test]
async fn forecast_projects_income_installments_and_budgets() {
    let ctx = seeded();
    let f = ctx
        .compute_forecast("u1", None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(f.daily_balances.len(), 31);
    assert_eq!(f.daily_balances[0].date, day("2025-06-01"));
    assert_eq!(f.daily_balances[30].date, day("2025-07-01"));
    assert_eq!(f.warning_threshold, Decimal::from(7000));
    assert_eq!(f.summary_metrics.currency, "TRY");

    let on = |d: &str| f.daily_balances.iter().find(|p| p.date == day(d)).unwrap();
    assert_eq!(on("2025-06-01").balance, Decimal::from(8700));
    assert_eq!(on("2025-06-03").expense, Decimal::from(150));
    assert_eq!(on("2025-06-05").expense, Decimal::from(2500));
    // The paid installment on the 7th is not projected.
    assert_eq!(on("2025-06-07").expense, Decimal::ZERO);
    assert_eq!(on("2025-06-10").income, Decimal::from(3000));
    assert_eq!(on("2025-06-10").balance, Decimal::from(8900));
    assert_eq!(f.summary_metrics.total_projected_income, Decimal::from(3000));
    assert_eq!(f.summary_metrics.lowest_projected_balance, Decimal::from(6050));

    let dates: Vec<NaiveDate> = f.warnings.iter().map(|w| w.date).collect();
    assert_eq!(
        dates,
        ["2025-06-05", "2025-06-06", "2025-06-07", "2025-06-08", "2025-06-09"]
            .iter()
            .map(|d| day(d))
            .collect::<Vec<_>>()
    );
    assert_eq!(
        f.warnings[0].message,
        "Alert for Jun 5, 2025: Balance may drop below threshold (7000) due to a large payment of 2500.00 for \"Phone\"."
    );
}

#[tokio::test]
async fn forecast_horizon_is_configurable() {
    let ctx = seeded();
    let f = ctx
        .compute_forecast("u1", Some(0), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(f.daily_balances.len(), 1);
}

#[tokio::test]
async fn oversized_horizons_are_rejected() {
    let ctx = seeded();
    let cancel = CancellationToken::new();
    for horizon in [MAX_HORIZON_DAYS + 1, u32::MAX] {
        let res = ctx.compute_forecast("u1", Some(horizon), &cancel).await;
        assert!(matches!(res, Err(Error::Validation(_))));
    }
    let f = ctx
        .compute_forecast("u1", Some(MAX_HORIZON_DAYS), &cancel)
        .await
        .unwrap();
    assert_eq!(f.daily_balances.len(), MAX_HORIZON_DAYS as usize + 1);
}

#[tokio::test]
async fn user_without_data_gets_a_flat_neutral_forecast() {
    let ctx = seeded();
    let f = ctx
        .compute_forecast("nobody", Some(7), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(f.daily_balances.len(), 8);
    assert!(f.daily_balances.iter().all(|p| p.balance.is_zero()));
    assert!(f.warnings.is_empty());
    assert_eq!(f.warning_threshold, Decimal::ZERO);
}

#[tokio::test]
async fn missing_table_configuration_fails_the_request() {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let ctx = Context::new(store, Config::default());
    let res = ctx.compute_forecast("u1", None, &CancellationToken::new()).await;
    match res {
        Err(Error::Configuration(msg)) => assert!(msg.contains("_TABLE_ID")),
        other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn cancelled_forecast_returns_cancelled() {
    let ctx = seeded();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let res = ctx.compute_forecast("u1", None, &cancel).await;
    assert!(matches!(res, Err(Error::Cancelled)));
}

#[tokio::test]
async fn cash_flow_warnings_apply_the_three_rules() {
    let ctx = seeded();
    let alerts = ctx
        .compute_cash_flow_warnings("u1", &CancellationToken::new())
        .await
        .unwrap();
    let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![AlertKind::Urgent, AlertKind::Critical, AlertKind::Warning]
    );
    assert_eq!(
        alerts[0].message,
        "URGENT: A major installment of 13000.00 TRY is due in 6 days."
    );
    assert!(alerts[1].message.contains("15500.00 TRY"));
    assert!(alerts[2].message.contains("'Furniture'"));
}
