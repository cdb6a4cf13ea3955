// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneycast::analysis::{allocate, savings_pool};
use moneycast::config::{Config, Table};
use moneycast::models::{SavingsGoal, Transaction};
use moneycast::services::Context;
use moneycast::services::savings::GoalInput;
use moneycast::store::LocalStore;
use moneycast::Error;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn goal(name: &str, target: i64, priority: i64) -> SavingsGoal {
    SavingsGoal {
        id: None,
        name: name.to_string(),
        target_amount: Decimal::from(target),
        priority,
        target_date: None,
        user_id: "u1".into(),
    }
}

fn tx(amount: i64) -> Transaction {
    Transaction {
        id: None,
        date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        amount: Decimal::from(amount),
        category_id: None,
        bank: None,
        description: None,
        ref_no: None,
        user_id: "u1".into(),
    }
}

#[test]
fn waterfall_fills_goals_in_priority_order() {
    let goals = vec![goal("Holiday", 50, 2), goal("Emergency", 100, 1)];
    let report = allocate(Decimal::from(120), &goals);
    assert_eq!(report.total_savings_pool, Decimal::from(120));
    assert_eq!(report.goals[0].goal.name, "Emergency");
    assert_eq!(report.goals[0].current_amount, Decimal::from(100));
    assert!(report.goals[0].is_fully_funded);
    assert_eq!(report.goals[1].current_amount, Decimal::from(20));
    assert_eq!(report.goals[1].progress_percentage, Decimal::from(40));
    assert!(!report.goals[1].is_fully_funded);
}

#[test]
fn empty_or_negative_pool_funds_nothing() {
    let goals = vec![goal("A", 100, 1), goal("B", 50, 2)];
    for pool in [Decimal::ZERO, Decimal::from(-300)] {
        let report = allocate(pool, &goals);
        assert_eq!(report.total_savings_pool, pool);
        assert!(report.goals.iter().all(|g| g.current_amount.is_zero()));
        assert!(report.goals.iter().all(|g| !g.is_fully_funded));
    }
}

#[test]
fn pool_is_income_minus_expenses() {
    assert_eq!(savings_pool(&[tx(1000), tx(-250), tx(-50)]), Decimal::from(700));
    assert_eq!(savings_pool(&[tx(-10)]), Decimal::from(-10));
    assert_eq!(savings_pool(&[]), Decimal::ZERO);
}

fn context() -> (Arc<LocalStore>, Context) {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let ctx = Context::new(store.clone(), Config::default().with_local_tables())
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    (store, ctx)
}

#[tokio::test]
async fn goals_with_progress_is_repeatable() {
    let (store, ctx) = context();
    let cancel = CancellationToken::new();
    let tables = &ctx.config.tables;
    store
        .insert_rows(
            tables.require(Table::BankStatements).unwrap(),
            vec![
                json!({"date": "2025-01-05", "amount": "3000", "user_id": "u1"}),
                json!({"date": "2025-01-09", "amount": "-1200.50", "user_id": "u1"}),
                json!({"date": "2025-01-09", "amount": "99999", "user_id": "u2"}),
            ],
        )
        .unwrap();
    store
        .insert_rows(
            tables.require(Table::SavingsGoals).unwrap(),
            vec![
                json!({"goal_name": "Car", "target_amount": 5000, "priority": 2, "user_id": "u1"}),
                json!({"goal_name": "Buffer", "target_amount": 1000, "priority": 1, "user_id": "u1"}),
            ],
        )
        .unwrap();

    let first = ctx.savings_goals_with_progress("u1", &cancel).await.unwrap();
    let second = ctx.savings_goals_with_progress("u1", &cancel).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total_savings_pool, Decimal::new(179950, 2));
    assert_eq!(first.goals[0].goal.name, "Buffer");
    assert_eq!(first.goals[1].current_amount, Decimal::new(79950, 2));
}

#[tokio::test]
async fn goal_crud_checks_input_and_ownership() {
    let (_store, ctx) = context();
    let date = NaiveDate::from_ymd_opt(2026, 1, 1);

    let missing = ctx
        .create_goal("u1", GoalInput { name: Some("Bike".into()), ..GoalInput::default() })
        .await;
    assert!(matches!(missing, Err(Error::Validation(_))));

    let id = ctx
        .create_goal(
            "u1",
            GoalInput {
                name: Some("Bike".into()),
                target_amount: Some(Decimal::from(800)),
                priority: Some(1),
                target_date: date,
            },
        )
        .await
        .unwrap()
        .unwrap();

    let bad_priority = GoalInput { priority: Some(0), ..GoalInput::default() };
    assert!(matches!(
        ctx.update_goal("u1", id, bad_priority).await,
        Err(Error::Validation(_))
    ));
    let rename = GoalInput { name: Some("E-bike".into()), ..GoalInput::default() };
    assert!(matches!(
        ctx.update_goal("u2", id, rename.clone()).await,
        Err(Error::Authorization(_))
    ));
    ctx.update_goal("u1", id, rename).await.unwrap();
    assert!(matches!(ctx.delete_goal("u2", id).await, Err(Error::Authorization(_))));
    ctx.delete_goal("u1", id).await.unwrap();
    assert!(matches!(ctx.delete_goal("u1", id).await, Err(Error::NotFound(_))));
}
