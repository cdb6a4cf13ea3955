// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneycast::Error;
use moneycast::{cli, commands};
use moneycast::config::{Config, Table};
use moneycast::services::Context;
use moneycast::services::settings::SettingsUpdate;
use moneycast::store::{LocalStore, Query, RecordStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn context() -> (Arc<LocalStore>, Context) {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let ctx = Context::new(store.clone(), Config::default().with_local_tables());
    (store, ctx)
}

async fn settings_rows(store: &LocalStore, ctx: &Context, user: &str) -> usize {
    let table = ctx.config.tables.require(Table::UserSettings).unwrap();
    store.list(table, &Query::owned_by(user)).await.unwrap().list.len()
}

#[tokio::test]
async fn settings_are_created_once_on_first_access() {
    let (store, ctx) = context();
    let cancel = CancellationToken::new();
    assert!(ctx.find_settings("u1", &cancel).await.unwrap().is_none());

    let first = ctx.get_or_create_settings("u1", &cancel).await.unwrap();
    assert_eq!(first.currency.as_deref(), Some("TRY"));
    assert_eq!(first.anomaly_detection_sensitivity, Decimal::from(3));
    assert!(!first.anomaly_detection_enabled);

    let second = ctx.get_or_create_settings("u1", &cancel).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(settings_rows(&store, &ctx, "u1").await, 1);
}

#[tokio::test]
async fn neutral_settings_do_not_write() {
    let (store, ctx) = context();
    let s = ctx
        .settings_or_neutral("u1", &CancellationToken::new())
        .await
        .unwrap();
    assert!(s.warning_threshold.is_zero());
    assert!(s.monthly_income_estimate.is_zero());
    assert_eq!(settings_rows(&store, &ctx, "u1").await, 0);
}

#[tokio::test]
async fn update_validates_before_writing() {
    let (store, ctx) = context();
    let cancel = CancellationToken::new();
    let bad = [
        SettingsUpdate {
            anomaly_detection_sensitivity: Some(Decimal::from(11)),
            ..SettingsUpdate::default()
        },
        SettingsUpdate {
            warning_threshold: Some(Decimal::from(-1)),
            ..SettingsUpdate::default()
        },
        SettingsUpdate {
            currency: Some("EURO".into()),
            ..SettingsUpdate::default()
        },
    ];
    for update in bad {
        assert!(matches!(
            ctx.update_settings("u1", update, &cancel).await,
            Err(Error::Validation(_))
        ));
    }
    assert!(!ctx.update_settings("u1", SettingsUpdate::default(), &cancel).await.unwrap());
    assert_eq!(settings_rows(&store, &ctx, "u1").await, 0);
}

#[tokio::test]
async fn update_merges_into_the_existing_row() {
    let (store, ctx) = context();
    let cancel = CancellationToken::new();
    let changed = ctx
        .update_settings(
            "u1",
            SettingsUpdate {
                warning_threshold: Some(Decimal::from(500)),
                currency: Some("usd".into()),
                anomaly_detection_enabled: Some(true),
                ..SettingsUpdate::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    assert!(changed);
    ctx.update_settings(
        "u1",
        SettingsUpdate {
            monthly_income_estimate: Some(Decimal::from(42000)),
            ..SettingsUpdate::default()
        },
        &cancel,
    )
    .await
    .unwrap();

    let s = ctx.settings_or_neutral("u1", &cancel).await.unwrap();
    assert_eq!(s.warning_threshold, Decimal::from(500));
    assert_eq!(s.monthly_income_estimate, Decimal::from(42000));
    assert_eq!(s.currency.as_deref(), Some("USD"));
    assert!(s.anomaly_detection_enabled);
    assert_eq!(s.anomaly_detection_sensitivity, Decimal::from(3));
    assert_eq!(settings_rows(&store, &ctx, "u1").await, 1);
}

#[tokio::test]
async fn recalc_income_command_creates_the_row() {
    let (store, ctx) = context();
    let matches =
        cli::build_cli().get_matches_from(["moneycast", "--user", "u1", "settings", "recalc-income"]);
    let (_, sub) = matches.subcommand().unwrap();
    commands::settings::handle(&ctx, "u1", sub, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(settings_rows(&store, &ctx, "u1").await, 1);
    let s = ctx
        .settings_or_neutral("u1", &CancellationToken::new())
        .await
        .unwrap();
    assert!(s.monthly_income_estimate.is_zero());
}
