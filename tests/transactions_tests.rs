// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use async_trait::async_trait;
use chrono::NaiveDate;
use moneycast::config::{Config, Table};
use moneycast::services::Context;
use moneycast::services::transactions::{IMPORT_CHUNK, ImportRow};
use moneycast::store::{LocalStore, Page, Query, RecordStore};
use moneycast::{Error, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

fn row(date: &str, amount: &str, bank: Option<&str>, category: Option<&str>) -> ImportRow {
    ImportRow {
        date: date.to_string(),
        amount: amount.to_string(),
        bank: bank.map(str::to_string),
        category: category.map(str::to_string),
        description: Some("  corner shop ".into()),
        ..ImportRow::default()
    }
}

fn seed_categories(store: &LocalStore, config: &Config) {
    store
        .insert_rows(
            config.tables.require(Table::Categories).unwrap(),
            vec![
                json!({"category_name": "Market", "type": "spending", "user_id": "u1"}),
                json!({"category_name": "Maaş", "type": "earning", "user_id": "u1"}),
                json!({"category_name": "Hidden", "type": "spending", "user_id": "u2"}),
            ],
        )
        .unwrap();
}

fn context() -> (Arc<LocalStore>, Context) {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let config = Config::default().with_local_tables();
    seed_categories(&store, &config);
    let ctx = Context::new(store.clone(), config)
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    (store, ctx)
}

async fn stored(store: &LocalStore, ctx: &Context, user: &str) -> Vec<Value> {
    let table = ctx.config.tables.require(Table::BankStatements).unwrap();
    store.list(table, &Query::owned_by(user)).await.unwrap().list
}

#[tokio::test]
async fn valid_rows_are_normalised_and_stored() {
    let (store, ctx) = context();
    let rows = vec![
        row("05/03/2025", "₺1,234.5", Some(" Ziraat "), Some("MARKET")),
        ImportRow {
            category_id: Some(2),
            ..row("2025-03-06", "+4000", Some("Ziraat"), None)
        },
        row("2025-03-07", "-12", Some("Ziraat"), Some("maas")),
    ];
    let report = ctx
        .import_transactions("u1", rows, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.successful, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.created_ids, vec![1, 2, 3]);
    assert!(!report.is_rejected());

    let rows = stored(&store, &ctx, "u1").await;
    assert_eq!(rows[0]["date"], json!("2025-03-05"));
    assert_eq!(rows[0]["amount"], json!("1234.50"));
    assert_eq!(rows[0]["bank"], json!("Ziraat"));
    assert_eq!(rows[0]["categories_id"], json!(1));
    assert_eq!(rows[0]["description"], json!("corner shop"));
    assert_eq!(rows[1]["categories_id"], json!(2));
    assert_eq!(rows[2]["categories_id"], json!(2));
}

#[tokio::test]
async fn one_invalid_row_rejects_the_whole_batch() {
    let (store, ctx) = context();
    let rows = vec![
        row("2025-03-05", "10", Some("Ziraat"), Some("Market")),
        row("2025-03-05", "ten", Some("Ziraat"), Some("Market")),
        row("2025-03-05", "10", None, Some("Market")),
        row("1990-01-01", "10", Some("Ziraat"), Some("Market")),
        row("2025-03-05", "10", Some("Ziraat"), Some("Hidden")),
        row("2025-03-05", "10", Some("Ziraat"), None),
    ];
    let report = ctx
        .import_transactions("u1", rows, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.is_rejected());
    assert_eq!(report.total, 6);
    assert_eq!(report.failed, 6);
    assert_eq!(report.successful, 0);
    let bad: Vec<usize> = report.validation_errors.iter().map(|e| e.row).collect();
    assert_eq!(bad, vec![2, 3, 4, 5, 6]);
    assert!(report.validation_errors[1].error.contains("bank"));
    assert!(report.validation_errors[4].error.contains("category is required"));
    assert!(stored(&store, &ctx, "u1").await.is_empty());
}

#[tokio::test]
async fn empty_import_is_a_validation_error() {
    let (_store, ctx) = context();
    let res = ctx
        .import_transactions("u1", Vec::new(), &CancellationToken::new())
        .await;
    assert!(matches!(res, Err(Error::Validation(_))));
}

/// Delegates to a local store but fails the n-th create call.
struct FlakyStore {
    inner: Arc<LocalStore>,
    creates: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn list(&self, table: &str, query: &Query) -> Result<Page> {
        self.inner.list(table, query).await
    }

    async fn get(&self, table: &str, id: i64) -> Result<Option<Value>> {
        self.inner.get(table, id).await
    }

    async fn create(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(Error::upstream("HTTP 500: bulk insert failed"));
        }
        self.inner.create(table, records).await
    }

    async fn update(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        self.inner.update(table, records).await
    }

    async fn delete(&self, table: &str, id: i64) -> Result<()> {
        self.inner.delete(table, id).await
    }
}

#[tokio::test]
async fn a_failed_chunk_only_fails_its_own_rows() {
    let inner = Arc::new(LocalStore::open_in_memory().unwrap());
    let config = Config::default().with_local_tables();
    seed_categories(&inner, &config);
    let flaky = Arc::new(FlakyStore {
        inner: inner.clone(),
        creates: AtomicUsize::new(0),
        fail_on: 2,
    });
    let ctx = Context::new(flaky, config).with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

    let total = IMPORT_CHUNK + 500;
    let rows: Vec<ImportRow> = (0..total)
        .map(|_| row("2025-04-01", "-3.20", Some("Ziraat"), Some("Market")))
        .collect();
    let report = ctx
        .import_transactions("u1", rows, &CancellationToken::new())
        .await
        .unwrap();
    assert!(!report.is_rejected());
    assert_eq!(report.successful, IMPORT_CHUNK);
    assert_eq!(report.failed, 500);
    assert_eq!(report.created_ids.len(), IMPORT_CHUNK);
    assert_eq!(report.import_errors.len(), 500);
    assert_eq!(report.import_errors[0].row, IMPORT_CHUNK + 1);
    assert_eq!(report.import_errors[499].row, total);
    assert!(report.import_errors[0].error.contains("bulk insert failed"));
}

#[tokio::test]
async fn cancelled_import_writes_nothing() {
    let (store, ctx) = context();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let res = ctx
        .import_transactions("u1", vec![row("2025-03-05", "1", Some("B"), Some("Market"))], &cancel)
        .await;
    assert!(matches!(res, Err(Error::Cancelled)));
    assert!(stored(&store, &ctx, "u1").await.is_empty());
}

#[tokio::test]
async fn only_the_owner_can_edit_or_delete() {
    let (store, ctx) = context();
    let cancel = CancellationToken::new();
    ctx.import_transactions(
        "u1",
        vec![row("2025-03-05", "-50", Some("Ziraat"), Some("Market"))],
        &cancel,
    )
    .await
    .unwrap();

    let edit = row("2025-03-09", "-75", Some("Akbank"), Some("Market"));
    assert!(matches!(
        ctx.update_transaction("u2", 1, edit.clone(), &cancel).await,
        Err(Error::Authorization(_))
    ));
    assert!(matches!(
        ctx.update_transaction("u1", 1, row("bad", "-75", Some("A"), Some("Market")), &cancel)
            .await,
        Err(Error::Validation(_))
    ));
    ctx.update_transaction("u1", 1, edit, &cancel).await.unwrap();
    let rows = stored(&store, &ctx, "u1").await;
    assert_eq!(rows[0]["amount"], json!("-75.00"));
    assert_eq!(rows[0]["bank"], json!("Akbank"));
    assert_eq!(rows[0]["date"], json!("2025-03-09"));

    assert!(matches!(ctx.delete_transaction("u2", 1).await, Err(Error::Authorization(_))));
    ctx.delete_transaction("u1", 1).await.unwrap();
    assert!(matches!(ctx.delete_transaction("u1", 1).await, Err(Error::NotFound(_))));
}
