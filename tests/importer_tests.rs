// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use moneycast::config::{Config, Table};
use moneycast::services::Context;
use moneycast::store::{LocalStore, Query, RecordStore};
use moneycast::{cli, commands::importer};
use serde_json::{Value, json};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

fn context() -> (Arc<LocalStore>, Context) {
    let store = Arc::new(LocalStore::open_in_memory().unwrap());
    let config = Config::default().with_local_tables();
    store
        .insert_rows(
            config.tables.require(Table::Categories).unwrap(),
            vec![json!({"category_name": "Market", "type": "spending", "user_id": "u1"})],
        )
        .unwrap();
    let ctx = Context::new(store.clone(), config)
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    (store, ctx)
}

async fn stored(store: &LocalStore, ctx: &Context) -> Vec<Value> {
    let table = ctx.config.tables.require(Table::BankStatements).unwrap();
    store.list(table, &Query::owned_by("u1")).await.unwrap().list
}

async fn run_import(ctx: &Context, path: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from([
        "moneycast",
        "--user",
        "u1",
        "import",
        "transactions",
        "--path",
        path,
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    importer::handle(ctx, "u1", sub, &CancellationToken::new()).await
}

#[test]
fn csv_columns_are_matched_by_header_name() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Description,Amount,Date,Bank,Category,ref_no\n Market run ,-12.40, 2025-05-02 ,Ziraat,market,\nRent,-900,03/05/2025,Ziraat,,X1"
    )
    .unwrap();
    file.flush().unwrap();

    let rows = importer::read_rows(file.path()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025-05-02");
    assert_eq!(rows[0].amount, "-12.40");
    assert_eq!(rows[0].description.as_deref(), Some("Market run"));
    assert_eq!(rows[0].category.as_deref(), Some("market"));
    assert_eq!(rows[0].ref_no, None);
    assert_eq!(rows[1].category, None);
    assert_eq!(rows[1].ref_no.as_deref(), Some("X1"));
}

#[tokio::test]
async fn importer_trims_cli_path_argument() {
    let (store, ctx) = context();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,amount,bank,category,description\n2025-05-02,-12.40,Ziraat,Market,Shop"
    )
    .unwrap();
    file.flush().unwrap();

    let padded = format!("  {}  ", file.path().to_str().unwrap());
    run_import(&ctx, &padded).await.unwrap();

    let rows = stored(&store, &ctx).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["amount"], json!("-12.40"));
    assert_eq!(rows[0]["categories_id"], json!(1));
}

#[tokio::test]
async fn json_files_are_read_as_row_arrays() {
    let (store, ctx) = context();
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"[{{"date": "2025-05-02", "amount": -7.5, "bank": "Akbank", "categories_id": 1}},
           {{"date": "2025-05-03", "amount": "100", "bank": "Akbank", "category": "Market"}}]"#
    )
    .unwrap();
    file.flush().unwrap();

    run_import(&ctx, file.path().to_str().unwrap()).await.unwrap();
    let rows = stored(&store, &ctx).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["amount"], json!("-7.50"));
    assert_eq!(rows[1]["amount"], json!("100.00"));
}

#[tokio::test]
async fn rejected_import_is_a_command_error() {
    let (store, ctx) = context();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,amount,bank,category\n2025-05-02,-1,Ziraat,Market\nnot-a-date,-1,Ziraat,Market"
    )
    .unwrap();
    file.flush().unwrap();

    let err = run_import(&ctx, file.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("1 of 2 rows failed validation"));
    assert!(stored(&store, &ctx).await.is_empty());
}
