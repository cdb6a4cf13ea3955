// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::CategoryIndex;
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::wire;
use crate::store::{get_owned, record_id};
use crate::utils::{validate_bank, validate_import_amount, validate_import_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Rows per bulk insert.
pub const IMPORT_CHUNK: usize = 1000;

/// A transaction as supplied by an import file or an edit, before validation.
/// The category is given either by id or by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRow {
    #[serde(default, deserialize_with = "wire::text")]
    pub date: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub amount: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub bank: Option<String>,
    #[serde(default, alias = "categories_id", deserialize_with = "wire::opt_id")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub ref_no: Option<String>,
}

impl ImportRow {
    fn validate(&self, categories: &CategoryIndex, today: NaiveDate) -> Result<ValidRow> {
        let date = validate_import_date(&self.date, today)?;
        let amount = validate_import_amount(&self.amount)?;
        let bank = validate_bank(self.bank.as_deref())?;
        let (category_id, _) = match (self.category_id, self.category.as_deref()) {
            (Some(id), _) => categories.resolve_by_id(id)?,
            (None, Some(name)) => categories.resolve_by_name(name)?,
            (None, None) => return Err(Error::validation("category is required")),
        };
        Ok(ValidRow {
            date,
            amount: format!("{:.2}", amount),
            bank,
            categories_id: category_id,
            description: non_blank(&self.description),
            ref_no: non_blank(&self.ref_no),
        })
    }
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ValidRow {
    date: NaiveDate,
    amount: String,
    bank: String,
    categories_id: i64,
    description: Option<String>,
    ref_no: Option<String>,
}

impl ValidRow {
    fn into_record(self, user_id: &str) -> Value {
        json!({
            "date": self.date.to_string(),
            "amount": self.amount,
            "bank": self.bank,
            "categories_id": self.categories_id,
            "description": self.description,
            "ref_no": self.ref_no,
            "user_id": user_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based position in the input.
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub validation_errors: Vec<RowError>,
    pub import_errors: Vec<RowError>,
    pub created_ids: Vec<i64>,
}

impl ImportReport {
    /// True when validation failed and nothing was written.
    pub fn is_rejected(&self) -> bool {
        !self.validation_errors.is_empty()
    }
}

impl Context {
    /// Validates every row first; a single invalid row rejects the batch
    /// before any write. Valid batches are inserted in chunks and a failed
    /// chunk only fails its own rows.
    pub async fn import_transactions(
        &self,
        user_id: &str,
        rows: Vec<ImportRow>,
        cancel: &CancellationToken,
    ) -> Result<ImportReport> {
        if rows.is_empty() {
            return Err(Error::validation("nothing to import"));
        }
        let table = self.table(Table::BankStatements)?;
        let categories = self.category_index(user_id, cancel).await?;
        let today = self.today();
        let total = rows.len();

        let mut valid = Vec::with_capacity(total);
        let mut validation_errors = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            match row.validate(&categories, today) {
                Ok(v) => valid.push(v),
                Err(err) => validation_errors.push(RowError {
                    row: idx + 1,
                    error: err.to_string(),
                }),
            }
        }
        if !validation_errors.is_empty() {
            warn!(
                user_id,
                total,
                invalid = validation_errors.len(),
                "import rejected by validation"
            );
            return Ok(ImportReport {
                total,
                failed: total,
                validation_errors,
                ..ImportReport::default()
            });
        }

        let mut report = ImportReport {
            total,
            ..ImportReport::default()
        };
        let mut first_row = 1;
        let mut pending = valid.into_iter().peekable();
        while pending.peek().is_some() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let chunk: Vec<Value> = pending
                .by_ref()
                .take(IMPORT_CHUNK)
                .map(|v| v.into_record(user_id))
                .collect();
            let n = chunk.len();
            match self.store.create(table, chunk).await {
                Ok(created) => {
                    report.successful += n;
                    report
                        .created_ids
                        .extend(created.iter().filter_map(record_id));
                }
                Err(err) => {
                    warn!(user_id, first_row, rows = n, error = %err, "import chunk failed");
                    report.failed += n;
                    report
                        .import_errors
                        .extend((first_row..first_row + n).map(|row| RowError {
                            row,
                            error: err.to_string(),
                        }));
                }
            }
            first_row += n;
        }
        info!(
            user_id,
            total,
            ok = report.successful,
            failed = report.failed,
            "transactions imported"
        );
        Ok(report)
    }

    /// Replaces a transaction's fields after the same checks as an import.
    pub async fn update_transaction(
        &self,
        user_id: &str,
        id: i64,
        row: ImportRow,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let table = self.table(Table::BankStatements)?;
        get_owned(self.store.as_ref(), table, id, user_id, "transaction").await?;
        let categories = self.category_index(user_id, cancel).await?;
        let valid = row.validate(&categories, self.today())?;
        let mut body = valid.into_record(user_id);
        if let Some(map) = body.as_object_mut() {
            map.insert("Id".into(), json!(id));
        }
        self.store.update(table, vec![body]).await?;
        info!(user_id, id, "transaction updated");
        Ok(())
    }

    pub async fn delete_transaction(&self, user_id: &str, id: i64) -> Result<()> {
        let table = self.table(Table::BankStatements)?;
        get_owned(self.store.as_ref(), table, id, user_id, "transaction").await?;
        self.store.delete(table, id).await?;
        info!(user_id, id, "transaction deleted");
        Ok(())
    }
}
