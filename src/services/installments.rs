// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::Installment;
use crate::store::{Filter, Query, get_owned, record_id};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One entry of a batch update. Only the listed fields may change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallmentUpdate {
    pub id: i64,
    pub paid: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub installment_payment: Option<Decimal>,
    pub categories_id: Option<i64>,
}

impl InstallmentUpdate {
    fn patch(&self) -> Option<Value> {
        let mut body = Map::new();
        if let Some(p) = self.paid {
            body.insert("paid".into(), json!(p));
        }
        if let Some(d) = self.start_date {
            body.insert("start_date".into(), json!(d.to_string()));
        }
        if let Some(a) = self.installment_payment {
            body.insert("installment_payment".into(), json!(a));
        }
        if let Some(c) = self.categories_id {
            body.insert("categories_id".into(), json!(c));
        }
        if body.is_empty() {
            return None;
        }
        body.insert("Id".into(), json!(self.id));
        Some(Value::Object(body))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub id: i64,
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub successful: Vec<i64>,
    pub failed: Vec<BatchFailure>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn fail(&mut self, id: i64, err: Error) {
        self.failed.push(BatchFailure {
            id,
            status: err.status_code(),
            message: err.to_string(),
        });
    }
}

impl Context {
    pub async fn list_installments(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Installment>> {
        self.fetch(
            Table::Installments,
            Query::owned_by(user_id).sort("start_date"),
            cancel,
        )
        .await
    }

    pub async fn set_installment_paid(&self, user_id: &str, id: i64, paid: bool) -> Result<()> {
        let table = self.table(Table::Installments)?;
        get_owned(self.store.as_ref(), table, id, user_id, "installment").await?;
        self.store
            .update(table, vec![json!({ "Id": id, "paid": paid })])
            .await?;
        info!(user_id, id, paid, "installment updated");
        Ok(())
    }

    /// Fail-soft: each entry succeeds or fails on its own. Entries the caller
    /// does not own, or that change nothing, are reported as failures.
    pub async fn batch_update_installments(
        &self,
        user_id: &str,
        updates: Vec<InstallmentUpdate>,
        cancel: &CancellationToken,
    ) -> Result<BatchResult> {
        if updates.is_empty() {
            return Err(Error::validation("batch must contain at least one update"));
        }
        let table = self.table(Table::Installments)?;
        let ids: Vec<i64> = updates.iter().map(|u| u.id).collect();
        let owned: Vec<Installment> = self
            .fetch(
                Table::Installments,
                Query::owned_by(user_id).filter(Filter::is_in("Id", ids)),
                cancel,
            )
            .await?;
        let authorized: HashSet<i64> = owned.iter().filter_map(|i| i.id).collect();

        let mut result = BatchResult::default();
        for update in updates {
            if !authorized.contains(&update.id) {
                result.fail(
                    update.id,
                    Error::Authorization(format!("installment {}", update.id)),
                );
                continue;
            }
            let Some(patch) = update.patch() else {
                result.fail(
                    update.id,
                    Error::validation(format!("no updatable fields for installment {}", update.id)),
                );
                continue;
            };
            match self.store.update(table, vec![patch]).await {
                Ok(rows) => result
                    .successful
                    .push(rows.first().and_then(record_id).unwrap_or(update.id)),
                Err(err) => {
                    warn!(id = update.id, error = %err, "installment update failed");
                    result.fail(update.id, err);
                }
            }
        }
        info!(
            user_id,
            ok = result.successful.len(),
            failed = result.failed.len(),
            "installment batch applied"
        );
        Ok(result)
    }

    pub async fn delete_installment(&self, user_id: &str, id: i64) -> Result<()> {
        let table = self.table(Table::Installments)?;
        get_owned(self.store.as_ref(), table, id, user_id, "installment").await?;
        self.store.delete(table, id).await
    }
}
