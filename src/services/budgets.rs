// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::{Budget, Transaction};
use crate::store::{Filter, Query, get_owned, record_id};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetInput {
    pub category_id: i64,
    pub target_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BudgetInput {
    fn validate(&self) -> Result<()> {
        if self.target_amount <= Decimal::ZERO {
            return Err(Error::validation("invalid target amount"));
        }
        if self.start_date > self.end_date {
            return Err(Error::validation(
                "start date must be before or on the end date",
            ));
        }
        Ok(())
    }

    fn body(&self) -> serde_json::Map<String, Value> {
        let mut body = serde_json::Map::new();
        body.insert("categories_id".into(), json!(self.category_id));
        body.insert("target_amount".into(), json!(self.target_amount));
        body.insert("start_date".into(), json!(self.start_date.to_string()));
        body.insert("end_date".into(), json!(self.end_date.to_string()));
        body
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetWithSpending {
    #[serde(flatten)]
    pub budget: Budget,
    pub spent_amount: Decimal,
}

impl Context {
    pub async fn create_budget(&self, user_id: &str, input: BudgetInput) -> Result<Option<i64>> {
        input.validate()?;
        let mut body = input.body();
        body.insert("user_id".into(), json!(user_id));
        body.insert("is_active".into(), json!(true));
        let created = self
            .store
            .create(self.table(Table::Budgets)?, vec![Value::Object(body)])
            .await?;
        let id = created.first().and_then(record_id);
        info!(user_id, ?id, "budget created");
        Ok(id)
    }

    pub async fn update_budget(&self, user_id: &str, id: i64, input: BudgetInput) -> Result<()> {
        input.validate()?;
        let table = self.table(Table::Budgets)?;
        get_owned(self.store.as_ref(), table, id, user_id, "budget").await?;
        let mut body = input.body();
        body.insert("Id".into(), json!(id));
        self.store.update(table, vec![Value::Object(body)]).await?;
        Ok(())
    }

    pub async fn delete_budget(&self, user_id: &str, id: i64) -> Result<()> {
        let table = self.table(Table::Budgets)?;
        get_owned(self.store.as_ref(), table, id, user_id, "budget").await?;
        self.store.delete(table, id).await?;
        info!(user_id, id, "budget deleted");
        Ok(())
    }

    /// Active budgets covering today, each with what has been spent in its
    /// category inside its window.
    pub async fn active_budgets(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<BudgetWithSpending>> {
        let today = self.today();
        let budgets: Vec<Budget> = self
            .fetch(
                Table::Budgets,
                Query::owned_by(user_id)
                    .filter(Filter::le("start_date", today))
                    .filter(Filter::ge("end_date", today))
                    .filter(Filter::eq("is_active", true)),
                cancel,
            )
            .await?;

        let mut set = JoinSet::new();
        for (idx, budget) in budgets.into_iter().enumerate() {
            let ctx = self.clone();
            let user = user_id.to_string();
            let cancel = cancel.clone();
            set.spawn(async move {
                let spent = ctx.spent_in_window(&user, &budget, &cancel).await?;
                Ok::<_, Error>((idx, BudgetWithSpending {
                    budget,
                    spent_amount: spent,
                }))
            });
        }
        let mut out = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            let item = joined.map_err(|e| Error::upstream(format!("budget lookup task: {}", e)))??;
            out.push(item);
        }
        out.sort_by_key(|(idx, _)| *idx);
        Ok(out.into_iter().map(|(_, b)| b).collect())
    }

    /// Sum of |expense| in the budget's category within its window.
    async fn spent_in_window(
        &self,
        user_id: &str,
        budget: &Budget,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        let mut query =
            Query::owned_by(user_id).filter(Filter::range("date", budget.start_date, budget.end_date));
        if let Some(cat) = budget.category_id {
            query = query.filter(Filter::eq("categories_id", cat));
        }
        let rows: Vec<Transaction> = self.fetch(Table::BankStatements, query, cancel).await?;
        Ok(rows
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount.abs())
            .sum())
    }
}
