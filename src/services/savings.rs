// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::{SavingsReport, allocate, savings_pool};
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::{SavingsGoal, Transaction};
use crate::store::{Query, get_owned, record_id};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalInput {
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub priority: Option<i64>,
    pub target_date: Option<NaiveDate>,
}

impl GoalInput {
    fn validate_fields(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::validation("goal name must not be empty"));
            }
        }
        if let Some(t) = self.target_amount {
            if t <= Decimal::ZERO {
                return Err(Error::validation("target amount must be positive"));
            }
        }
        if let Some(p) = self.priority {
            if p < 1 {
                return Err(Error::validation("priority must be 1 or greater"));
            }
        }
        Ok(())
    }

    fn fields(&self) -> Map<String, Value> {
        let mut body = Map::new();
        if let Some(name) = &self.name {
            body.insert("goal_name".into(), json!(name.trim()));
        }
        if let Some(t) = self.target_amount {
            body.insert("target_amount".into(), json!(t));
        }
        if let Some(p) = self.priority {
            body.insert("priority".into(), json!(p));
        }
        if let Some(d) = self.target_date {
            body.insert("target_date".into(), json!(d.to_string()));
        }
        body
    }
}

impl Context {
    /// Savings pool over the full history, allocated across goals by priority.
    pub async fn savings_goals_with_progress(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SavingsReport> {
        let (transactions, goals) = tokio::try_join!(
            self.fetch::<Transaction>(Table::BankStatements, Query::owned_by(user_id), cancel),
            self.fetch::<SavingsGoal>(
                Table::SavingsGoals,
                Query::owned_by(user_id).sort("priority"),
                cancel,
            ),
        )?;
        let pool = savings_pool(&transactions);
        info!(user_id, %pool, goals = goals.len(), "savings progress computed");
        Ok(allocate(pool, &goals))
    }

    pub async fn create_goal(&self, user_id: &str, input: GoalInput) -> Result<Option<i64>> {
        if input.name.as_deref().is_none_or(|n| n.trim().is_empty())
            || input.target_amount.is_none()
            || input.priority.is_none()
            || input.target_date.is_none()
        {
            return Err(Error::validation(
                "goal name, target amount, priority and target date are required",
            ));
        }
        input.validate_fields()?;
        let mut body = input.fields();
        body.insert("user_id".into(), json!(user_id));
        let created = self
            .store
            .create(self.table(Table::SavingsGoals)?, vec![Value::Object(body)])
            .await?;
        Ok(created.first().and_then(record_id))
    }

    pub async fn update_goal(&self, user_id: &str, id: i64, input: GoalInput) -> Result<()> {
        input.validate_fields()?;
        let mut patch = input.fields();
        if patch.is_empty() {
            return Err(Error::validation("nothing to update"));
        }
        let table = self.table(Table::SavingsGoals)?;
        get_owned(self.store.as_ref(), table, id, user_id, "savings goal").await?;
        patch.insert("Id".into(), json!(id));
        self.store.update(table, vec![Value::Object(patch)]).await?;
        Ok(())
    }

    pub async fn delete_goal(&self, user_id: &str, id: i64) -> Result<()> {
        let table = self.table(Table::SavingsGoals)?;
        get_owned(self.store.as_ref(), table, id, user_id, "savings goal").await?;
        self.store.delete(table, id).await
    }
}
