// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Context;
use crate::analysis::recurrence::{SCAN_LIMIT, filter_tracked};
use crate::analysis::{RecurrenceCandidate, detect_recurring};
use crate::config::Table;
use crate::error::{Error, Result};
use crate::models::{Subscription, Transaction};
use crate::store::{Query, get_owned, record_id};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOverview {
    pub subscriptions: Vec<Subscription>,
    pub suggestions: Vec<RecurrenceCandidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSubscription {
    pub name: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub auto_renewal: Option<bool>,
    pub notes: Option<String>,
}

impl NewSubscription {
    /// Prefills a tracking request from a detected candidate.
    pub fn from_candidate(c: &RecurrenceCandidate) -> Self {
        Self {
            name: c.description.trim().to_string(),
            amount: c.amount.abs(),
            billing_cycle: Some(c.recurrence.as_str().to_string()),
            start_date: Some(c.last_payment_date),
            next_payment_date: Some(c.next_possible_payment_date),
            category_id: c.category,
            ..Self::default()
        }
    }

    fn into_record(self, user_id: &str, default_currency: &str, today: NaiveDate) -> Result<Value> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("subscription name is required"));
        }
        let mut body = Map::new();
        body.insert("user_id".into(), json!(user_id));
        body.insert("name".into(), json!(name));
        body.insert("amount".into(), json!(self.amount));
        body.insert(
            "currency".into(),
            json!(self.currency.unwrap_or_else(|| default_currency.to_string())),
        );
        body.insert(
            "billing_cycle".into(),
            json!(self.billing_cycle.as_deref().unwrap_or("monthly").to_lowercase()),
        );
        body.insert(
            "status".into(),
            json!(self.status.unwrap_or_else(|| "Active".to_string())),
        );
        body.insert(
            "start_date".into(),
            json!(self.start_date.unwrap_or(today).to_string()),
        );
        if let Some(d) = self.next_payment_date {
            body.insert("next_payment_date".into(), json!(d.to_string()));
        }
        if let Some(c) = self.category_id {
            body.insert("categories_id".into(), json!(c));
        }
        body.insert("auto_renewal".into(), json!(self.auto_renewal.unwrap_or(true)));
        if let Some(n) = self.notes {
            body.insert("notes".into(), json!(n));
            body.insert("description".into(), json!(n));
        }
        Ok(Value::Object(body))
    }
}

impl Context {
    /// Tracked subscriptions plus detected recurring payments not yet tracked.
    pub async fn list_subscriptions_and_suggestions(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SubscriptionOverview> {
        let (subscriptions, history) = tokio::try_join!(
            self.fetch::<Subscription>(
                Table::Subscriptions,
                Query::owned_by(user_id).sort("next_payment_date"),
                cancel,
            ),
            self.fetch_limited::<Transaction>(
                Table::BankStatements,
                Query::owned_by(user_id).sort("-date"),
                SCAN_LIMIT,
                cancel,
            ),
        )?;
        let detected = detect_recurring(&history);
        let found = detected.len();
        let suggestions = filter_tracked(detected, &subscriptions);
        info!(
            user_id,
            tracked = subscriptions.len(),
            detected = found,
            suggested = suggestions.len(),
            "subscriptions listed"
        );
        Ok(SubscriptionOverview {
            subscriptions,
            suggestions,
        })
    }

    pub async fn track_subscription(
        &self,
        user_id: &str,
        new: NewSubscription,
    ) -> Result<Option<i64>> {
        let body = new.into_record(user_id, &self.config.default_currency, self.today())?;
        let created = self
            .store
            .create(self.table(Table::Subscriptions)?, vec![body])
            .await?;
        let id = created.first().and_then(record_id);
        info!(user_id, ?id, "subscription tracked");
        Ok(id)
    }

    pub async fn untrack_subscription(&self, user_id: &str, id: i64) -> Result<()> {
        let table = self.table(Table::Subscriptions)?;
        get_owned(self.store.as_ref(), table, id, user_id, "subscription").await?;
        self.store.delete(table, id).await?;
        info!(user_id, id, "subscription untracked");
        Ok(())
    }
}
