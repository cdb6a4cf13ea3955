// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Request pipelines. Each operation is a method on [`Context`], which owns
//! the record store and configuration explicitly; there is no process-wide
//! client.

pub mod anomalies;
pub mod budgets;
pub mod cashflow;
pub mod forecast;
pub mod installments;
pub mod reports;
pub mod savings;
pub mod settings;
pub mod subscriptions;
pub mod transactions;

use crate::analysis::CategoryIndex;
use crate::config::{Config, Table};
use crate::error::Result;
use crate::models::Category;
use crate::store::{self, Query, RecordStore};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    today: Option<NaiveDate>,
}

impl Context {
    pub fn new(store: Arc<dyn RecordStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            today: None,
        }
    }

    /// Pins "today"; used by tests and replays.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub(crate) fn table(&self, table: Table) -> Result<&str> {
        self.config.tables.require(table)
    }

    /// Every matching row of `table`, decoded; malformed rows are skipped.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        table: Table,
        query: Query,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        store::fetch_rows(
            self.store.as_ref(),
            self.table(table)?,
            &query,
            self.config.page_size,
            self.config.max_records,
            cancel,
        )
        .await
    }

    /// At most `limit` rows, in one request.
    pub(crate) async fn fetch_limited<T: DeserializeOwned>(
        &self,
        table: Table,
        query: Query,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        store::fetch_rows(
            self.store.as_ref(),
            self.table(table)?,
            &query,
            self.config.page_size.min(limit.max(1)),
            limit,
            cancel,
        )
        .await
    }

    pub async fn category_index(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<CategoryIndex> {
        let categories: Vec<Category> = self
            .fetch(Table::Categories, Query::owned_by(user_id), cancel)
            .await?;
        Ok(CategoryIndex::from_categories(
            &categories,
            &self.config.spending_category_type,
        ))
    }
}
