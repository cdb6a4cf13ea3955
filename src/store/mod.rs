// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod filter;
pub mod local;
pub mod nocodb;

pub use filter::{Filter, Literal};
pub use local::LocalStore;
pub use nocodb::NocoClient;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Column every query is scoped by.
pub const OWNER_FIELD: &str = "user_id";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub is_last_page: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub list: Vec<Value>,
    #[serde(default)]
    pub page_info: PageInfo,
}

/// A list query. The owner clause is always the outermost AND, and there is
/// no way to build a query without one.
#[derive(Debug, Clone)]
pub struct Query {
    owner: String,
    filter: Option<Filter>,
    sort: Option<String>,
    limit: Option<usize>,
    offset: usize,
}

impl Query {
    pub fn owned_by(user_id: &str) -> Self {
        Self {
            owner: user_id.to_string(),
            filter: None,
            sort: None,
            limit: None,
            offset: 0,
        }
    }

    pub fn filter(mut self, f: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(f),
            None => f,
        });
        self
    }

    /// Column name, prefixed with `-` for descending order.
    pub fn sort(mut self, spec: &str) -> Self {
        self.sort = Some(spec.to_string());
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn sort_spec(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset_value(&self) -> usize {
        self.offset
    }

    pub fn where_filter(&self) -> Filter {
        let owner = Filter::eq(OWNER_FIELD, self.owner.as_str());
        match &self.filter {
            // Wrap the caller's filter as a single group so an OR inside it
            // can never escape the owner clause.
            Some(f) => Filter::And(vec![owner, Filter::And(vec![f.clone()])]),
            None => owner,
        }
    }

    pub fn where_clause(&self) -> Result<String> {
        if self.owner.trim().is_empty() {
            return Err(Error::validation("query owner must not be empty"));
        }
        self.where_filter().render()
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.where_filter().matches(row)
    }
}

/// Tabular record service. Implemented over HTTP for NocoDB and over SQLite
/// for local use.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str {
        "unknown"
    }

    async fn list(&self, table: &str, query: &Query) -> Result<Page>;

    async fn get(&self, table: &str, id: i64) -> Result<Option<Value>>;

    /// Single or batch insert; returns the created rows (at least their ids).
    async fn create(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>>;

    /// Single or batch update; every record must carry its `Id`.
    async fn update(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>>;

    async fn delete(&self, table: &str, id: i64) -> Result<()>;
}

/// Races `fut` against the cancellation token.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}

/// Fetches every page of `query` (or stops at `max_records`). The server's
/// `isLastPage` decides when to stop. A short page ends the walk only when
/// the server leaves that flag out.
pub async fn fetch_all(
    store: &dyn RecordStore,
    table: &str,
    query: &Query,
    page_size: usize,
    max_records: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Value>> {
    let page_size = page_size.max(1);
    let mut rows = Vec::new();
    let mut offset = query.offset_value();
    loop {
        let page_query = query.clone().limit(page_size).offset(offset);
        let page = cancellable(cancel, store.list(table, &page_query)).await?;
        let n = page.list.len();
        rows.extend(page.list);
        let last = page.page_info.is_last_page.unwrap_or(n < page_size);
        if n == 0 || last || rows.len() >= max_records {
            break;
        }
        offset += n;
    }
    rows.truncate(max_records);
    debug!(backend = store.backend_tag(), table, rows = rows.len(), "fetched all pages");
    Ok(rows)
}

/// Decodes rows one by one; rows that do not fit `T` are logged and skipped.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    let total = rows.len();
    let out: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(v) => Some(v),
            Err(err) => {
                debug!(table, error = %err, "skipping malformed row");
                None
            }
        })
        .collect();
    if out.len() < total {
        warn!(table, skipped = total - out.len(), "skipped malformed rows");
    }
    out
}

/// Every page of `query`, decoded.
pub async fn fetch_rows<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: &str,
    query: &Query,
    page_size: usize,
    max_records: usize,
    cancel: &CancellationToken,
) -> Result<Vec<T>> {
    let rows = fetch_all(store, table, query, page_size, max_records, cancel).await?;
    Ok(decode_rows(table, rows))
}

/// Loads a record and checks it belongs to `user_id`.
pub async fn get_owned(
    store: &dyn RecordStore,
    table: &str,
    id: i64,
    user_id: &str,
    what: &str,
) -> Result<Value> {
    let record = store
        .get(table, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {}", what, id)))?;
    let owner = match record.get(OWNER_FIELD) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if owner != user_id {
        return Err(Error::Authorization(format!(
            "you do not have permission to modify {} {}",
            what, id
        )));
    }
    Ok(record)
}

pub fn record_id(row: &Value) -> Option<i64> {
    row.get("Id").and_then(crate::models::wire::id_from_value)
}
