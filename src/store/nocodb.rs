// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Page, Query, RecordStore};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const UA: &str = concat!(
    "moneycast/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/moneycast)"
);

/// NocoDB v2 records API.
#[derive(Debug, Clone)]
pub struct NocoClient {
    http: Client,
    base_url: String,
    token: String,
}

impl NocoClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(UA)
            .build()
            .map_err(|e| Error::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let (url, token) = cfg.require_api()?;
        Self::new(url, token, Duration::from_secs(cfg.request_timeout_secs))
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/api/v2/tables/{}/records", self.base_url, table)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http.request(method, url).header("xc-token", &self.token)
    }

    async fn send_json(&self, req: RequestBuilder, what: &str) -> Result<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, what, "record store request failed");
            return Err(Error::upstream(format!("{} failed with HTTP {}: {}", what, status, body)));
        }
        Ok(resp.json::<Value>().await?)
    }
}

fn as_rows(v: Value) -> Vec<Value> {
    match v {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn single_or_batch(mut records: Vec<Value>) -> Value {
    if records.len() == 1 {
        records.remove(0)
    } else {
        Value::Array(records)
    }
}

#[async_trait]
impl RecordStore for NocoClient {
    fn backend_tag(&self) -> &'static str {
        "nocodb"
    }

    async fn list(&self, table: &str, query: &Query) -> Result<Page> {
        let mut params: Vec<(&str, String)> = vec![("where", query.where_clause()?)];
        if let Some(limit) = query.limit_value() {
            params.push(("limit", limit.to_string()));
        }
        if query.offset_value() > 0 {
            params.push(("offset", query.offset_value().to_string()));
        }
        if let Some(sort) = query.sort_spec() {
            params.push(("sort", sort.to_string()));
        }
        debug!(table, offset = query.offset_value(), "list records");
        let req = self
            .request(Method::GET, self.records_url(table))
            .query(&params);
        let body = self.send_json(req, "list").await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get(&self, table: &str, id: i64) -> Result<Option<Value>> {
        let url = format!("{}/{}", self.records_url(table), id);
        let resp = self.request(Method::GET, url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::upstream(format!("get {} failed with HTTP {}", id, status)));
        }
        let body = resp.json::<Value>().await?;
        Ok(match body {
            Value::Object(ref m) if m.is_empty() => None,
            Value::Null => None,
            v => Some(v),
        })
    }

    async fn create(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let req = self
            .request(Method::POST, self.records_url(table))
            .json(&single_or_batch(records));
        Ok(as_rows(self.send_json(req, "create").await?))
    }

    async fn update(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let req = self
            .request(Method::PATCH, self.records_url(table))
            .json(&single_or_batch(records));
        Ok(as_rows(self.send_json(req, "update").await?))
    }

    async fn delete(&self, table: &str, id: i64) -> Result<()> {
        let req = self
            .request(Method::DELETE, self.records_url(table))
            .json(&json!({ "Id": id }));
        self.send_json(req, "delete").await?;
        Ok(())
    }
}
