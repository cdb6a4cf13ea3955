// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite-backed record store. Each record is a JSON body keyed by table id
//! and a per-table integer id. The owner clause runs in SQL; the rest of a
//! query is evaluated in memory with [`Filter::matches`](super::Filter::matches)
//! and the result is kept until the next write, so paging through it parses
//! the rows once.

use super::{Page, PageInfo, Query, RecordStore, record_id};
use crate::error::{Error, Result};
use crate::models::wire::decimal_from_value;
use async_trait::async_trait;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneycast", "moneycast"));

pub fn default_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .ok_or_else(|| Error::Configuration("could not determine data dir".into()))?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir)
        .map_err(|e| Error::Configuration(format!("create {}: {}", data_dir.display(), e)))?;
    Ok(data_dir.join("moneycast.sqlite"))
}

/// The last listed query, filtered and sorted.
struct ListCache {
    key: String,
    generation: u64,
    rows: Arc<Vec<Value>>,
}

pub struct LocalStore {
    conn: Mutex<Connection>,
    /// Bumped by every write while the connection is held.
    generation: AtomicU64,
    last_list: Mutex<Option<ListCache>>,
}

impl LocalStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            generation: AtomicU64::new(0),
            last_list: Mutex::new(None),
        })
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, atomic::Ordering::SeqCst);
    }

    fn cached(&self, key: &str) -> Result<Option<Arc<Vec<Value>>>> {
        let cache = self
            .last_list
            .lock()
            .map_err(|_| Error::upstream("local store cache lock poisoned"))?;
        let current = self.generation.load(atomic::Ordering::SeqCst);
        Ok(cache
            .as_ref()
            .filter(|c| c.key == key && c.generation == current)
            .map(|c| Arc::clone(&c.rows)))
    }

    fn remember(&self, cache: ListCache) -> Result<()> {
        let mut slot = self
            .last_list
            .lock()
            .map_err(|_| Error::upstream("local store cache lock poisoned"))?;
        *slot = Some(cache);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::upstream("local store lock poisoned"))
    }

    /// Inserts rows synchronously; handy for seeding fixtures.
    pub fn insert_rows(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM records WHERE table_id=?1",
            params![table],
            |r| r.get(0),
        )?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut body) = row else {
                return Err(Error::validation("record must be a JSON object"));
            };
            next += 1;
            body.insert("Id".into(), Value::from(next));
            tx.execute(
                "INSERT INTO records(table_id, id, body) VALUES (?1,?2,?3)",
                params![table, next, serde_json::to_string(&body)?],
            )?;
            out.push(Value::Object(body));
        }
        self.bump_generation();
        tx.commit()?;
        Ok(out)
    }

    /// The owner's rows in id order, with the write generation they were
    /// read at. The owner clause runs in SQL against an expression index.
    fn load_owned(&self, table: &str, owner: &str) -> Result<(Vec<Value>, u64)> {
        let conn = self.lock()?;
        let generation = self.generation.load(atomic::Ordering::SeqCst);
        let mut stmt = conn.prepare_cached(
            "SELECT body FROM records
             WHERE table_id=?1 AND json_extract(body, '$.user_id')=?2
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![table, owner], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for body in rows {
            out.push(serde_json::from_str(&body?)?);
        }
        Ok((out, generation))
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS records(
        table_id TEXT NOT NULL,
        id INTEGER NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY(table_id, id)
    );
    CREATE INDEX IF NOT EXISTS records_owner
        ON records(table_id, json_extract(body, '$.user_id'));
    "#,
    )?;
    Ok(())
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => match (decimal_from_value(x), decimal_from_value(y)) {
            (Some(dx), Some(dy)) => dx.cmp(&dy),
            _ => match (x.as_str(), y.as_str()) {
                (Some(sx), Some(sy)) => sx.cmp(sy),
                _ => x.to_string().cmp(&y.to_string()),
            },
        },
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, table: &str, query: &Query) -> Result<Page> {
        // Render first so invalid filters fail the same way as on the remote backend.
        let key = format!(
            "{}|{}|{}",
            table,
            query.where_clause()?,
            query.sort_spec().unwrap_or_default()
        );
        let rows = match self.cached(&key)? {
            Some(rows) => rows,
            None => {
                let (loaded, generation) = self.load_owned(table, query.owner())?;
                let mut rows: Vec<Value> =
                    loaded.into_iter().filter(|row| query.matches(row)).collect();
                if let Some(spec) = query.sort_spec() {
                    let (field, desc) = match spec.strip_prefix('-') {
                        Some(f) => (f, true),
                        None => (spec, false),
                    };
                    rows.sort_by(|a, b| {
                        let ord = compare_field(a, b, field);
                        if desc { ord.reverse() } else { ord }
                    });
                }
                let rows = Arc::new(rows);
                self.remember(ListCache {
                    key,
                    generation,
                    rows: Arc::clone(&rows),
                })?;
                rows
            }
        };
        let total = rows.len();
        let offset = query.offset_value().min(total);
        let end = match query.limit_value() {
            Some(limit) => offset.saturating_add(limit).min(total),
            None => total,
        };
        debug!(table, total, offset, "local list");
        Ok(Page {
            list: rows[offset..end].to_vec(),
            page_info: PageInfo {
                total_rows: Some(total as u64),
                is_last_page: Some(end >= total),
            },
        })
    }

    async fn get(&self, table: &str, id: i64) -> Result<Option<Value>> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM records WHERE table_id=?1 AND id=?2",
                params![table, id],
                |r| r.get(0),
            )
            .optional()?;
        body.map(|b| serde_json::from_str(&b).map_err(Error::from))
            .transpose()
    }

    async fn create(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        self.insert_rows(table, records)
    }

    async fn update(&self, table: &str, records: Vec<Value>) -> Result<Vec<Value>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut out = Vec::with_capacity(records.len());
        for patch in records {
            let id = record_id(&patch)
                .ok_or_else(|| Error::validation("update record is missing Id"))?;
            let current: Option<String> = tx
                .query_row(
                    "SELECT body FROM records WHERE table_id=?1 AND id=?2",
                    params![table, id],
                    |r| r.get(0),
                )
                .optional()?;
            let current = current.ok_or_else(|| Error::NotFound(format!("record {}", id)))?;
            let mut body: serde_json::Map<String, Value> = serde_json::from_str(&current)?;
            if let Value::Object(fields) = patch {
                for (k, v) in fields {
                    body.insert(k, v);
                }
            }
            tx.execute(
                "UPDATE records SET body=?3 WHERE table_id=?1 AND id=?2",
                params![table, id, serde_json::to_string(&body)?],
            )?;
            out.push(Value::Object(body));
        }
        self.bump_generation();
        tx.commit()?;
        Ok(out)
    }

    async fn delete(&self, table: &str, id: i64) -> Result<()> {
        let conn = self.lock()?;
        self.bump_generation();
        let n = conn.execute(
            "DELETE FROM records WHERE table_id=?1 AND id=?2",
            params![table, id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("record {}", id)));
        }
        Ok(())
    }
}
