//! SQLite backend
//!
//! Durable row storage. One SQLite table per registry table, keyed by the
//! `(owner, name)` primary key. The connection sits behind a mutex and every
//! statement runs on tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{Backend, BackendError, BackendResult, Field, Row};
use crate::key::EntryKey;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens (or creates) the database file at `path` in WAL mode.
    pub fn open(path: impl AsRef<Path>) -> BackendResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
        info!(path = %path.as_ref().display(), "opened sqlite registry database");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> BackendResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Creates `table` unless it exists.
    pub async fn provision(&self, table: &str) -> BackendResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                spec TEXT,
                drain TEXT,
                failure TEXT,
                acl TEXT,
                PRIMARY KEY (owner, name)
            )",
            quoted(table)?
        );
        self.with_conn(move |conn| {
            conn.execute(&sql, [])?;
            Ok(())
        })
        .await
    }

    async fn with_conn<T, F>(&self, work: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> BackendResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| BackendError::Poisoned)?;
            work(&guard)
        })
        .await?
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn quoted(table: &str) -> BackendResult<String> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(format!("\"{}\"", table))
    } else {
        Err(BackendError::InvalidTableName(table.to_string()))
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn fetch(&self, table: &str, key: &EntryKey) -> BackendResult<Option<Row>> {
        let sql = format!(
            "SELECT spec, drain, failure, acl FROM {} WHERE owner = ?1 AND name = ?2",
            quoted(table)?
        );
        let key = key.clone();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(&sql, params![key.owner(), key.name()], |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })
                .optional()?;
            Ok(row.map(|(spec, drain, failure, acl)| Row {
                key,
                spec,
                drain,
                failure,
                acl,
            }))
        })
        .await
    }

    async fn insert_if_absent(&self, table: &str, row: &Row) -> BackendResult<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (owner, name, spec, drain, failure, acl)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            quoted(table)?
        );
        let row = row.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                &sql,
                params![
                    row.key.owner(),
                    row.key.name(),
                    row.spec,
                    row.drain,
                    row.failure,
                    row.acl
                ],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn update_field(
        &self,
        table: &str,
        key: &EntryKey,
        field: Field,
        value: &str,
    ) -> BackendResult<bool> {
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE owner = ?2 AND name = ?3",
            quoted(table)?,
            field.column()
        );
        let key = key.clone();
        let value = value.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(&sql, params![value, key.owner(), key.name()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn remove(&self, table: &str, key: &EntryKey) -> BackendResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE owner = ?1 AND name = ?2",
            quoted(table)?
        );
        let key = key.clone();
        self.with_conn(move |conn| {
            conn.execute(&sql, params![key.owner(), key.name()])?;
            Ok(())
        })
        .await
    }

    async fn names(
        &self,
        table: &str,
        owner: &str,
        after: Option<&str>,
        limit: usize,
    ) -> BackendResult<Vec<String>> {
        // Names are never empty, so "" sorts before all of them.
        let sql = format!(
            "SELECT name FROM {} WHERE owner = ?1 AND name > ?2 ORDER BY name LIMIT ?3",
            quoted(table)?
        );
        let owner = owner.to_string();
        let after = after.unwrap_or_default().to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let names = stmt
                .query_map(params![owner, after, limit], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
