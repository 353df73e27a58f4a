//! In-memory backend
//!
//! Rows live in ordered maps guarded by `tokio::sync::RwLock`. Not durable:
//! all state is lost when the process exits. Tables spring into existence on
//! first insert, reading a table that was never written behaves like reading
//! an empty one.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Backend, BackendResult, Field, Row};
use crate::key::EntryKey;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, BTreeMap<EntryKey, Row>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch(&self, table: &str, key: &EntryKey) -> BackendResult<Option<Row>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| rows.get(key)).cloned())
    }

    async fn insert_if_absent(&self, table: &str, row: &Row) -> BackendResult<bool> {
        // One write lock covers the check and the insert.
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(&row.key) {
            return Ok(false);
        }
        rows.insert(row.key.clone(), row.clone());
        Ok(true)
    }

    async fn update_field(
        &self,
        table: &str,
        key: &EntryKey,
        field: Field,
        value: &str,
    ) -> BackendResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.get_mut(table).and_then(|rows| rows.get_mut(key)) {
            Some(row) => {
                row.set(field, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, table: &str, key: &EntryKey) -> BackendResult<()> {
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            rows.remove(key);
        }
        Ok(())
    }

    async fn names(
        &self,
        table: &str,
        owner: &str,
        after: Option<&str>,
        limit: usize,
    ) -> BackendResult<Vec<String>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        let start = match after {
            Some(name) => Bound::Excluded(EntryKey::new(owner, name)),
            None => Bound::Included(EntryKey::new(owner, "")),
        };
        Ok(rows
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| key.owner() == owner)
            .take(limit)
            .map(|(key, _)| key.name().to_string())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
