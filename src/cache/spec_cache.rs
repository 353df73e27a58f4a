//! Spec Cache Module
//!
//! Read-through, write-invalidate cache over the `spec` field of a table.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::error::Result;
use crate::key::EntryKey;
use crate::spec::SpecValue;
use crate::table::{Field, Table};

/// Default lifetime of a cached spec
pub const DEFAULT_SPEC_TTL: Duration = Duration::from_secs(5 * 60);

// == Spec Cache ==
/// Decorates a [`Table`] with a time-bounded cache of its specs.
///
/// Invalidation is local to this process; other processes serving the same
/// table converge within the TTL.
#[derive(Debug, Clone)]
pub struct SpecCache {
    table: Table,
    store: Arc<RwLock<CacheStore>>,
}

impl SpecCache {
    pub fn new(table: Table, max_entries: usize, ttl: Duration) -> Self {
        Self {
            table,
            store: Arc::new(RwLock::new(CacheStore::new(max_entries, ttl))),
        }
    }

    /// The wrapped table, for fields that bypass the cache.
    pub fn table(&self) -> &Table {
        &self.table
    }

    // == Read ==
    /// Cached spec of `key`, or the table's current spec on a miss.
    pub async fn read(&self, key: &EntryKey) -> Result<SpecValue> {
        let observed = {
            let mut store = self.store.write().await;
            if let Some(spec) = store.get(key) {
                return Ok(spec);
            }
            store.generation()
        };

        let spec = SpecValue::new(self.table.read_field(key, Field::Spec).await?);

        let cached = self
            .store
            .write()
            .await
            .fill(key.clone(), spec.clone(), observed);
        if !cached {
            debug!(table = self.table.name(), %key, "spec fill raced with invalidation");
        }
        Ok(spec)
    }

    // == Write ==
    /// Writes `spec` to the table, then invalidates the cached value.
    ///
    /// The entry is invalidated even when the write fails, since a timed out
    /// write may still have landed.
    pub async fn write(&self, key: &EntryKey, spec: &SpecValue) -> Result<()> {
        let result = self
            .table
            .write_field(key, Field::Spec, spec.as_text())
            .await;
        self.invalidate(key).await;
        if let Err(err) = &result {
            warn!(table = self.table.name(), %key, error = %err, "spec write failed");
        }
        result
    }

    // == Invalidate ==
    pub async fn invalidate(&self, key: &EntryKey) {
        self.store.write().await.invalidate(key);
    }

    /// Purges expired entries, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}
