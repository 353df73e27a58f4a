//! Table Module
//!
//! The [`Table`] accessor is the only component that talks to persistent
//! storage. It layers row-or-create, default substitution and deadlines on
//! top of a minimal [`Backend`] that stores rows keyed by `(owner, name)`.
//!
//! # Backends
//! - [`MemoryBackend`]: process-local maps, for tests and development
//! - [`SqliteBackend`]: durable SQLite database

mod memory;
mod sqlite;

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use thiserror::Error;
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::key::EntryKey;
use crate::spec::{DEFAULT_ACL, DISCARD_DRAIN};

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

// == Public Constants ==
/// Fields carried by the units table
pub const UNIT_FIELDS: &[Field] = &[Field::Spec, Field::Acl];

/// Fields carried by the rules table
pub const RULE_FIELDS: &[Field] = &[Field::Spec, Field::Drain, Field::Failure, Field::Acl];

/// Default number of names fetched per listing page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Update/insert rounds a field write makes before giving up
const WRITE_ATTEMPTS: usize = 3;

// == Field ==
/// Mutable attribute of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Spec,
    Drain,
    Failure,
    /// Access-control spec consulted by remote mirrors
    Acl,
}

impl Field {
    /// Column name in the backing table.
    pub fn column(self) -> &'static str {
        match self {
            Field::Spec => "spec",
            Field::Drain => "drain",
            Field::Failure => "failure",
            Field::Acl => "acl",
        }
    }

    /// Value reported when the row or the attribute is absent.
    pub fn default_value(self) -> &'static str {
        match self {
            Field::Spec => "",
            Field::Drain => DISCARD_DRAIN,
            Field::Failure => "",
            Field::Acl => DEFAULT_ACL,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// == Row ==
/// One registry row. Missing attributes read as their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: EntryKey,
    pub spec: Option<String>,
    pub drain: Option<String>,
    pub failure: Option<String>,
    pub acl: Option<String>,
}

impl Row {
    /// Row with identity only.
    pub fn identity(key: EntryKey) -> Self {
        Self {
            key,
            spec: None,
            drain: None,
            failure: None,
            acl: None,
        }
    }

    /// Row with identity and every listed field at its default.
    pub fn with_defaults(key: EntryKey, fields: &[Field]) -> Self {
        let mut row = Self::identity(key);
        for field in fields {
            row.set(*field, field.default_value());
        }
        row
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Spec => self.spec.as_deref(),
            Field::Drain => self.drain.as_deref(),
            Field::Failure => self.failure.as_deref(),
            Field::Acl => self.acl.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            Field::Spec => self.spec = value,
            Field::Drain => self.drain = value,
            Field::Failure => self.failure = value,
            Field::Acl => self.acl = value,
        }
    }

    pub fn value_or_default(&self, field: Field) -> String {
        self.get(field).unwrap_or(field.default_value()).to_string()
    }
}

// == Materialized ==
/// Outcome of [`Table::row_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// The row already existed (or another caller won the insert race)
    Found(Row),
    /// This call inserted the row
    Created(Row),
}

impl Materialized {
    pub fn is_created(&self) -> bool {
        matches!(self, Materialized::Created(_))
    }

    pub fn row(&self) -> &Row {
        match self {
            Materialized::Found(row) | Materialized::Created(row) => row,
        }
    }
}

// == Table Operation ==
/// Operation reported in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOp {
    RowOrCreate,
    ReadField,
    WriteField,
    Exists,
    Delete,
    ListNames,
}

impl fmt::Display for TableOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableOp::RowOrCreate => "row_or_create",
            TableOp::ReadField => "read_field",
            TableOp::WriteField => "write_field",
            TableOp::Exists => "exists",
            TableOp::Delete => "delete",
            TableOp::ListNames => "list_names",
        };
        f.write_str(name)
    }
}

// == Backend ==
/// Failure raised by a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("blocking storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("connection lock poisoned")]
    Poisoned,

    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("row kept changing across {0} write attempts")]
    Contended(usize),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Row storage keyed by `(owner, name)` within named tables.
///
/// Every method is a single atomic step on the store; composition into
/// row-or-create and friends happens in [`Table`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Reads one row.
    async fn fetch(&self, table: &str, key: &EntryKey) -> BackendResult<Option<Row>>;

    /// Inserts `row` unless a row with the same key exists.
    ///
    /// Returns `true` if this call inserted it.
    async fn insert_if_absent(&self, table: &str, row: &Row) -> BackendResult<bool>;

    /// Overwrites one field of an existing row.
    ///
    /// Returns `false` if no row exists for `key`.
    async fn update_field(
        &self,
        table: &str,
        key: &EntryKey,
        field: Field,
        value: &str,
    ) -> BackendResult<bool>;

    /// Deletes one row. Deleting a missing row is not an error.
    async fn remove(&self, table: &str, key: &EntryKey) -> BackendResult<()>;

    /// Up to `limit` names of `owner`, ascending, strictly after `after`.
    async fn names(
        &self,
        table: &str,
        owner: &str,
        after: Option<&str>,
        limit: usize,
    ) -> BackendResult<Vec<String>>;

    fn backend_name(&self) -> &'static str;
}

// == Table ==
/// Accessor bound to one table of a backend.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Table {
    backend: Arc<dyn Backend>,
    name: Arc<str>,
    fields: &'static [Field],
    timeout: Duration,
    page_size: usize,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("backend", &self.backend.backend_name())
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Table {
    // == Constructor ==
    /// Binds `backend`'s table `name`, which carries `fields`.
    ///
    /// Every backend call is bounded by `timeout`.
    pub fn new(
        backend: Arc<dyn Backend>,
        name: impl Into<Arc<str>>,
        fields: &'static [Field],
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            name: name.into(),
            fields,
            timeout,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    // == Row Or Create ==
    /// Returns the row for `key`, inserting it with defaults if absent.
    ///
    /// Racing creators converge on one row: whoever loses the conditional
    /// insert re-reads and reports `Found`.
    pub async fn row_or_create(&self, key: &EntryKey) -> Result<Materialized> {
        let op = TableOp::RowOrCreate;
        if let Some(row) = self.call(op, key, self.backend.fetch(&self.name, key)).await? {
            return Ok(Materialized::Found(row));
        }

        let fresh = Row::with_defaults(key.clone(), self.fields);
        let inserted = self
            .call(op, key, self.backend.insert_if_absent(&self.name, &fresh))
            .await?;
        if inserted {
            debug!(table = %self.name, %key, "row created");
            return Ok(Materialized::Created(fresh));
        }

        let existing = self.call(op, key, self.backend.fetch(&self.name, key)).await?;
        match existing {
            Some(row) => Ok(Materialized::Found(row)),
            None => {
                // Lost the insert race and the winner's row was already
                // deleted again; report what the winner wrote.
                debug!(table = %self.name, %key, "row vanished after lost insert race");
                Ok(Materialized::Found(fresh))
            }
        }
    }

    // == Write Field ==
    /// Overwrites `field` of `key`, materializing the row first.
    ///
    /// A row deleted concurrently is re-created with defaults plus the
    /// written field, so a successful return always leaves the value stored.
    pub async fn write_field(&self, key: &EntryKey, field: Field, value: &str) -> Result<()> {
        self.check_field(field)?;
        let op = TableOp::WriteField;
        for attempt in 1..=WRITE_ATTEMPTS {
            let updated = self
                .call(op, key, self.backend.update_field(&self.name, key, field, value))
                .await?;
            if updated {
                return Ok(());
            }

            let mut fresh = Row::with_defaults(key.clone(), self.fields);
            fresh.set(field, value);
            let inserted = self
                .call(op, key, self.backend.insert_if_absent(&self.name, &fresh))
                .await?;
            if inserted {
                debug!(table = %self.name, %key, %field, "row created by field write");
                return Ok(());
            }
            debug!(table = %self.name, %key, %field, attempt, "row changed under field write");
        }
        Err(RegistryError::storage(
            key,
            op,
            BackendError::Contended(WRITE_ATTEMPTS),
        ))
    }

    // == Read Field ==
    /// Current value of `field`, or its default. Never creates the row.
    pub async fn read_field(&self, key: &EntryKey, field: Field) -> Result<String> {
        self.check_field(field)?;
        let row = self
            .call(TableOp::ReadField, key, self.backend.fetch(&self.name, key))
            .await?;
        Ok(match row {
            Some(row) => row.value_or_default(field),
            None => field.default_value().to_string(),
        })
    }

    // == Exists ==
    pub async fn exists(&self, key: &EntryKey) -> Result<bool> {
        let row = self
            .call(TableOp::Exists, key, self.backend.fetch(&self.name, key))
            .await?;
        Ok(row.is_some())
    }

    // == Delete ==
    /// Removes the row for `key`. Idempotent.
    pub async fn delete(&self, key: &EntryKey) -> Result<()> {
        self.call(TableOp::Delete, key, self.backend.remove(&self.name, key))
            .await
    }

    // == List Names ==
    /// Lazily streams every name registered under `owner`, page by page.
    ///
    /// Each call starts a fresh listing. The stream ends after the first
    /// page shorter than the page size, or at the first error.
    pub fn list_names(&self, owner: &str) -> impl Stream<Item = Result<String>> + Send + 'static {
        let cursor = Cursor {
            table: self.clone(),
            owner: owner.to_string(),
            buffer: VecDeque::new(),
            after: None,
            exhausted: false,
        };
        stream::try_unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(name) = cursor.buffer.pop_front() {
                    return Ok(Some((name, cursor)));
                }
                if cursor.exhausted {
                    return Ok(None);
                }
                let page = cursor.table.page(&cursor.owner, cursor.after.as_deref()).await?;
                cursor.exhausted = page.len() < cursor.table.page_size;
                cursor.after = page.last().cloned();
                cursor.buffer.extend(page);
            }
        })
    }

    async fn page(&self, owner: &str, after: Option<&str>) -> Result<Vec<String>> {
        self.call(
            TableOp::ListNames,
            owner,
            self.backend.names(&self.name, owner, after, self.page_size),
        )
        .await
    }

    fn check_field(&self, field: Field) -> Result<()> {
        if self.fields.contains(&field) {
            Ok(())
        } else {
            Err(RegistryError::invalid(format!(
                "table {} has no field {}",
                self.name, field
            )))
        }
    }

    /// Runs one backend call under the deadline, tagging failures.
    async fn call<T, F>(&self, op: TableOp, target: impl fmt::Display, call: F) -> Result<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(RegistryError::storage(target, op, source)),
            Err(_) => Err(RegistryError::storage(
                target,
                op,
                BackendError::Timeout(self.timeout),
            )),
        }
    }
}

/// Listing state carried between pages.
struct Cursor {
    table: Table,
    owner: String,
    buffer: VecDeque<String>,
    after: Option<String>,
    exhausted: bool,
}
