//! Registry Module
//!
//! Owner-scoped registries of units and rules.
//!
//! A [`Registry`] binds one storage backend, the units and rules tables with
//! their spec caches, and a change notifier. It hands out [`Units`] and
//! [`Rules`] scoped to a single owner; those hand out lightweight [`Unit`]
//! and [`Rule`] handles.

mod rules;
mod units;


use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tracing::{debug, info};

use crate::cache::{SpecCache, DEFAULT_MAX_ENTRIES, DEFAULT_SPEC_TTL};
use crate::error::Result;
use crate::key::{validate_name, validate_owner, EntryKey};
use crate::notify::Notifier;
use crate::table::{
    Backend, Field, Materialized, Table, DEFAULT_PAGE_SIZE, RULE_FIELDS, UNIT_FIELDS,
};

pub use rules::{Rule, Rules};
pub use units::{Unit, Units};

// == Registry Config ==
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Name of the units table
    pub units_table: String,
    /// Name of the rules table
    pub rules_table: String,
    /// Lifetime of a cached spec
    pub cache_ttl: Duration,
    /// Maximum cached specs per table
    pub cache_max_entries: usize,
    /// Deadline for every storage call
    pub store_timeout: Duration,
    /// Names fetched per listing page
    pub page_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            units_table: "units".to_string(),
            rules_table: "rules".to_string(),
            cache_ttl: DEFAULT_SPEC_TTL,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            store_timeout: Duration::from_secs(5),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

// == Registry ==
#[derive(Clone)]
pub struct Registry {
    units: SpecCache,
    rules: SpecCache,
    notifier: Arc<dyn Notifier>,
}

impl Registry {
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        config: &RegistryConfig,
    ) -> Self {
        let cache = |name: &str, fields: &'static [Field]| {
            let table = Table::new(
                Arc::clone(&backend),
                name,
                fields,
                config.store_timeout,
            )
            .with_page_size(config.page_size);
            SpecCache::new(table, config.cache_max_entries, config.cache_ttl)
        };
        Self {
            units: cache(&config.units_table, UNIT_FIELDS),
            rules: cache(&config.rules_table, RULE_FIELDS),
            notifier,
        }
    }

    /// Units owned by `owner`.
    pub fn units(&self, owner: &str) -> Result<Units> {
        Ok(Units::new(Scope::new(owner, self.units.clone())?))
    }

    /// Rules owned by `owner`.
    pub fn rules(&self, owner: &str) -> Result<Rules> {
        Ok(Rules::new(
            Scope::new(owner, self.rules.clone())?,
            Arc::clone(&self.notifier),
        ))
    }

    pub fn unit_specs(&self) -> &SpecCache {
        &self.units
    }

    pub fn rule_specs(&self) -> &SpecCache {
        &self.rules
    }
}

// == Scope ==
/// Mechanics shared by units and rules: one owner over one cached table.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    owner: Arc<str>,
    specs: SpecCache,
}

impl Scope {
    fn new(owner: &str, specs: SpecCache) -> Result<Self> {
        validate_owner(owner)?;
        Ok(Self {
            owner: owner.into(),
            specs,
        })
    }

    pub(crate) fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn specs(&self) -> &SpecCache {
        &self.specs
    }

    pub(crate) fn key(&self, name: &str) -> Result<EntryKey> {
        validate_name(name)?;
        Ok(EntryKey::new(&*self.owner, name))
    }

    pub(crate) async fn create(&self, name: &str) -> Result<Materialized> {
        let key = self.key(name)?;
        let outcome = self.specs.table().row_or_create(&key).await?;
        if outcome.is_created() {
            info!(table = self.specs.table().name(), %key, "entry created");
        } else {
            debug!(table = self.specs.table().name(), %key, "entry already exists");
        }
        Ok(outcome)
    }

    pub(crate) async fn remove(&self, name: &str) -> Result<()> {
        let key = self.key(name)?;
        self.specs.table().delete(&key).await?;
        self.specs.invalidate(&key).await;
        info!(table = self.specs.table().name(), %key, "entry removed");
        Ok(())
    }

    pub(crate) async fn contains(&self, name: &str) -> Result<bool> {
        let key = self.key(name)?;
        self.specs.table().exists(&key).await
    }

    pub(crate) fn list(&self) -> impl Stream<Item = Result<String>> + Send + 'static {
        self.specs.table().list_names(&self.owner)
    }
}
