//! Rules
//!
//! A rule is a named spec plus a drain (where its output goes) and the text
//! of its last failure. Creating a rule announces it through the notifier.

use std::sync::Arc;

use futures::Stream;
use tracing::warn;

use super::Scope;
use crate::cache::SpecCache;
use crate::error::Result;
use crate::key::EntryKey;
use crate::notify::{ChangeEvent, Notifier};
use crate::spec::SpecValue;
use crate::table::Field;

/// Rules of one owner.
#[derive(Clone)]
pub struct Rules {
    scope: Scope,
    notifier: Arc<dyn Notifier>,
}

impl Rules {
    pub(crate) fn new(scope: Scope, notifier: Arc<dyn Notifier>) -> Self {
        Self { scope, notifier }
    }

    pub fn owner(&self) -> &str {
        self.scope.owner()
    }

    // == Create ==
    /// Registers `name` with default spec, drain and failure.
    ///
    /// A no-op if the rule exists. Only the call that actually creates the
    /// row publishes a change event; a failed publish is logged and
    /// otherwise ignored.
    pub async fn create(&self, name: &str) -> Result<()> {
        if self.scope.create(name).await?.is_created() {
            let event = ChangeEvent::new(self.owner(), name);
            if let Err(err) = self.notifier.publish(&event).await {
                warn!(owner = %event.owner, name = %event.name, error = %err, "failed to publish rule creation");
            }
        }
        Ok(())
    }

    /// Deletes `name`. Removing an unknown name is not an error.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.scope.remove(name).await
    }

    /// Whether `name` exists. Never creates it.
    pub async fn contains(&self, name: &str) -> Result<bool> {
        self.scope.contains(name).await
    }

    /// Streams every rule name of this owner; each call re-queries.
    pub fn list(&self) -> impl Stream<Item = Result<String>> + Send + 'static {
        self.scope.list()
    }

    /// Handle on rule `name`. Performs no I/O.
    pub fn get(&self, name: &str) -> Result<Rule> {
        Ok(Rule {
            key: self.scope.key(name)?,
            specs: self.scope.specs().clone(),
        })
    }
}

/// Handle on one rule.
#[derive(Debug, Clone)]
pub struct Rule {
    key: EntryKey,
    specs: SpecCache,
}

impl Rule {
    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn owner(&self) -> &str {
        self.key.owner()
    }

    /// Stable `owner/name` identity used to address this rule remotely.
    pub fn identity(&self) -> String {
        self.key.to_string()
    }

    /// Current spec, served from the cache when fresh.
    pub async fn spec(&self) -> Result<SpecValue> {
        self.specs.read(&self.key).await
    }

    /// Replaces the spec; rejects an empty one.
    pub async fn update(&self, spec: &SpecValue) -> Result<()> {
        spec.validate_for_update()?;
        self.specs.write(&self.key, spec).await
    }

    /// Current drain, read straight from the table.
    pub async fn drain(&self) -> Result<SpecValue> {
        let text = self.specs.table().read_field(&self.key, Field::Drain).await?;
        Ok(SpecValue::new(text))
    }

    pub async fn update_drain(&self, drain: &SpecValue) -> Result<()> {
        drain.validate_for_update()?;
        self.specs
            .table()
            .write_field(&self.key, Field::Drain, drain.as_text())
            .await
    }

    /// Text of the last recorded failure, `""` if none.
    pub async fn failure(&self) -> Result<String> {
        self.specs.table().read_field(&self.key, Field::Failure).await
    }

    /// Records `text` as the last failure. Empty text clears it.
    pub async fn update_failure(&self, text: &str) -> Result<()> {
        self.specs
            .table()
            .write_field(&self.key, Field::Failure, text)
            .await
    }

    /// Access-control spec, prohibitive until set.
    pub async fn acl(&self) -> Result<SpecValue> {
        let text = self.specs.table().read_field(&self.key, Field::Acl).await?;
        Ok(SpecValue::new(text))
    }

    pub async fn update_acl(&self, acl: &SpecValue) -> Result<()> {
        acl.validate_for_update()?;
        self.specs
            .table()
            .write_field(&self.key, Field::Acl, acl.as_text())
            .await
    }
}
