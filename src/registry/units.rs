//! Units
//!
//! A unit is a named spec owned by one owner, plus the access-control spec
//! remote mirrors consult before exposing it.

use futures::Stream;

use super::Scope;
use crate::cache::SpecCache;
use crate::error::Result;
use crate::key::EntryKey;
use crate::spec::SpecValue;
use crate::table::Field;

/// Units of one owner.
#[derive(Debug, Clone)]
pub struct Units {
    scope: Scope,
}

impl Units {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn owner(&self) -> &str {
        self.scope.owner()
    }

    /// Registers `name` with an empty spec. A no-op if it already exists.
    pub async fn create(&self, name: &str) -> Result<()> {
        self.scope.create(name).await?;
        Ok(())
    }

    /// Deletes `name`. Removing an unknown name is not an error.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.scope.remove(name).await
    }

    pub async fn contains(&self, name: &str) -> Result<bool> {
        self.scope.contains(name).await
    }

    /// Streams every unit name of this owner; each call re-queries.
    pub fn list(&self) -> impl Stream<Item = Result<String>> + Send + 'static {
        self.scope.list()
    }

    /// Handle on unit `name`. Performs no I/O.
    pub fn get(&self, name: &str) -> Result<Unit> {
        Ok(Unit {
            key: self.scope.key(name)?,
            specs: self.scope.specs().clone(),
        })
    }
}

/// Handle on one unit.
#[derive(Debug, Clone)]
pub struct Unit {
    key: EntryKey,
    specs: SpecCache,
}

impl Unit {
    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn owner(&self) -> &str {
        self.key.owner()
    }

    /// Stable `owner/name` identity used to address this unit remotely.
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

    /// Access-control spec, prohibitive until set. Not cached.
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::TryStreamExt;

    use crate::error::RegistryError;
    use crate::notify::NullNotifier;
    use crate::registry::{Registry, RegistryConfig};
    use crate::spec::SpecValue;
    use crate::table::MemoryBackend;

    fn registry() -> Registry {
        Registry::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(NullNotifier),
            &RegistryConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_unit_lifecycle() {
        let units = registry().units("urn:test:3").unwrap();

        assert!(!units.contains("front").await.unwrap());
        units.create("front").await.unwrap();
        assert!(units.contains("front").await.unwrap());

        let unit = units.get("front").unwrap();
        assert_eq!(unit.spec().await.unwrap(), SpecValue::empty());
        unit.update(&SpecValue::new("java.lang.Double(1.0)")).await.unwrap();
        assert_eq!(
            unit.spec().await.unwrap(),
            SpecValue::new("java.lang.Double(1.0)")
        );

        let names: Vec<String> = units.list().try_collect().await.unwrap();
        assert_eq!(names, vec!["front".to_string()]);

        units.remove("front").await.unwrap();
        assert!(!units.contains("front").await.unwrap());
    }

    #[tokio::test]
    async fn test_unit_acl_defaults_then_updates() {
        let units = registry().units("urn:test:3").unwrap();
        units.create("guarded").await.unwrap();

        let unit = units.get("guarded").unwrap();
        assert_eq!(unit.acl().await.unwrap(), SpecValue::prohibited());

        unit.update_acl(&SpecValue::new("com.rultor.acl.OpenView()"))
            .await
            .unwrap();
        assert_eq!(
            unit.acl().await.unwrap(),
            SpecValue::new("com.rultor.acl.OpenView()")
        );
        assert_eq!(unit.spec().await.unwrap(), SpecValue::empty());
    }

    #[tokio::test]
    async fn test_get_performs_no_io() {
        let units = registry().units("urn:test:3").unwrap();
        let unit = units.get("lazy").unwrap();

        assert_eq!(unit.identity(), "urn:test:3/lazy");
        assert!(!units.contains("lazy").await.unwrap());

        // Reading the spec does not materialize either
        unit.spec().await.unwrap();
        assert!(!units.contains("lazy").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_materializes_row() {
        let units = registry().units("urn:test:3").unwrap();
        units
            .get("implicit")
            .unwrap()
            .update(&SpecValue::new("x()"))
            .await
            .unwrap();
        assert!(units.contains("implicit").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let registry = registry();
        assert!(matches!(
            registry.units(""),
            Err(RegistryError::InvalidArgument(_))
        ));

        let units = registry.units("urn:test:3").unwrap();
        assert!(matches!(units.get(""), Err(RegistryError::InvalidArgument(_))));

        let unit = units.get("u").unwrap();
        assert!(matches!(
            unit.update(&SpecValue::empty()).await,
            Err(RegistryError::InvalidArgument(_))
        ));
        assert!(!units.contains("u").await.unwrap());
    }
}
