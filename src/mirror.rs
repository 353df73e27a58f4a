//! Mirror view
//!
//! What a remote mirror polls from an entry: a stable address, the current
//! spec and the access-control spec guarding it. Units and rules both
//! qualify, so a mirror can push either without knowing which it holds.

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{Rule, Unit};
use crate::spec::SpecValue;

#[async_trait]
pub trait Mirrored: Send + Sync {
    /// `owner/name`, stable for the lifetime of the entry.
    fn identity(&self) -> String;

    async fn current_spec(&self) -> Result<SpecValue>;

    async fn current_acl(&self) -> Result<SpecValue>;
}

#[async_trait]
impl Mirrored for Unit {
    fn identity(&self) -> String {
        Unit::identity(self)
    }

    async fn current_spec(&self) -> Result<SpecValue> {
        self.spec().await
    }

    async fn current_acl(&self) -> Result<SpecValue> {
        self.acl().await
    }
}

#[async_trait]
impl Mirrored for Rule {
    fn identity(&self) -> String {
        Rule::identity(self)
    }

    async fn current_spec(&self) -> Result<SpecValue> {
        self.spec().await
    }

    async fn current_acl(&self) -> Result<SpecValue> {
        self.acl().await
    }
}
