//! Spec values
//!
//! A spec is an opaque piece of text describing automated behavior. The
//! registry stores and compares specs, it never interprets them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Drain assigned to every rule when its row is first materialized.
pub const DISCARD_DRAIN: &str = "com.rultor.drain.Trash()";

/// Access-control spec of an entry nobody has granted access to yet.
pub const DEFAULT_ACL: &str = "com.rultor.acl.Prohibited()";

/// Maximum accepted spec size in bytes
pub const MAX_SPEC_SIZE: usize = 1024 * 1024; // 1 MB

// == Spec Value ==
/// Immutable spec text. Two values are equal iff their text is equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecValue(String);

impl SpecValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The canonical empty spec.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The default drain of a freshly created rule.
    pub fn discard() -> Self {
        Self::new(DISCARD_DRAIN)
    }

    /// The default access-control spec of a fresh entry.
    pub fn prohibited() -> Self {
        Self::new(DEFAULT_ACL)
    }

    pub fn as_text(&self) -> &str {
        &self.0
    }

    pub fn into_text(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that this spec may be written through `update`.
    pub fn validate_for_update(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(RegistryError::invalid("spec is mandatory and can't be empty"));
        }
        if self.0.len() > MAX_SPEC_SIZE {
            return Err(RegistryError::invalid(format!(
                "spec exceeds maximum size of {} bytes",
                MAX_SPEC_SIZE
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpecValue {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SpecValue {
    fn from(text: String) -> Self {
        Self(text)
    }
}
