//! Entry keys
//!
//! Every registry row is addressed by the pair of its owner and its name.

use std::fmt;

use serde::Serialize;

use crate::error::{RegistryError, Result};

/// Maximum allowed name length in bytes
pub const MAX_NAME_LENGTH: usize = 256;

// == Entry Key ==
/// Composite `(owner, name)` identity of one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryKey {
    owner: String,
    name: String,
}

impl EntryKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Renders as `owner/name`, the identity string handed to remote mirrors.
impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// == Validation ==
pub fn validate_owner(owner: &str) -> Result<()> {
    if owner.trim().is_empty() {
        return Err(RegistryError::invalid("owner cannot be empty"));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RegistryError::invalid("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(RegistryError::invalid(format!(
            "name exceeds maximum length of {} bytes",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}
