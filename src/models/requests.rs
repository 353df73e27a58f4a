//! Request DTOs for the registry API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for field updates (PUT .../spec, .../drain, .../failure, .../acl)
///
/// Value checks (empty specs, sizes) are left to the registry so the HTTP
/// surface and library callers get identical errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueRequest {
    /// New field value
    pub value: String,
}
