//! Error types for the registry
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::table::{BackendError, TableOp};

// == Registry Error Enum ==
/// Unified error type for registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The backing table failed while serving `op` for `target`.
    ///
    /// Never retried inside the registry; the caller owns retry policy.
    #[error("Storage failure during {op} on {target}: {source}")]
    Storage {
        target: String,
        op: TableOp,
        #[source]
        source: BackendError,
    },

    /// Rejected before any I/O took place
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entry does not exist (raised by the HTTP surface only; registry
    /// read paths substitute defaults for absence)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RegistryError {
    pub fn storage(target: impl ToString, op: TableOp, source: BackendError) -> Self {
        Self::Storage {
            target: target.to_string(),
            op,
            source,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegistryError::Storage { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RegistryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Notification Error Enum ==
/// Failure to hand a change event to the notification channel.
///
/// Always caught at the publish boundary and logged, never propagated.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to encode change event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Notification queue did not accept the event within {0:?}")]
    Timeout(Duration),

    #[error("Notification queue is closed")]
    Closed,
}

// == Result Type Alias ==
/// Convenience Result type for the registry.
pub type Result<T> = std::result::Result<T, RegistryError>;
