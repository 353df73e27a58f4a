//! Response DTOs for the registry API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for create/update/remove operations
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// Success message
    pub message: String,
    pub owner: String,
    pub name: String,
}

impl EntryResponse {
    pub fn new(action: &str, owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        Self {
            message: format!("'{}' of '{}' {} successfully", name, owner, action),
            owner,
            name,
        }
    }
}

/// Response body for listings (GET /owners/:owner/rules, .../units)
#[derive(Debug, Clone, Serialize)]
pub struct NamesResponse {
    pub owner: String,
    pub names: Vec<String>,
}

/// Response body for GET /owners/:owner/rules/:name
#[derive(Debug, Clone, Serialize)]
pub struct RuleResponse {
    /// Stable `owner/name` identity
    pub identity: String,
    pub owner: String,
    pub name: String,
    pub spec: String,
    pub drain: String,
    pub failure: String,
    pub acl: String,
}

/// Response body for GET /owners/:owner/units/:name/spec
#[derive(Debug, Clone, Serialize)]
pub struct UnitResponse {
    /// Stable `owner/name` identity
    pub identity: String,
    pub owner: String,
    pub name: String,
    pub spec: String,
    pub acl: String,
}

/// Spec cache figures of one table
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsBody {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsBody {
    fn from(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            invalidations: stats.invalidations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub units: CacheStatsBody,
    pub rules: CacheStatsBody,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Storage backend in use
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(backend: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            backend: backend.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
