//! Request and Response models for the registry API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::ValueRequest;
pub use responses::{
    CacheStatsBody, EntryResponse, ErrorResponse, HealthResponse, NamesResponse, RuleResponse,
    StatsResponse, UnitResponse,
};
