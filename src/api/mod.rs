//! API Module
//!
//! HTTP handlers and routing for the registry service.
//!
//! # Endpoints
//! - `/owners/:owner/rules[/:name[/spec|/drain|/failure|/acl]]` - Rules of an owner
//! - `/owners/:owner/units[/:name[/spec|/acl]]` - Units of an owner
//! - `GET /stats` - Spec cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
