//! API Routes
//!
//! Configures the Axum router with all registry endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_rule_handler, create_unit_handler, get_rule_handler, get_unit_spec_handler,
    health_handler, list_rules_handler, list_units_handler, remove_rule_handler,
    remove_unit_handler, stats_handler, update_rule_acl_handler, update_rule_drain_handler,
    update_rule_failure_handler, update_rule_spec_handler, update_unit_acl_handler,
    update_unit_spec_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /owners/:owner/rules` - List rule names
/// - `PUT|GET|DELETE /owners/:owner/rules/:name` - Create, read, remove a rule
/// - `PUT /owners/:owner/rules/:name/{spec,drain,failure,acl}` - Update one field
/// - `GET /owners/:owner/units` - List unit names
/// - `PUT|DELETE /owners/:owner/units/:name` - Create, remove a unit
/// - `GET|PUT /owners/:owner/units/:name/spec` - Read, update a unit's spec
/// - `PUT /owners/:owner/units/:name/acl` - Update a unit's access-control spec
/// - `GET /stats` - Spec cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/owners/:owner/rules", get(list_rules_handler))
        .route(
            "/owners/:owner/rules/:name",
            put(create_rule_handler)
                .get(get_rule_handler)
                .delete(remove_rule_handler),
        )
        .route("/owners/:owner/rules/:name/spec", put(update_rule_spec_handler))
        .route("/owners/:owner/rules/:name/drain", put(update_rule_drain_handler))
        .route(
            "/owners/:owner/rules/:name/failure",
            put(update_rule_failure_handler),
        )
        .route("/owners/:owner/rules/:name/acl", put(update_rule_acl_handler))
        .route("/owners/:owner/units", get(list_units_handler))
        .route(
            "/owners/:owner/units/:name",
            put(create_unit_handler).delete(remove_unit_handler),
        )
        .route(
            "/owners/:owner/units/:name/spec",
            get(get_unit_spec_handler).put(update_unit_spec_handler),
        )
        .route("/owners/:owner/units/:name/acl", put(update_unit_acl_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
