//! API Handlers
//!
//! HTTP request handlers for each registry endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use futures::TryStreamExt;

use crate::error::{RegistryError, Result};
use crate::models::{
    EntryResponse, HealthResponse, NamesResponse, RuleResponse, StatsResponse, UnitResponse,
    ValueRequest,
};
use crate::notify::Notifier;
use crate::registry::{Registry, RegistryConfig};
use crate::spec::SpecValue;
use crate::table::Backend;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    /// Name of the storage backend, reported by /health
    pub backend_name: &'static str,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        config: &RegistryConfig,
    ) -> Self {
        let backend_name = backend.backend_name();
        Self {
            registry: Registry::new(backend, notifier, config),
            backend_name,
        }
    }
}

// == Rules ==

/// Handler for GET /owners/:owner/rules
pub async fn list_rules_handler(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<NamesResponse>> {
    let names: Vec<String> = state.registry.rules(&owner)?.list().try_collect().await?;
    Ok(Json(NamesResponse { owner, names }))
}

/// Handler for PUT /owners/:owner/rules/:name
pub async fn create_rule_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<EntryResponse>> {
    state.registry.rules(&owner)?.create(&name).await?;
    Ok(Json(EntryResponse::new("created", owner, name)))
}

/// Handler for DELETE /owners/:owner/rules/:name
pub async fn remove_rule_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<EntryResponse>> {
    state.registry.rules(&owner)?.remove(&name).await?;
    Ok(Json(EntryResponse::new("removed", owner, name)))
}

/// Handler for GET /owners/:owner/rules/:name
///
/// Checks existence first so a read never materializes a row.
pub async fn get_rule_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<RuleResponse>> {
    let rules = state.registry.rules(&owner)?;
    if !rules.contains(&name).await? {
        return Err(RegistryError::NotFound(format!("rule {}/{}", owner, name)));
    }
    let rule = rules.get(&name)?;
    Ok(Json(RuleResponse {
        identity: rule.identity(),
        spec: rule.spec().await?.into_text(),
        drain: rule.drain().await?.into_text(),
        failure: rule.failure().await?,
        acl: rule.acl().await?.into_text(),
        owner,
        name,
    }))
}

/// Handler for PUT /owners/:owner/rules/:name/spec
pub async fn update_rule_spec_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Json(req): Json<ValueRequest>,
) -> Result<Json<EntryResponse>> {
    let rule = state.registry.rules(&owner)?.get(&name)?;
    rule.update(&SpecValue::new(req.value)).await?;
    Ok(Json(EntryResponse::new("updated", owner, name)))
}

/// Handler for PUT /owners/:owner/rules/:name/drain
pub async fn update_rule_drain_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Json(req): Json<ValueRequest>,
) -> Result<Json<EntryResponse>> {
    let rule = state.registry.rules(&owner)?.get(&name)?;
    rule.update_drain(&SpecValue::new(req.value)).await?;
    Ok(Json(EntryResponse::new("updated", owner, name)))
}

/// Handler for PUT /owners/:owner/rules/:name/failure
pub async fn update_rule_failure_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Json(req): Json<ValueRequest>,
) -> Result<Json<EntryResponse>> {
    let rule = state.registry.rules(&owner)?.get(&name)?;
    rule.update_failure(&req.value).await?;
    Ok(Json(EntryResponse::new("updated", owner, name)))
}

/// Handler for PUT /owners/:owner/rules/:name/acl
pub async fn update_rule_acl_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Json(req): Json<ValueRequest>,
) -> Result<Json<EntryResponse>> {
    let rule = state.registry.rules(&owner)?.get(&name)?;
    rule.update_acl(&SpecValue::new(req.value)).await?;
    Ok(Json(EntryResponse::new("updated", owner, name)))
}

// == Units ==

/// Handler for GET /owners/:owner/units
pub async fn list_units_handler(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<NamesResponse>> {
    let names: Vec<String> = state.registry.units(&owner)?.list().try_collect().await?;
    Ok(Json(NamesResponse { owner, names }))
}

/// Handler for PUT /owners/:owner/units/:name
pub async fn create_unit_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<EntryResponse>> {
    state.registry.units(&owner)?.create(&name).await?;
    Ok(Json(EntryResponse::new("created", owner, name)))
}

/// Handler for DELETE /owners/:owner/units/:name
pub async fn remove_unit_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<EntryResponse>> {
    state.registry.units(&owner)?.remove(&name).await?;
    Ok(Json(EntryResponse::new("removed", owner, name)))
}

/// Handler for GET /owners/:owner/units/:name/spec
pub async fn get_unit_spec_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<UnitResponse>> {
    let units = state.registry.units(&owner)?;
    if !units.contains(&name).await? {
        return Err(RegistryError::NotFound(format!("unit {}/{}", owner, name)));
    }
    let unit = units.get(&name)?;
    Ok(Json(UnitResponse {
        identity: unit.identity(),
        spec: unit.spec().await?.into_text(),
        acl: unit.acl().await?.into_text(),
        owner,
        name,
    }))
}

/// Handler for PUT /owners/:owner/units/:name/spec
pub async fn update_unit_spec_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Json(req): Json<ValueRequest>,
) -> Result<Json<EntryResponse>> {
    let unit = state.registry.units(&owner)?.get(&name)?;
    unit.update(&SpecValue::new(req.value)).await?;
    Ok(Json(EntryResponse::new("updated", owner, name)))
}

/// Handler for PUT /owners/:owner/units/:name/acl
pub async fn update_unit_acl_handler(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    Json(req): Json<ValueRequest>,
) -> Result<Json<EntryResponse>> {
    let unit = state.registry.units(&owner)?.get(&name)?;
    unit.update_acl(&SpecValue::new(req.value)).await?;
    Ok(Json(EntryResponse::new("updated", owner, name)))
}

// == Service ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        units: state.registry.unit_specs().stats().await.into(),
        rules: state.registry.rule_specs().stats().await.into(),
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.backend_name))
}
