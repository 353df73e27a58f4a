//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use spec_registry::{
    api::create_router, AppState, MemoryBackend, NullNotifier, RegistryConfig, DEFAULT_ACL,
    DISCARD_DRAIN,
};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryBackend::new()),
        Arc::new(NullNotifier),
        &RegistryConfig::default(),
    );
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn put_value(uri: &str, value: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "value": value }).to_string()))
        .unwrap()
}

// == Rule Endpoint Tests ==

#[tokio::test]
async fn test_create_rule_success() {
    let app = create_test_app();

    let response = app
        .oneshot(request("PUT", "/owners/urn:test:6/rules/test-rule"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test-rule"));
    assert_eq!(json["owner"], "urn:test:6");
}

#[tokio::test]
async fn test_new_rule_has_defaults() {
    let app = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/owners/urn:test:7/rules/test-rule-new"))
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/owners/urn:test:7/rules/test-rule-new"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["identity"], "urn:test:7/test-rule-new");
    assert_eq!(json["spec"], "");
    assert_eq!(json["drain"], DISCARD_DRAIN);
    assert_eq!(json["failure"], "");
    assert_eq!(json["acl"], DEFAULT_ACL);
}

#[tokio::test]
async fn test_rule_field_updates() {
    let app = create_test_app();
    let base = "/owners/urn:test:1/rules/r";

    for (suffix, value) in [
        ("spec", "s()"),
        ("drain", "d()"),
        ("failure", "boom"),
        ("acl", "a()"),
    ] {
        let response = app
            .clone()
            .oneshot(put_value(&format!("{}/{}", base, suffix), value))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "updating {}", suffix);
    }

    let response = app.oneshot(request("GET", base)).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["spec"], "s()");
    assert_eq!(json["drain"], "d()");
    assert_eq!(json["failure"], "boom");
    assert_eq!(json["acl"], "a()");
}

#[tokio::test]
async fn test_empty_spec_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(put_value("/owners/urn:test:1/rules/r/spec", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_empty_failure_accepted() {
    let app = create_test_app();

    let response = app
        .oneshot(put_value("/owners/urn:test:1/rules/r/failure", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_missing_rule_not_found() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(request("GET", "/owners/urn:test:1/rules/ghost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The miss did not create the rule
    let response = app
        .oneshot(request("GET", "/owners/urn:test:1/rules"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["names"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_and_remove_rules() {
    let app = create_test_app();

    for name in ["b", "a", "c"] {
        app.clone()
            .oneshot(request("PUT", &format!("/owners/urn:test:2/rules/{}", name)))
            .await
            .unwrap();
    }
    // Another owner's rule stays out of the listing
    app.clone()
        .oneshot(request("PUT", "/owners/urn:test:3/rules/z"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/owners/urn:test:2/rules/b"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/owners/urn:test:2/rules"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["names"], serde_json::json!(["a", "c"]));
}

#[tokio::test]
async fn test_remove_unknown_rule_succeeds() {
    let app = create_test_app();

    let response = app
        .oneshot(request("DELETE", "/owners/urn:test:1/rules/never"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// == Unit Endpoint Tests ==

#[tokio::test]
async fn test_unit_lifecycle() {
    let app = create_test_app();
    let base = "/owners/urn:test:4/units/u";

    let response = app.clone().oneshot(request("PUT", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("{}/spec", base)))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["spec"], "");

    app.clone()
        .oneshot(put_value(&format!("{}/spec", base), "unit()"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", &format!("{}/spec", base)))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["spec"], "unit()");
    assert_eq!(json["identity"], "urn:test:4/u");

    app.clone().oneshot(request("DELETE", base)).await.unwrap();

    let response = app
        .oneshot(request("GET", &format!("{}/spec", base)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unit_acl_update() {
    let app = create_test_app();
    let base = "/owners/urn:test:4/units/guarded";

    let response = app
        .clone()
        .oneshot(put_value(&format!("{}/acl", base), "com.rultor.acl.OpenView()"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("{}/spec", base)))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["acl"], "com.rultor.acl.OpenView()");
    assert_eq!(json["spec"], "");

    let response = app
        .oneshot(put_value(&format!("{}/acl", base), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_units_and_rules_are_separate() {
    let app = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/owners/urn:test:5/units/same"))
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/owners/urn:test:5/rules"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["names"], serde_json::json!([]));
}

// == Stats and Health Tests ==

#[tokio::test]
async fn test_stats_reflect_spec_reads() {
    let app = create_test_app();
    let spec = "/owners/urn:test:1/units/u/spec";

    app.clone().oneshot(put_value(spec, "x()")).await.unwrap();
    app.clone().oneshot(request("GET", spec)).await.unwrap();
    app.clone().oneshot(request("GET", spec)).await.unwrap();

    let response = app.oneshot(request("GET", "/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["units"]["misses"], 1);
    assert_eq!(json["units"]["hits"], 1);
    assert_eq!(json["rules"]["hits"], 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["backend"], "memory");
    assert!(json.get("timestamp").is_some());
}
