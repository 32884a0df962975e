//! Integration tests for the root, health and readiness endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, build_test_app, get};

#[tokio::test]
async fn root_returns_welcome_text() {
    let app = build_test_app().await;
    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Welcome to Booklist!".to_vec());
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = build_test_app().await;
    let response = get(&app, "/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn readyz_checks_the_store() {
    let app = build_test_app().await;
    let response = get(&app, "/readyz").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["store"]["ok"], true);
}

#[tokio::test]
async fn unknown_root_path_is_404() {
    let app = build_test_app().await;
    let response = get(&app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
