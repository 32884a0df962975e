//! Behaviour when the store behind the router stops answering.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app_with_store, content_type, get, post_json};
use serde_json::json;

#[tokio::test]
async fn closed_pool_turns_reads_and_writes_into_json_500() {
    let (app, store) = build_test_app_with_store().await;
    store.db.close().await;

    let response = get(&app, "/api/v1/books").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&response), Some("application/json"));
    let json = body_json(response).await;
    assert_eq!(json["status"], 500);
    assert!(json["message"].is_string());

    let response = post_json(
        &app,
        "/api/v1/movies",
        json!({ "title": "Alien", "director": "Scott", "image": "a.jpg", "rating": 8 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn readyz_reports_unavailable_store() {
    let (app, store) = build_test_app_with_store().await;
    store.db.close().await;

    let response = get(&app, "/readyz").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["checks"]["store"]["ok"], false);
    assert!(json["checks"]["store"]["error"].is_string());
}
