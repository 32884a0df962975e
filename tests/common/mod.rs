#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use booklist_api::routes;
use booklist_api::services::resource_service::ResourceService;
use booklist_api::state::AppState;
use booklist_api::store::SqliteStore;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const HOST: &str = "books.test";

/// Build the full application router over a fresh in-memory store, with the
/// schema and indexes applied the same way `main.rs` does.
pub async fn build_test_app() -> Router {
    build_test_app_with_store().await.0
}

/// Like [`build_test_app`], also handing back the store so a test can act on
/// the pool behind the router.
pub async fn build_test_app_with_store() -> (Router, SqliteStore) {
    let store = SqliteStore::in_memory().await.expect("open in-memory store");
    store.migrate().await.expect("apply schema");

    let service = ResourceService::new(Arc::new(store.clone()));
    service.ensure_indexes().await.expect("declare indexes");

    (routes::app(AppState::new(service, None)), store)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> Response<Body> {
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    send_body(app, method, uri, body).await
}

pub async fn send_body(app: &Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST)
        .body(body)
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(&body.to_string())).await
}

pub async fn patch_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(&body.to_string())).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response body is JSON")
}

pub fn content_type(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Create a record and return its id, asserting the 201.
pub async fn create(app: &Router, collection: &str, body: Value) -> String {
    let response = post_json(app, &format!("/api/v1/{}", collection), body).await;
    assert_eq!(response.status(), 201, "create {} should succeed", collection);
    let json = body_json(response).await;
    json["id"].as_str().expect("id is a string").to_string()
}
