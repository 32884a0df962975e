//! Defines routes for the Booklist API.
//!
//! ## Structure
//! - **Root endpoints**
//!   - `GET /`        — welcome text
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness
//!
//! - **Resource endpoints** under `/api/v1`, for each of `books`, `movies`, `shows`
//!   - `GET    /{resource}`      — list (query params filter)
//!   - `POST   /{resource}`      — create
//!   - `GET    /{resource}/{id}` — fetch one
//!   - `PATCH  /{resource}/{id}` — partial update
//!   - `DELETE /{resource}/{id}` — delete (idempotent)
//!
//! Every response body under `/api/v1` is JSON, including 404 and 405.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz, welcome},
        resource_handlers::{
            api_not_found, create_resource, delete_resource, get_resource, list_resources,
            method_not_allowed, update_resource,
        },
    },
    models::{Book, Movie, Resource, Show},
    state::AppState,
};
use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Build the router with shared state and request tracing applied.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build and return the router for all routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api_routes())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(resource_routes::<Book>())
        .merge(resource_routes::<Movie>())
        .merge(resource_routes::<Show>())
        .fallback(api_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
}

/// Collection and member routes for one resource type.
fn resource_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/{}", R::COLLECTION);
    let member = format!("/{}/{{id}}", R::COLLECTION);

    Router::new()
        .route(
            &collection,
            get(list_resources::<R>).post(create_resource::<R>),
        )
        .route(
            &member,
            get(get_resource::<R>)
                .patch(update_resource::<R>)
                .delete(delete_resource::<R>),
        )
}
