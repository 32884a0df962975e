//! HTTP handlers for the resource collections under `/api/v1`.
//!
//! Every handler is generic over [`Resource`], so books, movies and shows
//! share one pipeline: parse the request, call `ResourceService`, render
//! through the serializer. Bodies are taken as raw bytes and parsed here so
//! that malformed JSON is always a 400 and a missing record on `PATCH` is
//! reported before the body is looked at. Extractor rejections are taken
//! as values and turned into [`AppError`]s so they render as JSON too.

use crate::{
    errors::AppError,
    models::{Resource, parse_filters},
    serializer,
    state::AppState,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// `GET /{resource}` — list records, filtered by allow-listed query params.
pub async fn list_resources<R: Resource>(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<Value>>, AppError> {
    let Query(params) = query?;
    let filter = parse_filters::<R>(&params)?;
    let records = state.service.list::<R>(&filter).await?;
    Ok(Json(serializer::serialize_all(&records)?))
}

/// `GET /{resource}/{id}`
pub async fn get_resource<R: Resource>(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = path?;
    let record = state.service.get::<R>(&id).await?;
    Ok(Json(serializer::serialize(&record)?))
}

/// `POST /{resource}` — 201 with `Location` pointing at the new record.
pub async fn create_resource<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = json_params(&body?)?;
    let record = state.service.create::<R>(payload).await?;

    let location = format!(
        "{}/api/v1/{}/{}",
        state.base_url(&headers),
        R::COLLECTION,
        record.id
    );
    let location = HeaderValue::from_str(&location)
        .map_err(|err| AppError::internal(format!("invalid Location header: {}", err)))?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(serializer::serialize(&record)?),
    ))
}

/// `PATCH /{resource}/{id}` — partial update.
pub async fn update_resource<R: Resource>(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = path?;
    let existing = state.service.get::<R>(&id).await?;
    let patch = json_params(&body?)?;
    let record = state.service.update(existing, patch).await?;
    Ok(Json(serializer::serialize(&record)?))
}

/// `DELETE /{resource}/{id}` — always 204, whether or not the id existed.
pub async fn delete_resource<R: Resource>(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    state.service.delete::<R>(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for unmatched paths inside the API namespace.
pub async fn api_not_found() -> AppError {
    AppError::not_found("Not Found")
}

/// Known path, unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Parse a request body as a JSON object.
fn json_params(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            tracing::debug!("rejected non-object JSON body: {}", other);
            Err(AppError::invalid_json())
        }
        Err(err) => {
            tracing::debug!("rejected JSON body: {}", err);
            Err(AppError::invalid_json())
        }
    }
}
