use crate::{
    models::{FilterError, Resource},
    serializer,
    services::resource_service::ResourceError,
};
use axum::{
    Json,
    extract::rejection::{BytesRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::fmt;

/// HTTP-facing error: a status, a message, and optionally a prepared JSON
/// body that replaces the default `{"message", "status"}` envelope.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub body: Option<Value>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            body: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// The request body could not be used as a JSON object.
    pub fn invalid_json() -> Self {
        Self::bad_request("Invalid JSON")
    }

    /// 422 carrying a serialized record with its `errors`.
    pub fn unprocessable(body: Value) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation Failed".into(),
            body: Some(body),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "{}", self.message);
        }

        let body = self.body.unwrap_or_else(|| {
            json!({
                "message": self.message,
                "status": self.status.as_u16()
            })
        });

        (self.status, Json(body)).into_response()
    }
}

impl<R: Resource> From<ResourceError<R>> for AppError {
    fn from(err: ResourceError<R>) -> Self {
        match err {
            ResourceError::NotFound(name) => AppError::not_found(format!("{} Not Found", name)),
            ResourceError::Invalid(record) => match serializer::serialize(&*record) {
                Ok(body) => AppError::unprocessable(body),
                Err(err) => AppError::internal(err.to_string()),
            },
            ResourceError::Malformed(detail) => {
                tracing::debug!("rejected payload: {}", detail);
                AppError::invalid_json()
            }
            ResourceError::Store(err) => AppError::internal(err.to_string()),
        }
    }
}

// Extractor rejections keep axum's status (e.g. 413 for an oversized body)
// but are rendered through the JSON envelope.
impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::new(rejection.status(), rejection.body_text())
    }
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(err.to_string())
    }
}
