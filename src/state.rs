use crate::services::resource_service::ResourceService;
use axum::http::{HeaderMap, header};
use std::sync::Arc;

/// Shared handler state. Cloned per request; everything inside is Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub service: ResourceService,

    /// Externally visible base URL used for `Location` headers. When unset
    /// it is derived from the request's `Host`.
    pub public_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(service: ResourceService, public_url: Option<String>) -> Self {
        Self {
            service,
            public_url: public_url.map(|url| Arc::from(url.trim_end_matches('/'))),
        }
    }

    /// `scheme://host` for links in responses, or an empty string when the
    /// request carries no `Host` and no public URL is configured.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.public_url {
            return url.to_string();
        }

        let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) else {
            return String::new();
        };
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        format!("{}://{}", scheme, host)
    }
}
