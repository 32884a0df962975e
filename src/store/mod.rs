//! Persistence boundary for resource documents.
//!
//! Everything above this module talks to a [`DocumentStore`]: a small
//! collection-keyed document API (find / find_one / insert / update_by_id /
//! delete_by_id) plus index declarations. Bodies are plain JSON objects;
//! the store never interprets them beyond the fields named in a [`Filter`]
//! or an [`IndexSpec`].

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

pub use sqlite::SqliteStore;

/// A stored document: identifier, JSON body and bookkeeping timestamps.
///
/// The timestamps are maintained by the store and never rendered to clients;
/// callers only read them for logging.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Map<String, Value>,
    /// Set once on insert.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every `update_by_id`.
    pub updated_at: DateTime<Utc>,
}

/// How a single filter condition compares a document field.
#[derive(Clone, Debug, PartialEq)]
pub enum Match {
    /// Case-sensitive prefix match on a text field.
    Prefix(String),
    /// Exact equality on a text field.
    Text(String),
    /// Exact equality on a numeric field.
    Number(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub matcher: Match,
}

/// AND-combined list of conditions. An empty filter matches every document
/// in the collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, matcher: Match) -> Self {
        self.conditions.push(Condition { field, matcher });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Index declaration on one body field of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: &'static str,
    pub unique: bool,
}

impl IndexSpec {
    pub const fn ascending(field: &'static str) -> Self {
        Self {
            field,
            unique: false,
        }
    }

    pub const fn unique(field: &'static str) -> Self {
        Self {
            field,
            unique: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("`{0}` is not a valid collection or field name")]
    InvalidName(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt document body: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching `filter`, in store order.
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Persist a new document under `id`. Fails with [`StoreError::Conflict`]
    /// when a unique index rejects the body.
    async fn insert(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> StoreResult<Document>;

    /// Replace the body of an existing document. `None` when `id` is unknown.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> StoreResult<Option<Document>>;

    /// Returns whether a document was removed.
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<bool>;

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}
