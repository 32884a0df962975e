//! src/services/resource_service.rs
//!
//! ResourceService: list/get/create/update/delete for any [`Resource`] on
//! top of a [`DocumentStore`]. Validation always runs before a write, so the
//! store only ever sees complete records; a failing record is handed back to
//! the caller with its errors instead of being persisted.

use crate::{
    models::{Book, Movie, Record, Resource, Show, TAKEN, declared_fields},
    store::{DocumentStore, Filter, Match, StoreError, StoreResult},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResourceError<R: Resource> {
    #[error("{0} Not Found")]
    NotFound(&'static str),
    #[error("validation failed: {}", .0.errors)]
    Invalid(Box<Record<R>>),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<R: Resource> From<serde_json::Error> for ResourceError<R> {
    fn from(err: serde_json::Error) -> Self {
        ResourceError::Store(StoreError::Json(err))
    }
}

pub type ResourceResult<T, R> = Result<T, ResourceError<R>>;

#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn DocumentStore>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Declare the indexes of every served resource type.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        self.store
            .ensure_indexes(Book::COLLECTION, Book::INDEXES)
            .await?;
        self.store
            .ensure_indexes(Movie::COLLECTION, Movie::INDEXES)
            .await?;
        self.store
            .ensure_indexes(Show::COLLECTION, Show::INDEXES)
            .await
    }

    pub async fn list<R: Resource>(&self, filter: &Filter) -> ResourceResult<Vec<Record<R>>, R> {
        let docs = self.store.find(R::COLLECTION, filter).await?;
        debug!(collection = R::COLLECTION, count = docs.len(), "listed documents");
        docs.into_iter()
            .map(|doc| Record::from_document(doc).map_err(ResourceError::from))
            .collect()
    }

    pub async fn find<R: Resource>(&self, id: &str) -> ResourceResult<Option<Record<R>>, R> {
        match self.store.find_one(R::COLLECTION, id).await? {
            Some(doc) => Ok(Some(Record::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get<R: Resource>(&self, id: &str) -> ResourceResult<Record<R>, R> {
        self.find::<R>(id)
            .await?
            .ok_or(ResourceError::NotFound(R::NAME))
    }

    /// Build, validate and insert a new record from a JSON payload.
    pub async fn create<R: Resource>(
        &self,
        payload: Map<String, Value>,
    ) -> ResourceResult<Record<R>, R> {
        let fields = decode::<R>(declared_fields::<R>(payload))?;
        let mut record = Record::new(Uuid::new_v4().to_string(), fields);

        if !self.check(&mut record).await? {
            return Err(ResourceError::Invalid(Box::new(record)));
        }

        let body = record.to_body()?;
        match self.store.insert(R::COLLECTION, &record.id, body).await {
            Ok(_) => {
                info!(collection = R::COLLECTION, id = %record.id, "created record");
                Ok(record)
            }
            Err(StoreError::Conflict(reason)) => Err(taken(record, &reason)),
            Err(err) => Err(err.into()),
        }
    }

    /// Merge `patch` over `existing`, re-validate and persist.
    ///
    /// Fields absent from the patch keep their stored values; an explicit
    /// `null` clears a field (and then fails presence validation).
    pub async fn update<R: Resource>(
        &self,
        existing: Record<R>,
        patch: Map<String, Value>,
    ) -> ResourceResult<Record<R>, R> {
        let mut body = existing.to_body()?;
        for (key, value) in declared_fields::<R>(patch) {
            body.insert(key, value);
        }
        let mut record = Record::new(existing.id, decode::<R>(body)?);

        if !self.check(&mut record).await? {
            return Err(ResourceError::Invalid(Box::new(record)));
        }

        let body = record.to_body()?;
        match self.store.update_by_id(R::COLLECTION, &record.id, body).await {
            Ok(Some(doc)) => {
                info!(
                    collection = R::COLLECTION,
                    id = %record.id,
                    created_at = %doc.created_at,
                    updated_at = %doc.updated_at,
                    "updated record"
                );
                Ok(record)
            }
            Ok(None) => Err(ResourceError::NotFound(R::NAME)),
            Err(StoreError::Conflict(reason)) => Err(taken(record, &reason)),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a record. Unknown ids are a no-op.
    pub async fn delete<R: Resource>(&self, id: &str) -> ResourceResult<bool, R> {
        let removed = self.store.delete_by_id(R::COLLECTION, id).await?;
        if removed {
            info!(collection = R::COLLECTION, id, "deleted record");
        } else {
            debug!(collection = R::COLLECTION, id, "delete of unknown id ignored");
        }
        Ok(removed)
    }

    /// Presence validation followed by uniqueness lookups for `R::UNIQUE`.
    async fn check<R: Resource>(&self, record: &mut Record<R>) -> ResourceResult<bool, R> {
        record.validate();
        let body = record.to_body()?;

        for &field in R::UNIQUE {
            let matcher = match body.get(field) {
                Some(Value::String(value)) if !value.trim().is_empty() => {
                    Match::Text(value.clone())
                }
                Some(Value::Number(value)) => match value.as_f64() {
                    Some(n) => Match::Number(n),
                    None => continue,
                },
                _ => continue,
            };
            let filter = Filter::new().with(field, matcher);
            let clash = self
                .store
                .find(R::COLLECTION, &filter)
                .await?
                .iter()
                .any(|doc| doc.id != record.id);
            if clash {
                record.errors.add(field, TAKEN);
            }
        }

        Ok(record.errors.is_empty())
    }
}

fn decode<R: Resource>(body: Map<String, Value>) -> ResourceResult<R, R> {
    serde_json::from_value(Value::Object(body))
        .map_err(|err| ResourceError::Malformed(err.to_string()))
}

/// A unique index rejected a write that passed the lookup; attribute it to
/// the resource's unique fields.
fn taken<R: Resource>(mut record: Record<R>, reason: &str) -> ResourceError<R> {
    debug!(collection = R::COLLECTION, id = %record.id, reason, "unique index conflict");
    for &field in R::UNIQUE {
        record.errors.add(field, TAKEN);
    }
    ResourceError::Invalid(Box::new(record))
}
