//! SQLite-backed [`DocumentStore`].
//!
//! All collections share one `documents` table; each row holds the JSON body
//! as text. Field filters and indexes go through `json_extract(body, '$.field')`
//! so that declared indexes and filter expressions line up.

use super::{
    Document, DocumentStore, Filter, IndexSpec, Match, StoreError, StoreResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{
    FromRow, QueryBuilder, SqlitePool,
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc};
use tracing::debug;

const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone)]
pub struct SqliteStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> StoreResult<Self> {
        Ok(Document {
            id: row.id,
            body: serde_json::from_str(&row.body)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl SqliteStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Open a pool for `url`, creating the database file if it is missing.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Private in-memory database on a single long-lived connection.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to one connection that never idles out.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Apply the embedded schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> StoreResult<()> {
        let statements = INIT_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        tracing::info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, body, created_at, updated_at FROM documents WHERE collection = ",
        );
        builder.push_bind(collection.to_string());

        for condition in &filter.conditions {
            ensure_identifier(condition.field)?;
            let expr = field_expr(condition.field);
            match &condition.matcher {
                Match::Prefix(prefix) => {
                    // The range bound lets the title index seek; substr keeps
                    // the match exact and case-sensitive.
                    builder.push(format!(" AND {expr} >= "));
                    builder.push_bind(prefix.clone());
                    builder.push(format!(" AND substr({expr}, 1, length("));
                    builder.push_bind(prefix.clone());
                    builder.push(")) = ");
                    builder.push_bind(prefix.clone());
                }
                Match::Text(value) => {
                    builder.push(format!(" AND {expr} = "));
                    builder.push_bind(value.clone());
                }
                Match::Number(value) => {
                    builder.push(format!(" AND {expr} = "));
                    builder.push_bind(*value);
                }
            }
        }

        builder.push(" ORDER BY seq ASC");

        let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(&*self.db).await?;
        rows.into_iter().map(Document::try_from).collect()
    }

    async fn find_one(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        sqlx::query_as::<_, DocumentRow>(
            "SELECT id, body, created_at, updated_at
             FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .map(Document::try_from)
        .transpose()
    }

    async fn insert(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> StoreResult<Document> {
        let now = Utc::now();
        let encoded = serde_json::to_string(&body)?;

        sqlx::query(
            "INSERT INTO documents (id, collection, body, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(collection)
        .bind(&encoded)
        .bind(now)
        .bind(now)
        .execute(&*self.db)
        .await
        .map_err(map_write_error)?;

        debug!(collection, id, "inserted document");

        Ok(Document {
            id: id.to_string(),
            body,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        body: Map<String, Value>,
    ) -> StoreResult<Option<Document>> {
        let encoded = serde_json::to_string(&body)?;

        sqlx::query_as::<_, DocumentRow>(
            "UPDATE documents SET body = ?, updated_at = ?
             WHERE collection = ? AND id = ?
             RETURNING id, body, created_at, updated_at",
        )
        .bind(&encoded)
        .bind(Utc::now())
        .bind(collection)
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(map_write_error)?
        .map(Document::try_from)
        .transpose()
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ensure_indexes(&self, collection: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        ensure_identifier(collection)?;
        for index in indexes {
            ensure_identifier(index.field)?;
            let expr = field_expr(index.field);
            let sql = if index.unique {
                format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {collection}_{field}_unique \
                     ON documents ({expr}) WHERE collection = '{collection}'",
                    field = index.field,
                )
            } else {
                format!(
                    "CREATE INDEX IF NOT EXISTS {collection}_{field}_idx \
                     ON documents (collection, {expr})",
                    field = index.field,
                )
            };
            debug!("Declaring index: {}", sql);
            sqlx::query(&sql).execute(&*self.db).await?;
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        let one = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        if one == 1 {
            Ok(())
        } else {
            Err(StoreError::Sqlx(sqlx::Error::Protocol(format!(
                "unexpected result: {}",
                one
            ))))
        }
    }
}

fn field_expr(field: &str) -> String {
    format!("json_extract(body, '$.{}')", field)
}

/// Collection and field names are spliced into SQL, so only plain
/// identifiers are accepted.
fn ensure_identifier(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict(err.to_string())
    } else {
        StoreError::Sqlx(err)
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store
            .ensure_indexes(
                "books",
                &[IndexSpec::ascending("title"), IndexSpec::unique("isbn")],
            )
            .await
            .unwrap();
        store
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn prefix_filter_is_case_sensitive() {
        let store = store().await;
        for (id, title, isbn) in [
            ("1", "Harry Potter", "a"),
            ("2", "harbour", "b"),
            ("3", "The Hobbit", "c"),
        ] {
            store
                .insert("books", id, body(json!({ "title": title, "isbn": isbn })))
                .await
                .unwrap();
        }

        let found = store
            .find("books", &Filter::new().with("title", Match::Prefix("Har".into())))
            .await
            .unwrap();

        let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates_within_collection_only() {
        let store = store().await;
        store
            .insert("books", "1", body(json!({ "isbn": "123" })))
            .await
            .unwrap();

        let err = store
            .insert("books", "2", body(json!({ "isbn": "123" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store
            .insert("movies", "3", body(json!({ "isbn": "123" })))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn numeric_filter_matches_integer_and_float_bodies() {
        let store = store().await;
        store
            .insert("movies", "1", body(json!({ "rating": 8 })))
            .await
            .unwrap();
        store
            .insert("movies", "2", body(json!({ "rating": 7.5 })))
            .await
            .unwrap();

        let found = store
            .find("movies", &Filter::new().with("rating", Match::Number(8.0)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let store = store().await;
        let updated = store
            .update_by_id("books", "missing", body(json!({ "title": "x" })))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert!(!store.delete_by_id("books", "missing").await.unwrap());
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_advances_updated_at() {
        let store = store().await;
        let inserted = store
            .insert("books", "1", body(json!({ "title": "Dune" })))
            .await
            .unwrap();

        let updated = store
            .update_by_id("books", "1", body(json!({ "title": "Dune Messiah" })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.created_at, inserted.created_at);
        assert!(updated.updated_at >= inserted.updated_at);
        assert_eq!(updated.body["title"], "Dune Messiah");
    }

    #[tokio::test]
    async fn rejects_non_identifier_field_names() {
        let store = store().await;
        let err = store
            .ensure_indexes("books", &[IndexSpec::ascending("title') --")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }
}
