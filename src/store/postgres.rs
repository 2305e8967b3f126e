//! Postgres storage backend.
//!
//! Documents live in a single `documents` table as JSONB, keyed by
//! collection and ID. Every write issues a `pg_notify` on
//! [`CHANGE_CHANNEL`] with the collection name as payload inside the same
//! transaction, so the notification goes out exactly when the write
//! commits. A
//! background listener forwards those notifications to the local change
//! feed, so writes from any server process reach every subscriber.

use std::time::Duration;

use serde_json::{Map, Value};
use sqlx::postgres::{PgConnection, PgListener, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, CHANGE_FEED_CAPACITY};
use crate::error::{AgendaError, AgendaResult};

pub const CHANGE_CHANNEL: &str = "agenda_document_changes";

const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id UUID NOT NULL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (collection, id)
)";

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Json<Map<String, Value>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            data: row.data.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgStore {
    pool: PgPool,
    changes: broadcast::Sender<Collection>,
}

impl PgStore {
    /// Connects, creates the documents table if needed, and starts the
    /// change listener.
    pub async fn connect(database_url: &str) -> AgendaResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        tokio::spawn(forward_notifications(listener, changes.clone()));
        tracing::info!("connected to postgres document store");

        Ok(Self { pool, changes })
    }
}

/// Queues a change notification; Postgres delivers it when the
/// surrounding transaction commits.
async fn notify(conn: &mut PgConnection, collection: Collection) -> AgendaResult<()> {
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(CHANGE_CHANNEL)
        .bind(collection.name())
        .execute(conn)
        .await?;

    Ok(())
}

async fn forward_notifications(mut listener: PgListener, changes: broadcast::Sender<Collection>) {
    loop {
        match listener.recv().await {
            Ok(notification) => match Collection::from_name(notification.payload()) {
                Some(collection) => {
                    let _ = changes.send(collection);
                }
                None => tracing::warn!(
                    payload = notification.payload(),
                    "ignoring change notification for unknown collection"
                ),
            },
            Err(err) => {
                // PgListener reconnects on the next recv
                tracing::error!(error = %err, "change listener failed");
                tokio::time::sleep(LISTENER_RETRY_DELAY).await;
            }
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for PgStore {
    #[tracing::instrument(skip(self, data), err)]
    async fn insert(
        &self,
        collection: Collection,
        data: Map<String, Value>,
    ) -> AgendaResult<Document> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;
        let row: DocumentRow = sqlx::query_as(
            "INSERT INTO documents (collection, id, data, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id, data, created_at, updated_at",
        )
        .bind(collection.name())
        .bind(Uuid::new_v4())
        .bind(Json(data))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        notify(&mut *tx, collection).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), err)]
    async fn get(&self, collection: Collection, id: Uuid) -> AgendaResult<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, data, created_at, updated_at
             FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self), err)]
    async fn list(&self, collection: Collection) -> AgendaResult<Vec<Document>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            "SELECT id, data, created_at, updated_at
             FROM documents WHERE collection = $1 ORDER BY created_at",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self, patch), err)]
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> AgendaResult<Document> {
        let mut tx = self.pool.begin().await?;
        // jsonb `||` is the same shallow merge as `merge_fields`
        let row: Option<DocumentRow> = sqlx::query_as(
            "UPDATE documents SET data = data || $3, updated_at = $4
             WHERE collection = $1 AND id = $2
             RETURNING id, data, created_at, updated_at",
        )
        .bind(collection.name())
        .bind(id)
        .bind(Json(patch))
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(AgendaError::NotFound { collection, id })?;
        notify(&mut *tx, collection).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete(&self, collection: Collection, id: Uuid) -> AgendaResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AgendaError::NotFound { collection, id });
        }
        notify(&mut *tx, collection).await?;
        tx.commit().await?;

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }
}
