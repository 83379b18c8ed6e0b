use crate::errors::ClientResult;
use crate::queries::{DbHelpers, Queries};
use crate::store::LocalStore;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::str::FromStr;
use tasksync_core::{TaskId, TaskRecord};
use uuid::Uuid;

/// SQLite-backed [`LocalStore`].
pub struct SqliteStore {
    pub pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str, max_connections: u32) -> ClientResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to ":memory:" opens its own database, so keep exactly
        // one and never let the pool recycle it.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Fresh in-memory cache with the schema applied.
    pub async fn in_memory() -> ClientResult<Self> {
        let store = Self::new("sqlite::memory:", 1).await?;
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn run_migrations(&self) -> ClientResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn upsert(conn: &mut SqliteConnection, record: &TaskRecord) -> ClientResult<()> {
        sqlx::query(Queries::UPSERT_TASK)
            .bind(Uuid::new_v4().to_string())
            .bind(record.id.as_str())
            .bind(record.to_json()?)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn get(&self, id: &TaskId) -> ClientResult<Option<TaskRecord>> {
        let row = sqlx::query(Queries::GET_TASK)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(DbHelpers::row_to_task).transpose()
    }

    async fn get_all(&self) -> ClientResult<Vec<TaskRecord>> {
        let rows = sqlx::query(Queries::GET_ALL_TASKS)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(DbHelpers::row_to_task).collect()
    }

    async fn set(&self, id: &TaskId, record: &TaskRecord) -> ClientResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert(&mut conn, &record.clone().with_id(id.clone())).await?;
        tracing::debug!(task_id = %id, "Cached task");
        Ok(())
    }

    async fn set_many(&self, records: &[TaskRecord]) -> ClientResult<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            Self::upsert(&mut tx, record).await?;
        }
        tx.commit().await?;
        tracing::debug!(count = records.len(), "Cached tasks");
        Ok(())
    }

    async fn remove(&self, id: &TaskId) -> ClientResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(Queries::DELETE_TASK)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query(Queries::DELETE_ALIASES_TO)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_all(&self, records: &[TaskRecord]) -> ClientResult<()> {
        let keep: HashSet<&str> = records.iter().map(|record| record.id.as_str()).collect();

        let mut tx = self.pool.begin().await?;
        let existing: Vec<String> = sqlx::query_scalar(Queries::GET_ALL_IDS)
            .fetch_all(&mut *tx)
            .await?;

        for id in existing.iter().filter(|id| !keep.contains(id.as_str())) {
            sqlx::query(Queries::DELETE_TASK)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await?;
            sqlx::query(Queries::DELETE_ALIASES_TO)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await?;
        }
        for record in records {
            Self::upsert(&mut tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remap(&self, ephemeral: &TaskId, canonical: &TaskRecord) -> ClientResult<()> {
        let mut tx = self.pool.begin().await?;

        let local_key: Option<String> = sqlx::query_scalar(Queries::GET_LOCAL_KEY)
            .bind(ephemeral.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        match local_key {
            Some(local_key) => {
                sqlx::query(Queries::DELETE_OTHER_HOLDER)
                    .bind(canonical.id.as_str())
                    .bind(local_key.as_str())
                    .execute(&mut *tx)
                    .await?;
                sqlx::query(Queries::REKEY_TASK)
                    .bind(local_key.as_str())
                    .bind(canonical.id.as_str())
                    .bind(canonical.to_json()?)
                    .execute(&mut *tx)
                    .await?;
            }
            None => Self::upsert(&mut tx, canonical).await?,
        }

        sqlx::query(Queries::UPSERT_ALIAS)
            .bind(ephemeral.as_str())
            .bind(canonical.id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(from = %ephemeral, to = %canonical.id, "Remapped task id");
        Ok(())
    }

    async fn resolve(&self, id: &TaskId) -> ClientResult<TaskId> {
        let canonical: Option<String> = sqlx::query_scalar(Queries::RESOLVE_ALIAS)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(canonical.map(TaskId::from).unwrap_or_else(|| id.clone()))
    }
}
