use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use super::{BackendError, CollectionBackend};
use crate::models::cv::CvRecord;

/// One row per slot, the collection stored as a JSONB array.
pub struct PostgresBackend {
    pool: PgPool,
    slot: String,
}

impl PostgresBackend {
    pub fn new(pool: PgPool, slot: impl Into<String>) -> Self {
        Self {
            pool,
            slot: slot.into(),
        }
    }

    /// Opens a small pool against `database_url` and makes sure the table exists.
    pub async fn connect(database_url: &str, slot: impl Into<String>) -> Result<Self, BackendError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connection pool established");

        let backend = Self::new(pool, slot);
        backend.ensure_schema().await?;
        Ok(backend)
    }

    /// Creates the `cv_collections` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), BackendError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cv_collections (
                slot       TEXT PRIMARY KEY,
                payload    JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("cv_collections table ready");
        Ok(())
    }
}

fn decode_payload(payload: serde_json::Value) -> Result<Vec<CvRecord>, BackendError> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(payload).map_err(BackendError::Corrupt)
}

fn encode_payload(records: &[CvRecord]) -> Result<serde_json::Value, BackendError> {
    serde_json::to_value(records).map_err(BackendError::Encode)
}

#[async_trait]
impl CollectionBackend for PostgresBackend {
    async fn load(&self) -> Result<Vec<CvRecord>, BackendError> {
        let payload: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT payload FROM cv_collections WHERE slot = $1")
                .bind(&self.slot)
                .fetch_optional(&self.pool)
                .await?;

        match payload {
            Some(p) => decode_payload(p),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, records: &[CvRecord]) -> Result<(), BackendError> {
        let payload = encode_payload(records)?;

        sqlx::query(
            r#"
            INSERT INTO cv_collections (slot, payload, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (slot)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&self.slot)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("postgres:cv_collections/{}", self.slot)
    }
}
