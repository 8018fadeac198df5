//! Persistence backends for the CV collection.
//!
//! Every backend owns exactly one named slot holding the whole collection as a
//! JSON array. The store loads the slot at the start of each operation and
//! rewrites it at the end of each mutation; backends never see partial writes.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::cv::CvRecord;

pub mod file;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
pub use self::redis::RedisBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Stored collection is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Collection could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Load/save capability over the single collection slot.
#[async_trait]
pub trait CollectionBackend: Send + Sync {
    /// Reads the whole collection. A slot that was never written is empty.
    async fn load(&self) -> Result<Vec<CvRecord>, BackendError>;

    /// Replaces the whole collection.
    async fn save(&self, records: &[CvRecord]) -> Result<(), BackendError>;

    /// Short human-readable location, for logs.
    fn describe(&self) -> String;
}

pub(crate) fn encode_collection(records: &[CvRecord]) -> Result<String, BackendError> {
    serde_json::to_string(records).map_err(BackendError::Encode)
}

/// Blank slots decode to an empty collection.
pub(crate) fn decode_collection(raw: &str) -> Result<Vec<CvRecord>, BackendError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(BackendError::Corrupt)
}
