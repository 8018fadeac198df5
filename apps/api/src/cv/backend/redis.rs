use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{decode_collection, encode_collection, BackendError, CollectionBackend};
use crate::models::cv::CvRecord;

/// A single Redis string key holding the serialized collection.
pub struct RedisBackend {
    conn: MultiplexedConnection,
    key: String,
}

impl RedisBackend {
    pub async fn connect(
        client: &redis::Client,
        key: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            key: key.into(),
        })
    }
}

#[async_trait]
impl CollectionBackend for RedisBackend {
    async fn load(&self) -> Result<Vec<CvRecord>, BackendError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&self.key).await?;
        match raw {
            Some(raw) => decode_collection(&raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, records: &[CvRecord]) -> Result<(), BackendError> {
        let encoded = encode_collection(records)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&self.key, encoded).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis:{}", self.key)
    }
}
