use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{decode_collection, encode_collection, BackendError, CollectionBackend};
use crate::models::cv::CvRecord;

/// Process-local slot. Holds the serialized text, so records go through the
/// same encoding as the durable backends.
#[derive(Default)]
pub struct MemoryBackend {
    slot: RwLock<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn raw(&self) -> Option<String> {
        self.slot.read().await.clone()
    }

    #[cfg(test)]
    pub async fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.write().await = Some(raw.into());
    }
}

#[async_trait]
impl CollectionBackend for MemoryBackend {
    async fn load(&self) -> Result<Vec<CvRecord>, BackendError> {
        match self.slot.read().await.as_deref() {
            Some(raw) => decode_collection(raw),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, records: &[CvRecord]) -> Result<(), BackendError> {
        let encoded = encode_collection(records)?;
        *self.slot.write().await = Some(encoded);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
