use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{decode_collection, encode_collection, BackendError, CollectionBackend};
use crate::models::cv::CvRecord;

/// JSON file on local disk. Saves write a sibling temp file and rename it over
/// the slot, so a failed save leaves the previous collection intact.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> BackendError {
        BackendError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl CollectionBackend for FileBackend {
    async fn load(&self) -> Result<Vec<CvRecord>, BackendError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => decode_collection(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No collection file at {}, starting empty", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, records: &[CvRecord]) -> Result<(), BackendError> {
        let encoded = encode_collection(records)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| self.io_error(e))?;

        let target = self.path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(encoded.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await?
        .map_err(|e| self.io_error(e))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path().display())
    }
}
