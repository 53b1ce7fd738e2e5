//! Filesystem-based usage store.
//!
//! One JSON document per user under
//! `{base_path}/{hash[0:2]}/{hash}.json`, where `hash` is the SHA-256 of the
//! user key. Hashing keeps arbitrary client-supplied keys out of file names.

use async_trait::async_trait;
use manzai_core::{UsageRecord, UserKey};
use manzai_error::{LedgerError, LedgerErrorKind, LedgerResult};
use manzai_interface::UsageStore;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Durable usage store for a single node.
///
/// Writes go to a uniquely named temp file that is then renamed over the
/// record, so a reader sees either the old or the new record, never a torn
/// one.
#[derive(Debug, Clone)]
pub struct FileSystemUsageStore {
    base_path: PathBuf,
}

impl FileSystemUsageStore {
    /// Create a store rooted at `base_path`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            LedgerError::new(LedgerErrorKind::Unavailable(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem usage store");
        Ok(Self { base_path })
    }

    /// Root directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn compute_hash(key: &UserKey) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_str().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Path of a user's record.
    pub fn path_for(&self, key: &UserKey) -> PathBuf {
        let hash = Self::compute_hash(key);
        self.base_path
            .join(&hash[0..2])
            .join(format!("{}.json", hash))
    }
}

#[async_trait]
impl UsageStore for FileSystemUsageStore {
    #[tracing::instrument(skip(self, key))]
    async fn read(&self, key: &UserKey) -> LedgerResult<UsageRecord> {
        let path = self.path_for(key);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No usage record yet");
                return Ok(UsageRecord::default());
            }
            Err(e) => {
                return Err(LedgerError::new(LedgerErrorKind::Read(format!(
                    "{}: {}",
                    path.display(),
                    e
                ))));
            }
        };

        serde_json::from_slice(&data).map_err(|e| {
            LedgerError::new(LedgerErrorKind::Serialization(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })
    }

    #[tracing::instrument(skip(self, key, record))]
    async fn upsert(&self, key: &UserKey, record: &UsageRecord) -> LedgerResult<()> {
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LedgerError::new(LedgerErrorKind::Write(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let data = serde_json::to_vec_pretty(record).map_err(|e| {
            LedgerError::new(LedgerErrorKind::Serialization(e.to_string()))
        })?;

        // Unique temp name so concurrent writers never share a temp file
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&temp_path, &data).await.map_err(|e| {
            LedgerError::new(LedgerErrorKind::Write(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            LedgerError::new(LedgerErrorKind::Write(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "Stored usage record");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
