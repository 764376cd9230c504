use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{StoredFile, UploadStore};

/// Longest original-name suffix kept in a stored name.
const MAX_NAME_SUFFIX: usize = 96;

/// Filesystem-backed upload store.
///
/// Files live flat under `{base_path}/{uuid-v7}_{sanitized original name}`.
/// Writes land in `{base_path}/.tmp` first and are renamed into place.
pub struct FilesystemUploadStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemUploadStore {
    /// Create a new filesystem upload store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Compute the filesystem path for a stored name.
    fn file_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_stored_name(name)?;
        Ok(self.base_path.join(name))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl UploadStore for FilesystemUploadStore {
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<StoredFile, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let name = stored_name(original_name);
        let path = self.file_path(&name)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(name = %name, size = data.len(), "Stored upload file");

        Ok(StoredFile {
            name,
            digest: ContentHash::compute(data),
            size: data.len() as u64,
        })
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.file_path(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Build a unique stored name that still reads like the uploaded file.
fn stored_name(original_name: &str) -> String {
    let mut suffix: String = original_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_SUFFIX)
        .collect();

    if suffix.trim_matches(|c| c == '.' || c == '_').is_empty() {
        suffix = "upload.csv".to_string();
    }

    format!("{}_{}", uuid::Uuid::now_v7().simple(), suffix)
}

/// A stored name must be a single plain path component.
fn validate_stored_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.chars().any(|c| c.is_ascii_control());

    if invalid {
        Err(StorageError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
