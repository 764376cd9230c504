use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;

/// Result of persisting one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name the file is stored under; unique per upload.
    pub name: String,
    pub digest: ContentHash,
    pub size: u64,
}

/// Storage for the raw files behind upload records.
///
/// Every `put` creates a new file, so deleting one record's file never
/// affects another record.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Store bytes under a fresh name derived from `original_name`.
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<StoredFile, StorageError>;

    /// Read a stored file.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether a stored file exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;
}
