//! Content store seam
//!
//! Every object is addressed by a library (bucket or top-level directory)
//! and a path inside it.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Content store failures. The orchestrator maps them onto fetch and upload errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not store object {0}")]
    UploadFailed(String),

    #[error("Could not fetch object {0}")]
    DownloadFailed(String),

    #[error("No such object: {0}")]
    NotFound(String),

    #[error("Invalid object address: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage misconfigured: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Content store abstraction
///
/// Source documents are fetched and rendered artifacts are written through this
/// trait, so the pipeline never couples to a specific backend. Uploading to an
/// existing `(library, path)` overwrites it.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the full contents of an object
    async fn get_file(&self, library: &str, path: &str) -> StorageResult<Vec<u8>>;

    /// Write an object, replacing any existing one at the same address
    async fn upload_file(
        &self,
        library: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
