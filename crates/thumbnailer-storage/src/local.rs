use crate::traits::{ContentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Content store on the local filesystem.
///
/// A library is a directory directly under the base path; object paths are
/// relative to it. Writes go through a sibling temp file and a rename, so a
/// reader never sees a half-written artifact.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Open (and create if needed) the root directory holding the libraries
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Cannot create local storage root {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Resolve `library/path` below the base directory.
    ///
    /// Libraries must be a single path segment and object paths must stay
    /// relative, including through symlinks that already exist.
    fn object_path(&self, library: &str, path: &str) -> StorageResult<PathBuf> {
        if library.is_empty() || library.contains(['/', '\\']) || library == ".." {
            return Err(StorageError::InvalidKey(format!(
                "Library must be a single path segment: '{}'",
                library
            )));
        }
        if path.is_empty()
            || path.starts_with('/')
            || path.split('/').any(|segment| segment == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "Object path must be relative to its library: '{}'",
                path
            )));
        }

        let resolved = self.base_path.join(library).join(path);

        if let Ok(canonical) = resolved.canonicalize() {
            let root = self.base_path.canonicalize()?;
            if !canonical.starts_with(&root) {
                return Err(StorageError::InvalidKey(format!(
                    "{}/{} resolves outside the storage root",
                    library, path
                )));
            }
        }

        Ok(resolved)
    }

    async fn write_atomically(target: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut staging = target.as_os_str().to_owned();
        staging.push(".partial");
        let staging = PathBuf::from(staging);

        let mut file = fs::File::create(&staging).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&staging, target).await
    }
}

#[async_trait]
impl ContentStore for LocalStorage {
    async fn get_file(&self, library: &str, path: &str) -> StorageResult<Vec<u8>> {
        let location = self.object_path(library, path)?;
        let start = std::time::Instant::now();

        let data = match fs::read(&location).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("{}/{}", library, path)))
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "{}/{}: {}",
                    library, path, e
                )))
            }
        };

        tracing::debug!(
            library = %library,
            path = %path,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Read object from local storage"
        );

        Ok(data)
    }

    async fn upload_file(
        &self,
        library: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let location = self.object_path(library, path)?;
        let start = std::time::Instant::now();

        Self::write_atomically(&location, &data)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}/{}: {}", library, path, e)))?;

        tracing::info!(
            library = %library,
            path = %path,
            content_type = %content_type,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored object in local storage"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
