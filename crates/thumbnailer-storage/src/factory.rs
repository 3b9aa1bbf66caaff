#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{ContentStore, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use thumbnailer_core::StorageConfig;

/// Open the content store selected by `STORAGE_BACKEND`
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn ContentStore>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("s3 backend needs S3_REGION or AWS_REGION".to_string())
            })?;

            tracing::info!(region = %region, endpoint = ?config.s3_endpoint, "Using S3 content store");
            Ok(Arc::new(S3Storage::new(region, config.s3_endpoint.clone())))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "built without the storage-s3 feature".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("local backend needs LOCAL_STORAGE_PATH".to_string())
            })?;

            tracing::info!(path = %base_path.display(), "Using local content store");
            Ok(Arc::new(LocalStorage::new(base_path).await?))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "built without the storage-local feature".to_string(),
        )),
    }
}
