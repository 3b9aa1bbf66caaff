use crate::traits::{ContentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Content store on S3 or an S3-compatible server such as MinIO.
///
/// Libraries are buckets. One client per bucket, built on first use.
/// Credentials come from the usual `AWS_*` environment variables.
pub struct S3Storage {
    region: String,
    /// Set for S3-compatible servers, e.g. `http://minio:9000`
    endpoint_url: Option<String>,
    stores: RwLock<HashMap<String, AmazonS3>>,
}

impl S3Storage {
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        S3Storage {
            region,
            endpoint_url,
            stores: RwLock::new(HashMap::new()),
        }
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        if bucket.is_empty() {
            return Err(StorageError::InvalidKey("Bucket name is empty".to_string()));
        }

        if let Some(store) = self
            .stores
            .read()
            .map_err(|_| StorageError::ConfigError("S3 client cache poisoned".to_string()))?
            .get(bucket)
        {
            return Ok(store.clone());
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket);

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        self.stores
            .write()
            .map_err(|_| StorageError::ConfigError("S3 client cache poisoned".to_string()))?
            .insert(bucket.to_string(), store.clone());

        tracing::debug!(bucket = %bucket, region = %self.region, "S3 client created");

        Ok(store)
    }
}

#[async_trait]
impl ContentStore for S3Storage {
    async fn get_file(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();
        let location = Path::from(path);

        let result: ObjectResult<_> = store.get(&location).await;
        let object = match result {
            Ok(object) => object,
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::NotFound(format!("{}/{}", bucket, path)))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    path = %path,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object fetch failed"
                );
                return Err(StorageError::DownloadFailed(format!("{}/{}: {}", bucket, path, e)));
            }
        };

        let bytes = object
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("{}/{}: {}", bucket, path, e)))?;

        tracing::debug!(
            bucket = %bucket,
            path = %path,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fetched object"
        );

        Ok(bytes.to_vec())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;
        let location = Path::from(path);
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..PutOptions::default()
        };

        let result: ObjectResult<_> = store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                path = %path,
                size_bytes = size,
                "Object upload failed"
            );
            return Err(StorageError::UploadFailed(format!("{}/{}: {}", bucket, path, e)));
        }

        tracing::info!(
            bucket = %bucket,
            path = %path,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Uploaded object"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_are_cached_per_bucket() {
        let storage = S3Storage::new(
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        );

        storage.store_for("miniofiles").unwrap();
        storage.store_for("miniofiles").unwrap();
        storage.store_for("other").unwrap();

        assert_eq!(storage.stores.read().unwrap().len(), 2);
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }

    #[test]
    fn empty_bucket_is_rejected() {
        let storage = S3Storage::new("us-east-1".to_string(), None);
        assert!(matches!(storage.store_for(""), Err(StorageError::InvalidKey(_))));
    }
}
