//! Content store held in memory

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use thumbnailer_storage::{ContentStore, StorageBackend, StorageError, StorageResult};

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), (Bytes, String)>>,
    downloads: Mutex<usize>,
}

impl MemoryStore {
    pub fn insert(&self, library: &str, path: &str, data: &'static [u8]) {
        self.objects.lock().unwrap().insert(
            (library.to_string(), path.to_string()),
            (Bytes::from_static(data), "application/octet-stream".to_string()),
        );
    }

    /// Stored bytes and content type
    pub fn get(&self, library: &str, path: &str) -> Option<(Bytes, String)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(library.to_string(), path.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn downloads(&self) -> usize {
        *self.downloads.lock().unwrap()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_file(&self, library: &str, path: &str) -> StorageResult<Vec<u8>> {
        *self.downloads.lock().unwrap() += 1;
        self.get(library, path)
            .map(|(data, _)| data.to_vec())
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", library, path)))
    }

    async fn upload_file(
        &self,
        library: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        self.objects.lock().unwrap().insert(
            (library.to_string(), path.to_string()),
            (data, content_type.to_string()),
        );
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
