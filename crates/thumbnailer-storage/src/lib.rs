//! Thumbnailer Storage Library
//!
//! Content-store abstraction for source documents and rendered artifacts,
//! with S3-compatible and local filesystem backends.
//!
//! # Addressing
//!
//! Every object is addressed by `(library, path)`. For S3 the library is the
//! bucket; for the local backend it is a directory under the base path.
//!
//! Artifact paths are derived in the `keys` module so re-processing a
//! document overwrites the same objects:
//!
//! - **Document thumbnail**: `{prefix}/{id}/thumbnail.{ext}`
//! - **Page thumbnail**: `{prefix}/{id}/pages/{page}/thumbnail.{ext}`
//! - **Page image**: `{prefix}/{id}/pages/{page}/image.{ext}`

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::artifact_reference;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use thumbnailer_core::StorageBackend;
pub use traits::{ContentStore, StorageError, StorageResult};
