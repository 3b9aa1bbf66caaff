//! Thumbnailer Core Library
//!
//! This crate provides the domain model, error taxonomy, configuration and
//! routing resolution shared by every thumbnailer component.

pub mod config;
pub mod error;
pub mod models;
pub mod routing;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, GraphConfig, RenderConfig, StorageConfig, ToolConfig};
pub use error::{PipelineError, PipelineResult};
pub use models::{
    ArtifactKind, ArtifactReference, FileMessage, ImageFormat, RenderKind, RenderRequest,
    RenderedImage, RoutingOutcome, DEFAULT_MIME_TYPE, FILE_PROCESSING_MESSAGE, PAGINATED_MIME_TYPE,
};
pub use routing::{RouteTarget, RoutingTable};
pub use storage_types::StorageBackend;
