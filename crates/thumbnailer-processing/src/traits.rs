//! Core traits for rendering

use async_trait::async_trait;
use std::path::Path;
use thumbnailer_core::{PipelineResult, RenderRequest, RenderedImage};

/// One way of turning a local file into image bytes
#[async_trait]
pub trait RenderStrategy: Send + Sync {
    async fn render(&self, path: &Path, request: &RenderRequest) -> PipelineResult<RenderedImage>;
}

/// What the pipeline needs from the rendering engine.
///
/// Implementations are expected to bound every call with their own timeout.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, path: &Path, request: &RenderRequest) -> PipelineResult<RenderedImage>;

    async fn count_pages(&self, path: &Path) -> PipelineResult<u32>;
}
