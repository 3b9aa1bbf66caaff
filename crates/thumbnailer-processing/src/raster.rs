//! Single-process rasterization

use async_trait::async_trait;
use std::path::Path;
use thumbnailer_core::{ImageFormat, PipelineResult, RenderKind, RenderRequest, RenderedImage};

use crate::tool::ExternalTool;
use crate::traits::RenderStrategy;

/// Geometry argument: `WxH` with unset sides left empty, `x300` when neither is set
pub fn size_spec(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (None, None) => "x300".to_string(),
        (width, height) => format!(
            "{}x{}",
            width.map(|w| w.to_string()).unwrap_or_default(),
            height.map(|h| h.to_string()).unwrap_or_default()
        ),
    }
}

/// Scaling and background arguments shared by both strategies
pub(crate) fn scale_args(request: &RenderRequest) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(density) = request.density {
        args.push("-density".to_string());
        args.push(density.to_string());
    }
    let scale = match request.kind {
        RenderKind::Standard => "-thumbnail",
        RenderKind::HighResolution => "-resize",
    };
    args.push(scale.to_string());
    args.push(size_spec(request.width, request.height));
    args.extend(["-background", "white", "-alpha", "remove"].map(String::from));
    args
}

/// Full argument list for rasterizing one page of `path` to PNG on stdout.
/// Pages are one-indexed; absent or zero selects the first page.
pub fn raster_args(path: &Path, request: &RenderRequest) -> Vec<String> {
    let index = request.page.unwrap_or(1).saturating_sub(1);
    let mut args = scale_args(request);
    args.push(format!("{}[{}]", path.display(), index));
    args.push(ImageFormat::Png.stdout_spec().to_string());
    args
}

pub struct RasterStrategy {
    tool: ExternalTool,
}

impl RasterStrategy {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl RenderStrategy for RasterStrategy {
    #[tracing::instrument(skip(self, request), fields(process.executable.name = %self.tool.name(), page = ?request.page))]
    async fn render(&self, path: &Path, request: &RenderRequest) -> PipelineResult<RenderedImage> {
        let output = self.tool.output(raster_args(path, request)).await?;
        self.tool.check(&output)?;

        tracing::debug!(size_bytes = output.stdout.len(), "Raster render complete");
        Ok(RenderedImage::new(output.stdout, ImageFormat::Png))
    }
}
