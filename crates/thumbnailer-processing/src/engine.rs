//! Render engine: strategy dispatch plus timeout

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thumbnailer_core::{PipelineResult, RenderRequest, RenderedImage, ToolConfig};

use crate::conversion::ConversionStrategy;
use crate::page_count::PageCounter;
use crate::raster::RasterStrategy;
use crate::selector::{select_strategy, StrategyKind};
use crate::timeout::TimeoutGuard;
use crate::tool::ExternalTool;
use crate::traits::{PageRenderer, RenderStrategy};

pub struct RenderEngine {
    raster: RasterStrategy,
    conversion: ConversionStrategy,
    counter: PageCounter,
    guard: TimeoutGuard,
}

impl RenderEngine {
    pub fn new(
        rasterizer: ExternalTool,
        converter: ExternalTool,
        inspector: ExternalTool,
        timeout: Duration,
    ) -> Self {
        Self {
            raster: RasterStrategy::new(rasterizer.clone()),
            conversion: ConversionStrategy::new(converter, rasterizer),
            counter: PageCounter::new(inspector),
            guard: TimeoutGuard::new(timeout),
        }
    }

    pub fn from_config(tools: &ToolConfig, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self::new(
            ExternalTool::parse(&tools.raster)?,
            ExternalTool::parse(&tools.converter)?,
            ExternalTool::parse(&tools.inspector)?,
            timeout,
        ))
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn RenderStrategy {
        match kind {
            StrategyKind::Raster => &self.raster,
            StrategyKind::Conversion => &self.conversion,
        }
    }
}

#[async_trait]
impl PageRenderer for RenderEngine {
    async fn render(&self, path: &Path, request: &RenderRequest) -> PipelineResult<RenderedImage> {
        let strategy = self.strategy(select_strategy(&request.mime_type)?);
        self.guard.run(strategy.render(path, request)).await
    }

    async fn count_pages(&self, path: &Path) -> PipelineResult<u32> {
        self.guard.run(self.counter.count_pages(path)).await
    }
}
