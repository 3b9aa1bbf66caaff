//! Scripted renderer and recording publisher

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use thumbnailer_core::{
    FileMessage, ImageFormat, PipelineError, PipelineResult, RenderKind, RenderRequest,
    RenderedImage,
};
use thumbnailer_processing::PageRenderer;
use thumbnailer_worker::MessagePublisher;

/// How a scripted render fails
#[derive(Clone, Copy, Debug)]
pub enum Failure {
    Unsupported,
    Tool,
    Timeout,
}

impl Failure {
    fn error(self, request: &RenderRequest) -> PipelineError {
        match self {
            Failure::Unsupported => PipelineError::UnsupportedMimeType(request.mime_type.clone()),
            Failure::Tool => PipelineError::render_tool("convert", Some(1), b"convert: no images defined"),
            Failure::Timeout => PipelineError::RenderTimeout { timeout_ms: 10 },
        }
    }
}

/// Renderer that returns canned images and fails where told to
pub struct ScriptedRenderer {
    pages: Option<u32>,
    failure: Option<Failure>,
    failing_pages: HashSet<u32>,
    fail_high_res: bool,
    delay: Option<Duration>,
    requests: Mutex<Vec<RenderRequest>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            pages: Some(1),
            failure: None,
            failing_pages: HashSet::new(),
            fail_high_res: false,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `None` makes page counting fail
    pub fn with_pages(mut self, pages: Option<u32>) -> Self {
        self.pages = pages;
        self
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn failing_pages(mut self, pages: &[u32]) -> Self {
        self.failing_pages = pages.iter().copied().collect();
        self
    }

    pub fn failing_high_res(mut self) -> Self {
        self.fail_high_res = true;
        self
    }

    /// Spend this long on every render before reading the input
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render(&self, path: &Path, request: &RenderRequest) -> PipelineResult<RenderedImage> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !path.is_file() {
            return Err(PipelineError::render_tool(
                "convert",
                Some(1),
                b"convert: unable to open image",
            ));
        }

        if let Some(failure) = self.failure {
            return Err(failure.error(request));
        }
        let page = request.page.unwrap_or(1);
        if self.failing_pages.contains(&page) {
            return Err(Failure::Tool.error(request));
        }
        if self.fail_high_res && request.kind == RenderKind::HighResolution {
            return Err(Failure::Tool.error(request));
        }

        let bytes = match request.kind {
            RenderKind::Standard => Bytes::from(format!("thumbnail-{}", page)),
            RenderKind::HighResolution => Bytes::from(format!("image-{}", page)),
        };
        Ok(RenderedImage::new(bytes, ImageFormat::Png))
    }

    async fn count_pages(&self, _path: &Path) -> PipelineResult<u32> {
        self.pages
            .ok_or_else(|| PipelineError::PageCount("Syntax Error: Couldn't read xref table".to_string()))
    }
}

/// Publisher that keeps everything it is given
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, FileMessage)>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(String, FileMessage)> {
        self.published.lock().unwrap().clone()
    }

    pub fn to(&self, routing_key: &str) -> Vec<FileMessage> {
        self.published()
            .into_iter()
            .filter(|(key, _)| key == routing_key)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, routing_key: &str, message: &FileMessage) -> anyhow::Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((routing_key.to_string(), message.clone()));
        Ok(())
    }
}
