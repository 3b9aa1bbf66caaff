//! Per-message render pipeline: fetch → render → upload → record → propagate → route.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

use thumbnailer_core::{
    ArtifactKind, ArtifactReference, FileMessage, PipelineError, PipelineResult, RenderConfig,
    RenderRequest, RenderedImage, RoutingOutcome, RoutingTable,
};
use thumbnailer_graph::DocumentGraph;
use thumbnailer_processing::PageRenderer;
use thumbnailer_storage::{artifact_reference, ContentStore};

use crate::in_flight::InFlight;
use crate::scratch::ScratchFile;
use crate::transport::MessagePublisher;

/// Processing states a message moves through. Routed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Fetching,
    Rendering,
    Uploading,
    RecordingResult,
    Propagating,
    Routed,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Fetching => "fetching",
            PipelineState::Rendering => "rendering",
            PipelineState::Uploading => "uploading",
            PipelineState::RecordingResult => "recording_result",
            PipelineState::Propagating => "propagating",
            PipelineState::Routed => "routed",
            PipelineState::Failed => "failed",
        }
    }
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// What happened to one page in multi-page mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    Rendered {
        page: u32,
        thumbnail: ArtifactReference,
        /// High-resolution image, when enabled and successful
        image: Option<ArtifactReference>,
    },
    Skipped {
        page: u32,
        reason: String,
    },
}

impl PageResult {
    pub fn page(&self) -> u32 {
        match self {
            PageResult::Rendered { page, .. } | PageResult::Skipped { page, .. } => *page,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, PageResult::Rendered { .. })
    }
}

/// Result of processing one message
#[derive(Debug)]
pub struct MessageReport {
    pub outcome: RoutingOutcome,
    /// Document thumbnail recorded for this message, if any
    pub thumbnail: Option<ArtifactReference>,
    /// Per-page results; empty in single-page mode
    pub pages: Vec<PageResult>,
    pub error: Option<PipelineError>,
    /// Destinations the message was forwarded to
    pub destinations: Vec<String>,
}

impl MessageReport {
    fn success(thumbnail: Option<ArtifactReference>, pages: Vec<PageResult>) -> Self {
        Self {
            outcome: RoutingOutcome::Success,
            thumbnail,
            pages,
            error: None,
            destinations: Vec::new(),
        }
    }

    fn failure(error: PipelineError, pages: Vec<PageResult>) -> Self {
        Self {
            outcome: RoutingOutcome::Error,
            thumbnail: None,
            pages,
            error: Some(error),
            destinations: Vec::new(),
        }
    }
}

pub struct Orchestrator {
    storage: Arc<dyn ContentStore>,
    graph: Arc<dyn DocumentGraph>,
    renderer: Arc<dyn PageRenderer>,
    publisher: Arc<dyn MessagePublisher>,
    routing: RoutingTable,
    config: RenderConfig,
    in_flight: InFlight,
}

impl Orchestrator {
    pub fn new(
        storage: Arc<dyn ContentStore>,
        graph: Arc<dyn DocumentGraph>,
        renderer: Arc<dyn PageRenderer>,
        publisher: Arc<dyn MessagePublisher>,
        routing: RoutingTable,
        config: RenderConfig,
    ) -> Self {
        Self {
            storage,
            graph,
            renderer,
            publisher,
            routing,
            config,
            in_flight: InFlight::new(),
        }
    }

    /// Process a message and forward it to every destination its outcome routes to.
    pub async fn handle_message(&self, message: &FileMessage) -> MessageReport {
        let start = std::time::Instant::now();
        let mut report = self.process(message).await;

        let target = self.routing.resolve(report.outcome);
        if target.is_terminal() {
            tracing::info!(
                message_id = %message.uuid,
                outcome = %report.outcome,
                "No next routing key"
            );
        }

        for destination in target.destinations() {
            match self.publisher.publish(destination, message).await {
                Ok(()) => {
                    tracing::info!(
                        message_id = %message.uuid,
                        outcome = %report.outcome,
                        routing_key = %destination,
                        "Message forwarded"
                    );
                    report.destinations.push(destination.to_string());
                }
                Err(e) => tracing::error!(
                    message_id = %message.uuid,
                    routing_key = %destination,
                    error = %e,
                    "Failed to forward message"
                ),
            }
        }

        if report.outcome.is_success() {
            self.transition(message, PipelineState::Routed);
        }
        tracing::info!(
            message_id = %message.uuid,
            outcome = %report.outcome,
            pages = report.pages.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Message processed"
        );
        report
    }

    /// Run the pipeline for one message and fold the result into an outcome.
    /// The scratch copy is removed before this returns. Runs for the same
    /// identifier never overlap.
    pub async fn process(&self, message: &FileMessage) -> MessageReport {
        let _claim = self.in_flight.claim(&message.uuid).await;
        let scratch = match ScratchFile::for_message(&self.config.scratch_dir, &message.uuid) {
            Ok(scratch) => scratch,
            Err(reason) => {
                return self.fail(
                    message,
                    PipelineError::Fetch {
                        library: message.library.clone(),
                        path: message.path.clone(),
                        reason,
                    },
                    Vec::new(),
                )
            }
        };

        if let Err(e) = self.fetch(message, &scratch).await {
            return self.fail(message, e, Vec::new());
        }

        if self.config.paginate && message.is_paginated_type() {
            self.process_pages(message, scratch.path()).await
        } else {
            match self.process_single(message, scratch.path()).await {
                Ok(thumbnail) => MessageReport::success(Some(thumbnail), Vec::new()),
                Err(e) => self.fail(message, e, Vec::new()),
            }
        }
    }

    async fn fetch(&self, message: &FileMessage, scratch: &ScratchFile) -> PipelineResult<()> {
        self.transition(message, PipelineState::Fetching);
        if scratch.exists() {
            tracing::debug!(
                message_id = %message.uuid,
                path = %scratch.path().display(),
                "Local copy already present, skipping download"
            );
            return Ok(());
        }

        let fetch_error = |reason: String| PipelineError::Fetch {
            library: message.library.clone(),
            path: message.path.clone(),
            reason,
        };

        let data = self
            .storage
            .get_file(&message.library, &message.path)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        scratch
            .write(&data)
            .await
            .map_err(|e| fetch_error(e.to_string()))
    }

    async fn process_single(
        &self,
        message: &FileMessage,
        path: &Path,
    ) -> PipelineResult<ArtifactReference> {
        self.transition(message, PipelineState::Rendering);
        let request = RenderRequest::thumbnail(
            message.mime_type(),
            self.config.thumbnail_width,
            self.config.thumbnail_height,
        )
        .with_page(1);
        let image = self.renderer.render(path, &request).await?;

        self.transition(message, PipelineState::Uploading);
        let reference = self
            .upload(&message.uuid, ArtifactKind::Thumbnail, None, &image)
            .await?;

        self.transition(message, PipelineState::RecordingResult);
        self.graph
            .set_document_thumbnail(&message.uuid, &reference.to_string())
            .await
            .map_err(|e| PipelineError::GraphWrite(e.to_string()))?;

        self.propagate(message).await?;
        Ok(reference)
    }

    async fn process_pages(&self, message: &FileMessage, path: &Path) -> MessageReport {
        let count = match self.renderer.count_pages(path).await {
            Ok(count) => count,
            Err(e) => return self.fail(message, e, Vec::new()),
        };
        tracing::info!(message_id = %message.uuid, pages = count, "Rendering pages");

        let mut results = Vec::new();
        let mut thumbnail = None;
        let mut last_error = None;

        for page in 1..=count {
            let result = match self.process_page(message, path, page).await {
                Ok((reference, image)) => PageResult::Rendered {
                    page,
                    thumbnail: reference,
                    image,
                },
                Err(e) => {
                    tracing::warn!(
                        message_id = %message.uuid,
                        page,
                        error_code = e.error_code(),
                        error = %e,
                        "Page skipped"
                    );
                    let skipped = PageResult::Skipped {
                        page,
                        reason: e.to_string(),
                    };
                    last_error = Some(e);
                    skipped
                }
            };

            if let PageResult::Rendered {
                page: 1,
                thumbnail: reference,
                ..
            } = &result
            {
                match self.record_document_thumbnail(message, reference).await {
                    Ok(()) => thumbnail = Some(reference.clone()),
                    Err(e) => tracing::warn!(
                        message_id = %message.uuid,
                        error_code = e.error_code(),
                        error = %e,
                        "First page rendered but document thumbnail not recorded"
                    ),
                }
            }

            results.push(result);
        }

        if results.iter().any(PageResult::is_rendered) {
            MessageReport::success(thumbnail, results)
        } else {
            let error = last_error
                .unwrap_or_else(|| PipelineError::PageCount("document has no pages".to_string()));
            self.fail(message, error, results)
        }
    }

    /// Render, upload and record one page, then its high-resolution image when enabled.
    async fn process_page(
        &self,
        message: &FileMessage,
        path: &Path,
        page: u32,
    ) -> PipelineResult<(ArtifactReference, Option<ArtifactReference>)> {
        self.transition_page(message, page, PipelineState::Rendering);
        let request = RenderRequest::thumbnail(
            message.mime_type(),
            self.config.thumbnail_width,
            self.config.thumbnail_height,
        )
        .with_page(page);
        let image = self.renderer.render(path, &request).await?;

        self.transition_page(message, page, PipelineState::Uploading);
        let reference = self
            .upload(&message.uuid, ArtifactKind::PageThumbnail, Some(page), &image)
            .await?;

        self.transition_page(message, page, PipelineState::RecordingResult);
        self.graph
            .record_page_thumbnail(&message.uuid, page, &reference.to_string())
            .await
            .map_err(|e| PipelineError::GraphWrite(e.to_string()))?;

        let image = if self.config.generate_high_res {
            match self.process_page_image(message, path, page).await {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(
                        message_id = %message.uuid,
                        page,
                        error_code = e.error_code(),
                        error = %e,
                        "High-resolution image failed"
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok((reference, image))
    }

    async fn process_page_image(
        &self,
        message: &FileMessage,
        path: &Path,
        page: u32,
    ) -> PipelineResult<ArtifactReference> {
        let request = RenderRequest::high_resolution(
            message.mime_type(),
            self.config.high_res_width,
            self.config.high_res_density,
        )
        .with_page(page);
        let image = self.renderer.render(path, &request).await?;

        let reference = self
            .upload(&message.uuid, ArtifactKind::PageImage, Some(page), &image)
            .await?;

        let page_id = self
            .graph
            .record_page_image(&message.uuid, page, &reference.to_string())
            .await
            .map_err(|e| PipelineError::GraphWrite(e.to_string()))?;

        let announcement = FileMessage::new(page_id, &reference.library, &reference.path)
            .with_mime(image.format.content_type());
        if let Err(e) = self
            .publisher
            .publish(&self.config.high_res_routing_key, &announcement)
            .await
        {
            tracing::error!(
                message_id = %message.uuid,
                page,
                routing_key = %self.config.high_res_routing_key,
                error = %e,
                "Failed to announce page image"
            );
        }

        Ok(reference)
    }

    async fn record_document_thumbnail(
        &self,
        message: &FileMessage,
        reference: &ArtifactReference,
    ) -> PipelineResult<()> {
        self.graph
            .set_document_thumbnail(&message.uuid, &reference.to_string())
            .await
            .map_err(|e| PipelineError::GraphWrite(e.to_string()))?;
        self.propagate(message).await
    }

    async fn propagate(&self, message: &FileMessage) -> PipelineResult<()> {
        self.transition(message, PipelineState::Propagating);
        let updated = self
            .graph
            .propagate_thumbnail(&message.uuid)
            .await
            .map_err(|e| PipelineError::GraphWrite(e.to_string()))?;
        tracing::info!(message_id = %message.uuid, updated, "Thumbnail propagated");
        Ok(())
    }

    async fn upload(
        &self,
        id: &str,
        kind: ArtifactKind,
        page: Option<u32>,
        image: &RenderedImage,
    ) -> PipelineResult<ArtifactReference> {
        let reference = artifact_reference(
            &self.config.artifact_library,
            &self.config.artifact_prefix,
            id,
            kind,
            page,
            image.format,
        )
        .map_err(|e| PipelineError::Upload {
            reference: id.to_string(),
            reason: e.to_string(),
        })?;

        self.storage
            .upload_file(
                &reference.library,
                &reference.path,
                image.bytes.clone(),
                image.format.content_type(),
            )
            .await
            .map_err(|e| PipelineError::Upload {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;

        Ok(reference)
    }

    fn fail(
        &self,
        message: &FileMessage,
        error: PipelineError,
        pages: Vec<PageResult>,
    ) -> MessageReport {
        tracing::error!(
            message_id = %message.uuid,
            path = %message.path,
            error_code = error.error_code(),
            error = %error,
            "Message processing failed"
        );
        self.transition(message, PipelineState::Failed);
        MessageReport::failure(error, pages)
    }

    fn transition(&self, message: &FileMessage, state: PipelineState) {
        tracing::debug!(message_id = %message.uuid, state = %state, "Pipeline state");
    }

    fn transition_page(&self, message: &FileMessage, page: u32, state: PipelineState) {
        tracing::debug!(message_id = %message.uuid, page, state = %state, "Pipeline state");
    }
}
