//! Two-process streaming conversion: document converter piped into the rasterizer

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thumbnailer_core::{ImageFormat, PipelineError, PipelineResult, RenderRequest, RenderedImage};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;

use crate::raster::scale_args;
use crate::tool::ExternalTool;
use crate::traits::RenderStrategy;

/// Converter arguments: export one page as PDF to stdout
pub fn converter_args(path: &Path, request: &RenderRequest) -> Vec<String> {
    vec![
        "-f".to_string(),
        "pdf".to_string(),
        "-e".to_string(),
        format!("PageRange={}", request.page.filter(|p| *p > 0).unwrap_or(1)),
        "--stdout".to_string(),
        path.display().to_string(),
    ]
}

/// Rasterizer arguments: read PDF on stdin, write JPEG to stdout
pub fn consumer_args(request: &RenderRequest) -> Vec<String> {
    let mut args = scale_args(request);
    args.push("pdf:-".to_string());
    args.push(ImageFormat::Jpeg.stdout_spec().to_string());
    args
}

/// Both children of one conversion. Dropping the pair kills whichever is still running.
struct ProcessPair {
    producer: Child,
    consumer: Child,
}

impl Drop for ProcessPair {
    fn drop(&mut self) {
        let _ = self.producer.start_kill();
        let _ = self.consumer.start_kill();
    }
}

const SIGPIPE: i32 = 13;

/// Killed by SIGPIPE, either directly or as reported by a wrapping shell.
fn killed_by_broken_pipe(status: ExitStatus) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if status.signal() == Some(SIGPIPE) {
            return true;
        }
    }
    status.code() == Some(128 + SIGPIPE)
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

pub struct ConversionStrategy {
    converter: ExternalTool,
    rasterizer: ExternalTool,
}

impl ConversionStrategy {
    pub fn new(converter: ExternalTool, rasterizer: ExternalTool) -> Self {
        Self {
            converter,
            rasterizer,
        }
    }

    fn spawn(&self, path: &Path, request: &RenderRequest) -> PipelineResult<ProcessPair> {
        let mut producer = self
            .converter
            .command()
            .args(converter_args(path, request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.converter.spawn_error(e))?;

        let stdin = producer
            .stdout
            .take()
            .map(|stdout| -> std::io::Result<Stdio> { stdout.try_into() });
        let stdin = match stdin {
            Some(Ok(stdio)) => stdio,
            Some(Err(e)) => return Err(self.converter.spawn_error(e)),
            None => {
                return Err(self.converter.spawn_error(std::io::Error::other(
                    "converter stdout was not captured",
                )))
            }
        };

        // If the consumer cannot start, the producer is killed on drop.
        let consumer = self
            .rasterizer
            .command()
            .args(consumer_args(request))
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.rasterizer.spawn_error(e))?;

        Ok(ProcessPair { producer, consumer })
    }

    fn failure(tool: &ExternalTool, status: ExitStatus, stderr: &[u8]) -> PipelineError {
        tracing::error!(
            tool = %tool.name(),
            exit_code = ?status.code(),
            stderr = %String::from_utf8_lossy(stderr),
            "Conversion stage failed"
        );
        PipelineError::render_tool(tool.name(), status.code(), stderr)
    }
}

#[async_trait]
impl RenderStrategy for ConversionStrategy {
    #[tracing::instrument(skip(self, request), fields(
        process.executable.name = %self.converter.name(),
        page = ?request.page
    ))]
    async fn render(&self, path: &Path, request: &RenderRequest) -> PipelineResult<RenderedImage> {
        let mut pair = self.spawn(path, request)?;
        let ProcessPair { producer, consumer } = &mut pair;

        let (producer_err, consumer_out, consumer_err) = tokio::join!(
            read_all(producer.stderr.take()),
            read_all(consumer.stdout.take()),
            read_all(consumer.stderr.take()),
        );
        let (producer_status, consumer_status) = tokio::join!(producer.wait(), consumer.wait());

        let producer_status = producer_status.map_err(|e| self.converter.spawn_error(e))?;
        let consumer_status = consumer_status.map_err(|e| self.rasterizer.spawn_error(e))?;
        let producer_err = producer_err.map_err(|e| self.converter.spawn_error(e))?;
        let consumer_err = consumer_err.map_err(|e| self.rasterizer.spawn_error(e))?;
        let consumer_out = consumer_out.map_err(|e| self.rasterizer.spawn_error(e))?;

        if !producer_status.success() {
            // A rasterizer that exits early breaks the pipe; its own diagnostic is the real one.
            let consumer_caused = !consumer_status.success()
                && (killed_by_broken_pipe(producer_status) || producer_err.trim_ascii().is_empty());
            if !consumer_caused {
                return Err(Self::failure(&self.converter, producer_status, &producer_err));
            }
        }
        if !consumer_status.success() {
            return Err(Self::failure(&self.rasterizer, consumer_status, &consumer_err));
        }
        if consumer_out.is_empty() {
            return Err(PipelineError::RenderTool {
                tool: self.rasterizer.name().to_string(),
                exit_code: consumer_status.code(),
                diagnostic: "Conversion produced no image data".to_string(),
            });
        }

        tracing::debug!(size_bytes = consumer_out.len(), "Conversion render complete");
        Ok(RenderedImage::new(consumer_out, ImageFormat::Jpeg))
    }
}
