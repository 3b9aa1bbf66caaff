//! Error types module
//!
//! Every failure a message can hit while being processed is one of the
//! `PipelineError` variants. The orchestrator folds all of them into the
//! `error` routing outcome; the variant survives only for diagnostics.

/// Result alias for pipeline stages
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to fetch {library}/{path}: {reason}")]
    Fetch {
        library: String,
        path: String,
        reason: String,
    },

    #[error("Not a MIME type we can generate a thumbnail for: {0}")]
    UnsupportedMimeType(String),

    /// An external tool exited non-zero. Displays exactly the tool's diagnostic output.
    #[error("{diagnostic}")]
    RenderTool {
        tool: String,
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error("Render timed out after {timeout_ms} ms")]
    RenderTimeout { timeout_ms: u64 },

    #[error("Failed to upload artifact {reference}: {reason}")]
    Upload { reference: String, reason: String },

    #[error("Graph write failed: {0}")]
    GraphWrite(String),

    #[error("Could not determine page count: {0}")]
    PageCount(String),
}

impl PipelineError {
    /// Machine-readable error code used as a structured log field
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::Fetch { .. } => "FETCH_FAILURE",
            PipelineError::UnsupportedMimeType(_) => "UNSUPPORTED_MIME_TYPE",
            PipelineError::RenderTool { .. } => "RENDER_TOOL_FAILURE",
            PipelineError::RenderTimeout { .. } => "RENDER_TIMEOUT",
            PipelineError::Upload { .. } => "UPLOAD_FAILURE",
            PipelineError::GraphWrite(_) => "GRAPH_WRITE_FAILURE",
            PipelineError::PageCount(_) => "PAGE_COUNT_FAILURE",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::RenderTimeout { .. })
    }

    pub fn render_tool(tool: impl Into<String>, exit_code: Option<i32>, stderr: &[u8]) -> Self {
        PipelineError::RenderTool {
            tool: tool.into(),
            exit_code,
            diagnostic: String::from_utf8_lossy(stderr).into_owned(),
        }
    }
}
