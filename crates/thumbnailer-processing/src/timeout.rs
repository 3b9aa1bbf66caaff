//! Upper bound on render work

use std::future::Future;
use std::time::Duration;
use thumbnailer_core::{PipelineError, PipelineResult};

/// Bounds a render call. When the deadline passes the wrapped future is
/// dropped, which kills any child process it spawned.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    timeout: Duration,
}

impl TimeoutGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run<F, T>(&self, work: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(timeout_ms, "Render timed out, abandoning external tools");
                Err(PipelineError::RenderTimeout { timeout_ms })
            }
        }
    }
}
