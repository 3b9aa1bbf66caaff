//! Consumer loop: bounded concurrency over inbound messages.
//!
//! Shutdown stops pulling new messages and waits for in-flight ones to finish.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::orchestrator::Orchestrator;
use crate::transport::MessageSource;

pub struct MessageWorker {
    orchestrator: Arc<Orchestrator>,
    prefetch: usize,
}

impl MessageWorker {
    pub fn new(orchestrator: Arc<Orchestrator>, prefetch: usize) -> Self {
        Self {
            orchestrator,
            prefetch: prefetch.max(1),
        }
    }

    /// Consume until the source is exhausted or `shutdown` resolves.
    /// Returns the number of messages dispatched.
    pub async fn run<S, F>(&self, mut source: S, shutdown: F) -> anyhow::Result<u64>
    where
        S: MessageSource,
        F: Future<Output = ()>,
    {
        tracing::info!(prefetch = self.prefetch, "Message worker started");

        let semaphore = Arc::new(Semaphore::new(self.prefetch));
        let mut dispatched = 0u64;
        let mut result = Ok(());
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Message worker shutting down");
                    break;
                }
                permit = semaphore.clone().acquire_owned() => permit?,
            };

            let next = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Message worker shutting down");
                    break;
                }
                next = source.next_message() => next,
            };

            match next {
                Ok(Some(message)) => {
                    dispatched += 1;
                    let orchestrator = self.orchestrator.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        orchestrator.handle_message(&message).await;
                    });
                }
                Ok(None) => {
                    tracing::info!("Message source exhausted");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Message source failed");
                    result = Err(e);
                    break;
                }
            }
        }

        // Every permit back means every in-flight message has been routed.
        let _drained = semaphore.acquire_many(self.prefetch as u32).await?;
        tracing::info!(dispatched, "Message worker stopped");

        result.map(|()| dispatched)
    }
}
