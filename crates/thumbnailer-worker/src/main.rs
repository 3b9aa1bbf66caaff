use std::sync::Arc;
use thumbnailer_core::Config;
use thumbnailer_worker::app::build_orchestrator;
use thumbnailer_worker::telemetry::init_telemetry;
use thumbnailer_worker::{JsonLinesPublisher, JsonLinesSource, MessageWorker};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;
    init_telemetry(&config.log_format)?;

    let publisher = Arc::new(JsonLinesPublisher::stdout());
    let orchestrator = Arc::new(build_orchestrator(&config, publisher).await?);

    let worker = MessageWorker::new(orchestrator, config.prefetch);
    worker
        .run(JsonLinesSource::stdin(), shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
