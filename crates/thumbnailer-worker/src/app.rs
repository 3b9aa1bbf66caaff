//! Wiring from configuration to a ready orchestrator

use anyhow::Context;
use std::sync::Arc;
use thumbnailer_core::{Config, GraphConfig};
use thumbnailer_graph::{CypherGraph, DocumentGraph, MemoryGraph, Neo4jHttpStore};
use thumbnailer_processing::RenderEngine;
use thumbnailer_storage::create_storage;

use crate::orchestrator::Orchestrator;
use crate::transport::MessagePublisher;

pub fn create_graph(config: &GraphConfig) -> anyhow::Result<Arc<dyn DocumentGraph>> {
    match &config.url {
        Some(url) => {
            let credentials = config.user.clone().zip(config.password.clone());
            let store = Neo4jHttpStore::new(url, &config.database, credentials)
                .context("Failed to create graph client")?;
            tracing::info!(url = %url, database = %config.database, "Using graph database");
            Ok(Arc::new(CypherGraph::new(Arc::new(store))))
        }
        None => {
            tracing::warn!("GRAPH_URL not set, recording results in memory only");
            Ok(Arc::new(MemoryGraph::new()))
        }
    }
}

/// Build the orchestrator with every collaborator selected by configuration
pub async fn build_orchestrator(
    config: &Config,
    publisher: Arc<dyn MessagePublisher>,
) -> anyhow::Result<Orchestrator> {
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize content store")?;
    let graph = create_graph(&config.graph)?;
    let engine = RenderEngine::from_config(&config.tools, config.render.render_timeout)
        .context("Invalid render tool configuration")?;
    let routing = config.routing_table()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        storage_backend = %storage.backend_type(),
        paginate = config.render.paginate,
        generate_high_res = config.render.generate_high_res,
        timeout_ms = config.render.render_timeout.as_millis() as u64,
        "Thumbnailer configured"
    );

    Ok(Orchestrator::new(
        storage,
        graph,
        Arc::new(engine),
        publisher,
        routing,
        config.render.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_defaults_to_memory_without_url() {
        let config = GraphConfig {
            url: None,
            user: None,
            password: None,
            database: "neo4j".to_string(),
        };
        assert!(create_graph(&config).is_ok());
    }

    #[tokio::test]
    async fn builds_from_local_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let storage_path = dir.path().join("store").display().to_string();
        let config = Config::from_lookup(|key| match key {
            "LOCAL_STORAGE_PATH" => Some(storage_path.clone()),
            "DOWNSTREAM_ACTIONS" => Some(r#"{"success": "next"}"#.to_string()),
            _ => None,
        })
        .unwrap();

        let publisher = Arc::new(crate::transport::JsonLinesPublisher::new(Vec::new()));
        assert!(build_orchestrator(&config, publisher).await.is_ok());
    }
}
