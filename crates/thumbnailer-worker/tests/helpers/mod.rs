#![allow(dead_code)]

pub mod fakes;
pub mod storage;

use std::sync::Arc;
use tempfile::TempDir;
use thumbnailer_core::{FileMessage, RenderConfig, RoutingTable};
use thumbnailer_graph::MemoryGraph;
use thumbnailer_worker::Orchestrator;

use fakes::{RecordingPublisher, ScriptedRenderer};
use storage::MemoryStore;

pub const SOURCE_LIBRARY: &str = "miniofiles";
pub const DEFAULT_ROUTES: &str = r#"{"success": "next", "error": "errors"}"#;

/// Orchestrator wired to in-memory collaborators
pub struct TestPipeline {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<MemoryStore>,
    pub graph: Arc<MemoryGraph>,
    pub renderer: Arc<ScriptedRenderer>,
    pub publisher: Arc<RecordingPublisher>,
    pub scratch: TempDir,
}

impl TestPipeline {
    pub fn scratch_path(&self, id: &str) -> std::path::PathBuf {
        self.scratch.path().join(id)
    }
}

/// Builder for a test pipeline
pub struct PipelineBuilder {
    renderer: ScriptedRenderer,
    routes: String,
    paginate: bool,
    high_res: bool,
    sources: Vec<(String, &'static [u8])>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            renderer: ScriptedRenderer::new(),
            routes: DEFAULT_ROUTES.to_string(),
            paginate: false,
            high_res: false,
            sources: Vec::new(),
        }
    }

    pub fn renderer(mut self, renderer: ScriptedRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn routes(mut self, routes: &str) -> Self {
        self.routes = routes.to_string();
        self
    }

    pub fn paginate(mut self) -> Self {
        self.paginate = true;
        self
    }

    pub fn high_res(mut self) -> Self {
        self.high_res = true;
        self
    }

    pub fn source(mut self, path: &str, data: &'static [u8]) -> Self {
        self.sources.push((path.to_string(), data));
        self
    }

    pub fn build(self) -> TestPipeline {
        let scratch = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            paginate: self.paginate,
            generate_high_res: self.high_res,
            scratch_dir: scratch.path().to_path_buf(),
            ..RenderConfig::default()
        };

        let store = MemoryStore::default();
        for (path, data) in self.sources {
            store.insert(SOURCE_LIBRARY, &path, data);
        }
        let store = Arc::new(store);
        let graph = Arc::new(MemoryGraph::new());
        let renderer = Arc::new(self.renderer);
        let publisher = Arc::new(RecordingPublisher::default());
        let routing = RoutingTable::load("thumbnailer", &self.routes, None).unwrap();

        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            graph.clone(),
            renderer.clone(),
            publisher.clone(),
            routing,
            config,
        ));

        TestPipeline {
            orchestrator,
            store,
            graph,
            renderer,
            publisher,
            scratch,
        }
    }
}

/// Message for a file stored in the source library
pub fn message(id: &str, path: &str, mime: &str) -> FileMessage {
    FileMessage::new(id, SOURCE_LIBRARY, path).with_mime(mime)
}
