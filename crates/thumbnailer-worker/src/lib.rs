//! Thumbnailer worker
//!
//! Consumes file-processing messages, runs each through the render pipeline
//! and forwards it according to the routing table.

pub mod app;
pub mod consumer;
pub mod in_flight;
pub mod orchestrator;
pub mod scratch;
pub mod telemetry;
pub mod transport;

pub use consumer::MessageWorker;
pub use orchestrator::{MessageReport, Orchestrator, PageResult, PipelineState};
pub use scratch::ScratchFile;
pub use transport::{Envelope, JsonLinesPublisher, JsonLinesSource, MessagePublisher, MessageSource};
