//! Thumbnailer Graph Library
//!
//! Records rendered artifacts on the linked-record graph: the document's
//! thumbnail, per-page records with their thumbnails and page images, and
//! thumbnail propagation to linked records that have none.
//!
//! `DocumentGraph` is the seam the pipeline uses. `CypherGraph` implements it
//! over any `GraphStore` (the Neo4j HTTP client in production); `MemoryGraph`
//! keeps everything in process for development and tests.

pub mod error;
pub mod memory;
pub mod query;
pub mod recorder;
pub mod store;

pub use error::{GraphError, GraphResult};
pub use memory::MemoryGraph;
pub use query::GraphQuery;
pub use recorder::{CypherGraph, DocumentGraph};
pub use store::{GraphRow, GraphStore, Neo4jHttpStore};
