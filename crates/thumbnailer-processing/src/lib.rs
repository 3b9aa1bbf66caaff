//! Thumbnailer Processing Library
//!
//! Turns a local document into image bytes by driving external tools:
//! a rasterizer (ImageMagick `convert`), a document converter (`unoconv`)
//! piped into the rasterizer, and a PDF inspector (`pdfinfo`) for page counts.
//!
//! All renders go through `RenderEngine`, which picks a strategy from the
//! MIME type and bounds every call with the configured timeout.

pub mod conversion;
pub mod engine;
pub mod page_count;
pub mod raster;
pub mod selector;
pub mod timeout;
pub mod tool;
pub mod traits;

pub use conversion::ConversionStrategy;
pub use engine::RenderEngine;
pub use page_count::PageCounter;
pub use raster::RasterStrategy;
pub use selector::{select_strategy, StrategyKind};
pub use timeout::TimeoutGuard;
pub use tool::ExternalTool;
pub use traits::{PageRenderer, RenderStrategy};
