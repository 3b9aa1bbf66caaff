use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Whether a render produces a small preview or a page image meant for OCR and annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    Standard,
    HighResolution,
}

/// Parameters of one render call. Built fresh per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub mime_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// One-indexed page number; `None` means the first page.
    pub page: Option<u32>,
    /// Rasterization density hint (dots per inch)
    pub density: Option<u32>,
    pub kind: RenderKind,
}

impl RenderRequest {
    pub fn thumbnail(mime_type: impl Into<String>, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            mime_type: mime_type.into(),
            width,
            height,
            page: None,
            density: None,
            kind: RenderKind::Standard,
        }
    }

    pub fn high_resolution(mime_type: impl Into<String>, width: u32, density: u32) -> Self {
        Self {
            mime_type: mime_type.into(),
            width: Some(width),
            height: None,
            page: None,
            density: Some(density),
            kind: RenderKind::HighResolution,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Encoded image formats the external renderers are asked to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// Output spec understood by ImageMagick (`png:-` writes PNG to stdout)
    pub fn stdout_spec(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png:-",
            ImageFormat::Jpeg => "jpeg:-",
        }
    }
}

/// Image bytes between render completion and upload
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Bytes,
    pub format: ImageFormat,
}

impl RenderedImage {
    pub fn new(bytes: impl Into<Bytes>, format: ImageFormat) -> Self {
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
