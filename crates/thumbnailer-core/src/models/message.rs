use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Message type carried by every message on the file-processing bus.
pub const FILE_PROCESSING_MESSAGE: &str = "fileProcessingMessage";

/// MIME type assumed when a message does not carry one. Never renderable.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// The only MIME type processed page by page when pagination is enabled.
pub const PAGINATED_MIME_TYPE: &str = "application/pdf";

/// A file-processing message as it travels on the bus.
///
/// Fields this stage does not understand are kept in `extra` and written back
/// unchanged when the message is forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileMessage {
    pub uuid: String,
    pub library: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl FileMessage {
    pub fn new(uuid: impl Into<String>, library: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            library: library.into(),
            path: path.into(),
            mime: None,
            extra: Map::new(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// MIME type of the referenced file, normalized to the generic binary type
    /// when missing or empty.
    pub fn mime_type(&self) -> &str {
        match self.mime.as_deref().map(str::trim) {
            Some(mime) if !mime.is_empty() => mime,
            _ => DEFAULT_MIME_TYPE,
        }
    }

    pub fn is_paginated_type(&self) -> bool {
        self.mime_type() == PAGINATED_MIME_TYPE
    }
}
