use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// What a stored image represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Thumbnail of the whole document
    Thumbnail,
    /// Thumbnail of a single page
    PageThumbnail,
    /// High-resolution raster of a single page
    PageImage,
}

impl ArtifactKind {
    pub fn is_per_page(&self) -> bool {
        !matches!(self, ArtifactKind::Thumbnail)
    }
}

/// Location of an artifact in the content store.
///
/// Displayed as `library/path`, which is also the value recorded on graph nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub library: String,
    pub path: String,
}

impl ArtifactReference {
    pub fn new(library: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            path: path.into(),
        }
    }
}

impl Display for ArtifactReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.library, self.path)
    }
}
