//! Artifact path derivation shared by every backend.
//!
//! Paths depend only on the prefix, the owning record's identifier, the page
//! number and the artifact kind, so writing the same artifact twice lands on
//! the same object.

use crate::{StorageError, StorageResult};
use thumbnailer_core::{ArtifactKind, ArtifactReference, ImageFormat};

/// Build the content-store reference for an artifact.
///
/// `page` is required for per-page kinds and ignored for the document thumbnail.
pub fn artifact_reference(
    library: &str,
    prefix: &str,
    id: &str,
    kind: ArtifactKind,
    page: Option<u32>,
    format: ImageFormat,
) -> StorageResult<ArtifactReference> {
    validate_segment(id)?;
    let prefix = prefix.trim_matches('/');
    if prefix.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Artifact prefix must not contain '..': {}",
            prefix
        )));
    }

    let base = if prefix.is_empty() {
        id.to_string()
    } else {
        format!("{}/{}", prefix, id)
    };
    let ext = format.extension();

    let path = match (kind, page) {
        (ArtifactKind::Thumbnail, _) => format!("{}/thumbnail.{}", base, ext),
        (ArtifactKind::PageThumbnail, Some(page)) => {
            format!("{}/pages/{}/thumbnail.{}", base, page, ext)
        }
        (ArtifactKind::PageImage, Some(page)) => format!("{}/pages/{}/image.{}", base, page, ext),
        (kind, None) => {
            return Err(StorageError::InvalidKey(format!(
                "{:?} artifact requires a page number",
                kind
            )))
        }
    };

    Ok(ArtifactReference::new(library, path))
}

fn validate_segment(id: &str) -> StorageResult<()> {
    if id.is_empty() || id.contains('/') || id.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Record identifier is not a valid path segment: '{}'",
            id
        )));
    }
    Ok(())
}
