//! Render strategy selection by MIME type

use thumbnailer_core::{PipelineError, PipelineResult, DEFAULT_MIME_TYPE};

/// Types the rasterizer reads directly
pub const RASTER_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/bmp",
    "image/cis-cod",
    "image/gif",
    "image/ief",
    "image/jpeg",
    "image/pipeg",
    "image/svg+xml",
    "image/tiff",
    "image/x-cmu-raster",
    "image/x-cmx",
    "image/x-icon",
    "image/x-portable-anymap",
    "image/x-portable-bitmap",
    "image/x-portable-graymap",
    "image/x-portable-pixmap",
    "image/x-rgb",
    "image/x-xbitmap",
    "image/x-xpixmap",
    "image/x-xwindowdump",
];

/// Office and OpenDocument types converted to PDF before rasterizing
pub const CONVERSION_MIME_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.openxmlformats-officedocument.presentationml.template",
    "application/vnd.openxmlformats-officedocument.presentationml.slideshow",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.text-template",
    "application/vnd.oasis.opendocument.text-web",
    "application/vnd.oasis.opendocument.text-master",
    "application/vnd.oasis.opendocument.graphics",
    "application/vnd.oasis.opendocument.graphics-template",
    "application/vnd.oasis.opendocument.presentation",
    "application/vnd.oasis.opendocument.presentation-template",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.spreadsheet-template",
    "application/vnd.oasis.opendocument.chart",
    "application/vnd.oasis.opendocument.formula",
    "application/vnd.oasis.opendocument.database",
    "application/vnd.oasis.opendocument.image",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Raster,
    Conversion,
}

/// Pick the render strategy for a MIME type. Empty input is treated as
/// `application/octet-stream`, which no strategy handles.
pub fn select_strategy(mime_type: &str) -> PipelineResult<StrategyKind> {
    let mime_type = match mime_type.trim() {
        "" => DEFAULT_MIME_TYPE,
        other => other,
    };

    if RASTER_MIME_TYPES.contains(&mime_type) {
        Ok(StrategyKind::Raster)
    } else if CONVERSION_MIME_TYPES.contains(&mime_type) {
        Ok(StrategyKind::Conversion)
    } else {
        Err(PipelineError::UnsupportedMimeType(mime_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_and_images_are_rasterized() {
        assert_eq!(select_strategy("application/pdf").unwrap(), StrategyKind::Raster);
        assert_eq!(select_strategy("image/png").unwrap(), StrategyKind::Raster);
        assert_eq!(select_strategy("image/x-icon").unwrap(), StrategyKind::Raster);
    }

    #[test]
    fn office_documents_are_converted() {
        assert_eq!(
            select_strategy("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
                .unwrap(),
            StrategyKind::Conversion
        );
        assert_eq!(
            select_strategy("application/vnd.oasis.opendocument.spreadsheet").unwrap(),
            StrategyKind::Conversion
        );
    }

    #[test]
    fn unknown_and_empty_types_are_unsupported() {
        assert!(matches!(
            select_strategy("application/octet-stream"),
            Err(PipelineError::UnsupportedMimeType(_))
        ));
        match select_strategy("") {
            Err(PipelineError::UnsupportedMimeType(mime)) => {
                assert_eq!(mime, "application/octet-stream")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn sets_are_disjoint() {
        for mime in RASTER_MIME_TYPES {
            assert!(!CONVERSION_MIME_TYPES.contains(mime), "{} in both sets", mime);
        }
    }
}
