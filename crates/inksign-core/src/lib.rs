//! Handwritten signature placement for PDF documents
//!
//! This crate captures a freehand signature, lets it be positioned on the
//! rendered pages of a PDF, and composites it into the document using lopdf.
//!
//! Placements live in page-render pixel space (origin top-left, y down).
//! At export they are projected into PDF point space (origin bottom-left,
//! y up) through the [`Viewport`] of their own page.

pub mod capture;
pub mod compose;
pub mod config;
pub mod coords;
pub mod document;
pub mod drag;
pub mod error;
pub mod placement;
pub mod projector;
pub mod session;
pub mod signature;
pub mod workflow;

pub use capture::{InkCanvas, InkColor, InkStyle};
pub use compose::compose_signed_pdf;
pub use config::SignerConfig;
pub use coords::{PageBox, PageLayout, PdfRect, PixelPoint, PixelRect, PixelSize, Viewport};
pub use document::{PageInfo, SourceDocument};
pub use drag::DragController;
pub use error::SignError;
pub use placement::{PlacementId, PlacementStore, SignaturePlacement};
pub use projector::{project_placements, ProjectedPlacement};
pub use session::SigningSession;
pub use signature::SignatureImage;
pub use workflow::{PlacementState, PlacementWorkflow};

/// Parse a size like `150x50` (pixels) into a [`PixelSize`]
pub fn parse_size(input: &str) -> Result<PixelSize, SignError> {
    let (w, h) = input
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| SignError::ConfigError(format!("Invalid size: {}", input)))?;
    let width: f64 = w
        .trim()
        .parse()
        .map_err(|_| SignError::ConfigError(format!("Invalid width: {}", w)))?;
    let height: f64 = h
        .trim()
        .parse()
        .map_err(|_| SignError::ConfigError(format!("Invalid height: {}", h)))?;

    let size = PixelSize::new(width, height);
    if !size.is_valid() {
        return Err(SignError::InvalidSize { width, height });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("150x50").unwrap(), PixelSize::new(150.0, 50.0));
        assert_eq!(parse_size(" 75.5 X 20 ").unwrap(), PixelSize::new(75.5, 20.0));
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(matches!(parse_size("150"), Err(SignError::ConfigError(_))));
        assert!(matches!(parse_size("ax5"), Err(SignError::ConfigError(_))));
        assert!(matches!(parse_size("0x5"), Err(SignError::InvalidSize { .. })));
    }
}
