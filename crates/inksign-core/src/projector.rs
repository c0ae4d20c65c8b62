//! Export projection from pixel-space placements to PDF point space

use serde::Serialize;

use crate::coords::{PageLayout, PdfRect};
use crate::error::SignError;
use crate::placement::{PlacementId, SignaturePlacement};
use crate::signature::SignatureImage;

/// A placement resolved to the rectangle it occupies on its page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPlacement {
    pub id: PlacementId,
    pub page: u32,
    pub rect: PdfRect,
    #[serde(skip)]
    pub image: SignatureImage,
}

/// Project every placement through the viewport of its own page.
///
/// Output order follows input order. A placement on a page the layout does
/// not contain is an error.
pub fn project_placements(
    placements: &[SignaturePlacement],
    layout: &PageLayout,
) -> Result<Vec<ProjectedPlacement>, SignError> {
    placements
        .iter()
        .map(|placement| {
            let viewport = layout
                .viewport(placement.page())
                .ok_or(SignError::PageOutOfRange {
                    page: placement.page(),
                    page_count: layout.page_count(),
                })?;
            Ok(ProjectedPlacement {
                id: placement.id(),
                page: placement.page(),
                rect: viewport.rect_to_points(&placement.pixel_rect()),
                image: placement.image().clone(),
            })
        })
        .collect()
}
