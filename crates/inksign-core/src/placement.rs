//! Placement store for signature images positioned on document pages
//!
//! All positions and sizes are in page-render pixel space at the layout's
//! current scale. Every mutation goes through the store so the clamping
//! invariant holds for every record at all times.

use std::fmt;

use tracing::debug;

use crate::coords::{PageLayout, PixelPoint, PixelRect, PixelSize, Viewport};
use crate::error::SignError;
use crate::signature::SignatureImage;

pub type PlacementId = u64;

/// A positioned signature image instance on one page
#[derive(Debug, Clone, PartialEq)]
pub struct SignaturePlacement {
    id: PlacementId,
    page: u32,
    position: PixelPoint,
    size: PixelSize,
    image: SignatureImage,
}

impl SignaturePlacement {
    pub fn id(&self) -> PlacementId {
        self.id
    }

    /// 1-based page index
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Top-left corner in pixel space
    pub fn position(&self) -> PixelPoint {
        self.position
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn image(&self) -> &SignatureImage {
        &self.image
    }

    pub fn pixel_rect(&self) -> PixelRect {
        PixelRect::from_parts(self.position, self.size)
    }
}

type PlacementListener = Box<dyn FnMut(u32)>;

/// Ordered collection of placements plus the page geometry they live on
pub struct PlacementStore {
    next_id: PlacementId,
    placements: Vec<SignaturePlacement>,
    layout: PageLayout,
    listeners: Vec<PlacementListener>,
}

impl PlacementStore {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            next_id: 0,
            placements: Vec::new(),
            layout,
            listeners: Vec::new(),
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn page_count(&self) -> u32 {
        self.layout.page_count()
    }

    pub fn viewport(&self, page: u32) -> Option<Viewport> {
        self.layout.viewport(page)
    }

    /// Register a callback invoked with the page index after any change
    pub fn subscribe(&mut self, listener: impl FnMut(u32) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Clamp `position` onto `page`, append a new record and return its id
    pub fn add_placement(
        &mut self,
        position: PixelPoint,
        size: PixelSize,
        page: u32,
        image: SignatureImage,
    ) -> Result<PlacementId, SignError> {
        let viewport = self
            .layout
            .viewport(page)
            .ok_or(SignError::PageOutOfRange {
                page,
                page_count: self.layout.page_count(),
            })?;
        if !size.is_valid() {
            return Err(SignError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }

        let id = self.next_id;
        self.next_id += 1;

        let position = viewport.clamp_position(position, size);
        debug!(id, page, x = position.x, y = position.y, "Placement added");
        self.placements.push(SignaturePlacement {
            id,
            page,
            position,
            size,
            image,
        });
        self.notify(page);
        Ok(id)
    }

    /// Move a placement, clamped to its page. Unknown ids are ignored.
    pub fn move_placement(&mut self, id: PlacementId, position: PixelPoint) -> bool {
        let Some(placement) = self.placements.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        let Some(viewport) = self.layout.viewport(placement.page) else {
            return false;
        };

        placement.position = viewport.clamp_position(position, placement.size);
        let page = placement.page;
        debug!(id, page, x = placement.position.x, y = placement.position.y, "Placement moved");
        self.notify(page);
        true
    }

    /// Delete a placement. Removing an unknown id is a no-op.
    pub fn remove_placement(&mut self, id: PlacementId) -> bool {
        if let Some(pos) = self.placements.iter().position(|p| p.id == id) {
            let removed = self.placements.remove(pos);
            debug!(id, page = removed.page, "Placement removed");
            self.notify(removed.page);
            true
        } else {
            false
        }
    }

    /// Placements on `page` in insertion order
    pub fn placements_for_page(&self, page: u32) -> Vec<&SignaturePlacement> {
        self.placements.iter().filter(|p| p.page == page).collect()
    }

    pub fn clear_all(&mut self) {
        let mut pages: Vec<u32> = self.placements.iter().map(|p| p.page).collect();
        pages.sort_unstable();
        pages.dedup();

        self.placements.clear();
        for page in pages {
            self.notify(page);
        }
    }

    /// Swap in the geometry of a new document; existing placements are dropped
    pub fn reset_layout(&mut self, layout: PageLayout) {
        self.clear_all();
        self.layout = layout;
    }

    /// Change the render scale, rescaling every placement so its place on
    /// the page (in points) is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is zero, negative, or not finite.
    pub fn set_scale(&mut self, scale: f64) {
        let ratio = scale / self.layout.scale();
        self.layout.set_scale(scale);
        if ratio == 1.0 {
            return;
        }

        for placement in &mut self.placements {
            placement.size = PixelSize::new(
                placement.size.width * ratio,
                placement.size.height * ratio,
            );
            let scaled = PixelPoint::new(placement.position.x * ratio, placement.position.y * ratio);
            if let Some(viewport) = self.layout.viewport(placement.page) {
                placement.position = viewport.clamp_position(scaled, placement.size);
            }
        }
        debug!(scale, count = self.placements.len(), "Placements rescaled");
    }

    pub fn get(&self, id: PlacementId) -> Option<&SignaturePlacement> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn placements(&self) -> &[SignaturePlacement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    fn notify(&mut self, page: u32) {
        for listener in &mut self.listeners {
            listener(page);
        }
    }
}

impl fmt::Debug for PlacementStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementStore")
            .field("next_id", &self.next_id)
            .field("placements", &self.placements)
            .field("layout", &self.layout)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::coords::PageBox;
    use proptest::prelude::*;

    fn within_bounds(store: &PlacementStore) -> bool {
        store.placements().iter().all(|p| {
            let vp = store.viewport(p.page()).unwrap();
            let pos = p.position();
            let max_x = (vp.pixel_width() - p.size().width).max(0.0);
            let max_y = (vp.pixel_height() - p.size().height).max(0.0);
            pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= max_x && pos.y <= max_y
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn add_and_move_keep_bounds(
            scale in 0.5f64..3.0,
            moves in prop::collection::vec(
                (1u32..=2, -2000.0f64..4000.0, -2000.0f64..4000.0),
                1..20,
            ),
        ) {
            let layout = PageLayout::new(
                vec![PageBox::new(612.0, 792.0), PageBox::new(200.0, 100.0)],
                scale,
            );
            let mut store = PlacementStore::new(layout);
            let image = SignatureImage::from_bytes(vec![1]);
            let mut ids = Vec::new();

            for (page, x, y) in moves {
                let id = store
                    .add_placement(PixelPoint::new(x, y), PixelSize::new(150.0, 50.0), page, image.clone())
                    .unwrap();
                ids.push(id);
                prop_assert!(within_bounds(&store));

                store.move_placement(ids[ids.len() / 2], PixelPoint::new(y, x));
                prop_assert!(within_bounds(&store));
            }
        }

        #[test]
        fn page_filter_is_exact_subset(pages in prop::collection::vec(1u32..=4, 0..30)) {
            let layout = PageLayout::new(vec![PageBox::new(612.0, 792.0); 4], 1.0);
            let mut store = PlacementStore::new(layout);
            let image = SignatureImage::from_bytes(vec![1]);
            let ids: Vec<_> = pages
                .iter()
                .map(|&page| {
                    store
                        .add_placement(PixelPoint::default(), PixelSize::new(10.0, 10.0), page, image.clone())
                        .unwrap()
                })
                .collect();

            for page in 1..=4 {
                let expected: Vec<_> = ids
                    .iter()
                    .zip(&pages)
                    .filter(|(_, &p)| p == page)
                    .map(|(id, _)| *id)
                    .collect();
                let actual: Vec<_> = store.placements_for_page(page).iter().map(|p| p.id()).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
