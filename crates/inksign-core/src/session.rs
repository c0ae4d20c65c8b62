//! Signing session
//!
//! Owns everything one signing pass needs: the loaded document, its
//! placements, the pending signature, the active drag and the page being
//! viewed. Hosts drive it from input events and read state back for display.

use tracing::{info, warn};

use crate::capture::InkCanvas;
use crate::compose::compose_signed_pdf;
use crate::config::SignerConfig;
use crate::coords::{PageLayout, PixelPoint, PixelSize, Viewport};
use crate::document::SourceDocument;
use crate::drag::DragController;
use crate::error::SignError;
use crate::placement::{PlacementId, PlacementStore, SignaturePlacement};
use crate::projector::project_placements;
use crate::signature::SignatureImage;
use crate::workflow::PlacementWorkflow;

#[derive(Debug)]
struct LoadedDocument {
    name: String,
    source: SourceDocument,
}

#[derive(Debug)]
pub struct SigningSession {
    config: SignerConfig,
    document: Option<LoadedDocument>,
    store: PlacementStore,
    workflow: PlacementWorkflow,
    drag: DragController,
    current_page: u32,
}

impl SigningSession {
    /// Start with no document loaded
    ///
    /// # Panics
    ///
    /// Panics if the configured scale is not positive and finite. Configs
    /// from [`SignerConfig::from_str`] are already validated.
    pub fn new(config: SignerConfig) -> Self {
        let store = PlacementStore::new(PageLayout::empty(config.viewport.scale));
        Self {
            config,
            document: None,
            store,
            workflow: PlacementWorkflow::new(),
            drag: DragController::new(),
            current_page: 0,
        }
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Decode and activate a document.
    ///
    /// On failure the previously loaded document and its placements stay
    /// active. On success placements are dropped and page 1 is shown.
    pub fn load_document(&mut self, name: &str, bytes: Vec<u8>) -> Result<u32, SignError> {
        let source = match SourceDocument::load(bytes) {
            Ok(source) => source,
            Err(e) => {
                warn!(name, error = %e, "Document rejected");
                return Err(e);
            }
        };

        let page_count = source.page_count();
        self.drag.cancel();
        self.store.reset_layout(source.layout(self.store.layout().scale()));
        self.document = Some(LoadedDocument {
            name: name.to_string(),
            source,
        });
        self.current_page = 1;

        info!(name, page_count, "Document loaded");
        Ok(page_count)
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document.as_ref().map(|doc| doc.name.as_str())
    }

    pub fn document(&self) -> Option<&SourceDocument> {
        self.document.as_ref().map(|doc| &doc.source)
    }

    /// Drop the document, placements, pending signature and drag
    pub fn reset(&mut self) {
        self.drag.cancel();
        self.workflow.cancel();
        self.store
            .reset_layout(PageLayout::empty(self.store.layout().scale()));
        self.document = None;
        self.current_page = 0;
        info!("Session reset");
    }

    /// 1-based; 0 while no document is loaded
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.store.page_count()
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    /// Show `page`; out-of-range pages leave the view unchanged
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if !self.store.layout().contains_page(page) {
            return false;
        }
        if page != self.current_page {
            self.drag.cancel();
            self.current_page = page;
        }
        true
    }

    /// Viewport of the page being shown
    pub fn viewport(&self) -> Option<Viewport> {
        self.store.viewport(self.current_page)
    }

    pub fn scale(&self) -> f64 {
        self.store.layout().scale()
    }

    /// Re-render at a new scale; placements keep their place on the page.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is zero, negative, or not finite.
    pub fn set_scale(&mut self, scale: f64) {
        self.store.set_scale(scale);
    }

    /// Rasterize `canvas` and hold it as the pending signature
    pub fn confirm_signature(&mut self, canvas: &InkCanvas) -> Result<(), SignError> {
        self.workflow.confirm_capture(canvas)
    }

    /// Hold an already encoded image as the pending signature
    pub fn confirm_signature_image(&mut self, image: SignatureImage) {
        self.workflow.confirm_image(image);
    }

    pub fn cancel_signature(&mut self) {
        self.workflow.cancel();
    }

    pub fn is_awaiting_placement(&self) -> bool {
        self.workflow.is_awaiting()
    }

    /// Place the pending signature on the current page at the configured
    /// default size. `Ok(None)` when no signature is pending.
    ///
    /// Pages with a non-zero `/Rotate` are refused with `RotatedPage`.
    pub fn place_pending(&mut self, position: PixelPoint) -> Result<Option<PlacementId>, SignError> {
        self.place_pending_sized(position, self.config.placement_size())
    }

    /// Like [`place_pending`](Self::place_pending) with an explicit pixel size
    pub fn place_pending_sized(
        &mut self,
        position: PixelPoint,
        size: PixelSize,
    ) -> Result<Option<PlacementId>, SignError> {
        let document = self.document.as_ref().ok_or(SignError::NoDocument)?;
        if let Some(page) = document.source.page(self.current_page) {
            if page.rotation != 0 {
                return Err(SignError::RotatedPage {
                    page: page.page_num,
                    rotation: page.rotation,
                });
            }
        }
        self.workflow
            .complete(&mut self.store, self.current_page, position, size)
    }

    pub fn placements(&self) -> &[SignaturePlacement] {
        self.store.placements()
    }

    pub fn placements_on_current_page(&self) -> Vec<&SignaturePlacement> {
        self.store.placements_for_page(self.current_page)
    }

    pub fn remove_placement(&mut self, id: PlacementId) -> bool {
        if self.drag.dragged_id() == Some(id) {
            self.drag.cancel();
        }
        self.store.remove_placement(id)
    }

    pub fn clear_placements(&mut self) {
        self.drag.cancel();
        self.store.clear_all();
    }

    pub fn begin_drag(&mut self, id: PlacementId, pointer: PixelPoint) -> bool {
        self.drag.begin(&self.store, id, pointer)
    }

    pub fn drag_to(&mut self, pointer: PixelPoint) -> bool {
        self.drag.update(&mut self.store, pointer)
    }

    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Download is offered once something has been placed
    pub fn can_export(&self) -> bool {
        self.document.is_some() && !self.store.is_empty()
    }

    /// Composite every placement into a new PDF.
    ///
    /// The session is left untouched on failure so the user can retry.
    pub fn export(&self) -> Result<Vec<u8>, SignError> {
        let document = self.document.as_ref().ok_or(SignError::NoDocument)?;
        let projected = project_placements(self.store.placements(), self.store.layout())?;

        match compose_signed_pdf(document.source.bytes(), &projected) {
            Ok(bytes) => {
                info!(
                    name = %document.name,
                    placements = projected.len(),
                    bytes = bytes.len(),
                    "Export complete"
                );
                Ok(bytes)
            }
            Err(e) => {
                warn!(name = %document.name, error = %e, "Export failed");
                Err(e)
            }
        }
    }

    /// Notify `listener` with the page index whenever placements change
    pub fn subscribe(&mut self, listener: impl FnMut(u32) + 'static) {
        self.store.subscribe(listener);
    }
}
