//! Pending-signature state machine
//!
//! ```text
//! Idle --confirm--> AwaitingPlacement --complete--> Idle
//! ```
//!
//! Only one signature can be pending; confirming a new one replaces it.

use tracing::debug;

use crate::capture::InkCanvas;
use crate::coords::{PixelPoint, PixelSize};
use crate::error::SignError;
use crate::placement::{PlacementId, PlacementStore};
use crate::signature::SignatureImage;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlacementState {
    #[default]
    Idle,
    AwaitingPlacement { image: SignatureImage },
}

#[derive(Debug, Clone, Default)]
pub struct PlacementWorkflow {
    state: PlacementState,
}

impl PlacementWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, PlacementState::AwaitingPlacement { .. })
    }

    pub fn pending_image(&self) -> Option<&SignatureImage> {
        match &self.state {
            PlacementState::AwaitingPlacement { image } => Some(image),
            PlacementState::Idle => None,
        }
    }

    /// Render the canvas and make it the pending signature.
    ///
    /// A blank canvas is rejected and leaves the current state untouched.
    pub fn confirm_capture(&mut self, canvas: &InkCanvas) -> Result<(), SignError> {
        if canvas.is_blank() {
            debug!("Rejected blank signature");
            return Err(SignError::EmptySignature);
        }
        let image = canvas.render_png()?;
        self.confirm_image(image);
        Ok(())
    }

    /// Make `image` the pending signature, returning any image it replaced
    pub fn confirm_image(&mut self, image: SignatureImage) -> Option<SignatureImage> {
        let previous = std::mem::replace(
            &mut self.state,
            PlacementState::AwaitingPlacement { image },
        );
        match previous {
            PlacementState::AwaitingPlacement { image } => {
                debug!("Pending signature replaced");
                Some(image)
            }
            PlacementState::Idle => None,
        }
    }

    /// Place the pending signature. Returns `Ok(None)` when nothing is pending.
    ///
    /// If the store rejects the placement the signature stays pending.
    pub fn complete(
        &mut self,
        store: &mut PlacementStore,
        page: u32,
        position: PixelPoint,
        size: PixelSize,
    ) -> Result<Option<PlacementId>, SignError> {
        let Some(image) = self.pending_image().cloned() else {
            return Ok(None);
        };

        let id = store.add_placement(position, size, page, image)?;
        self.state = PlacementState::Idle;
        Ok(Some(id))
    }

    pub fn cancel(&mut self) {
        self.state = PlacementState::Idle;
    }
}
