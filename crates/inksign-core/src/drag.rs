//! Drag gesture tracking for placed signatures
//!
//! Input handlers translate pointer events into calls here; the store stays
//! the only place positions change.

use crate::coords::PixelPoint;
use crate::placement::{PlacementId, PlacementStore};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveDrag {
    id: PlacementId,
    // Pointer position relative to the placement's top-left at grab time
    grab_offset: PixelPoint,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged_id(&self) -> Option<PlacementId> {
        self.active.map(|drag| drag.id)
    }

    /// Grab placement `id` at `pointer` (page pixel space)
    pub fn begin(&mut self, store: &PlacementStore, id: PlacementId, pointer: PixelPoint) -> bool {
        let Some(placement) = store.get(id) else {
            return false;
        };
        let origin = placement.position();
        self.active = Some(ActiveDrag {
            id,
            grab_offset: PixelPoint::new(pointer.x - origin.x, pointer.y - origin.y),
        });
        true
    }

    pub fn update(&mut self, store: &mut PlacementStore, pointer: PixelPoint) -> bool {
        let Some(drag) = self.active else {
            return false;
        };
        let target = PixelPoint::new(pointer.x - drag.grab_offset.x, pointer.y - drag.grab_offset.y);
        if store.move_placement(drag.id, target) {
            true
        } else {
            // placement vanished mid-drag
            self.active = None;
            false
        }
    }

    /// Pointer released
    pub fn end(&mut self) {
        self.active = None;
    }

    /// Pointer left the surface or the gesture was cancelled
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
