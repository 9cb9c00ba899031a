//! Picking and box selection.

use std::collections::HashSet;

use kurbo::{Point, Rect};

use crate::elements::ElementId;
use crate::geometry::rect_from_points;
use crate::store::Document;

/// Pick tolerance around element geometry, in screen pixels.
pub const PICK_TOLERANCE: f64 = 5.0;

/// A box selection only selects once it reaches this size on either axis.
pub const BOX_SELECT_MIN: f64 = 5.0;

/// Frontmost selectable element under a world point.
///
/// Laser traces and elements locked by a remote peer are skipped.
pub fn pick(
    doc: &Document,
    world: Point,
    tolerance: f64,
    locked: &HashSet<ElementId>,
) -> Option<ElementId> {
    doc.elements_at_point(world, tolerance)
        .into_iter()
        .find(|id| is_selectable(doc, id, locked))
}

/// Whether the local viewer may select `id`.
pub fn is_selectable(doc: &Document, id: &str, locked: &HashSet<ElementId>) -> bool {
    doc.get(id).is_some_and(|e| !e.is_laser()) && !locked.contains(id)
}

/// Rubber-band selection in progress.
#[derive(Debug, Clone)]
pub struct BoxSelect {
    pub start: Point,
    pub current: Point,
    /// Selection held before the box started (kept when shift is held).
    pub base: Vec<ElementId>,
}

impl BoxSelect {
    pub fn new(start: Point, base: Vec<ElementId>) -> Self {
        Self {
            start,
            current: start,
            base,
        }
    }

    pub fn rect(&self) -> Rect {
        rect_from_points(self.start, self.current)
    }

    /// Large enough to select anything.
    pub fn is_active(&self) -> bool {
        let r = self.rect();
        r.width() >= BOX_SELECT_MIN || r.height() >= BOX_SELECT_MIN
    }

    /// Base selection plus every eligible element fully inside the box.
    pub fn selection(&self, doc: &Document, locked: &HashSet<ElementId>) -> Vec<ElementId> {
        let mut ids = self.base.clone();
        if self.is_active() {
            ids.extend(
                doc.elements_in_rect(self.rect())
                    .into_iter()
                    .filter(|id| is_selectable(doc, id, locked) && !self.base.contains(id)),
            );
        }
        ids
    }
}
