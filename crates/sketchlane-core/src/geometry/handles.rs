//! Selection frame handles and cursor derivation.
//!
//! Handles are positioned on the unrotated frame. Picking maps the pointer
//! into the frame's local space first, so a rotated selection is tested the
//! same way as an axis-aligned one.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::{normalize_degrees, point_to_segment_dist, rect_contains_point, rotate_point};
use super::bounds::{combined_bounds, element_bounds};
use crate::elements::Element;

/// Size of a handle square in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;

/// Pick tolerance around a handle center in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Pick tolerance for the frame edges in screen pixels.
pub const EDGE_HIT_TOLERANCE: f64 = 5.0;

/// Distance of the rotate handle above the frame in screen pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

/// One of the eight resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeHandle {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NorthWest,
        ResizeHandle::NorthEast,
        ResizeHandle::SouthEast,
        ResizeHandle::SouthWest,
        ResizeHandle::North,
        ResizeHandle::East,
        ResizeHandle::South,
        ResizeHandle::West,
    ];

    /// Clockwise from east, in 45° steps.
    const OCTANTS: [ResizeHandle; 8] = [
        ResizeHandle::East,
        ResizeHandle::SouthEast,
        ResizeHandle::South,
        ResizeHandle::SouthWest,
        ResizeHandle::West,
        ResizeHandle::NorthWest,
        ResizeHandle::North,
        ResizeHandle::NorthEast,
    ];

    pub fn opposite(self) -> Self {
        match self {
            ResizeHandle::North => ResizeHandle::South,
            ResizeHandle::NorthEast => ResizeHandle::SouthWest,
            ResizeHandle::East => ResizeHandle::West,
            ResizeHandle::SouthEast => ResizeHandle::NorthWest,
            ResizeHandle::South => ResizeHandle::North,
            ResizeHandle::SouthWest => ResizeHandle::NorthEast,
            ResizeHandle::West => ResizeHandle::East,
            ResizeHandle::NorthWest => ResizeHandle::SouthEast,
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthEast
                | ResizeHandle::SouthEast
                | ResizeHandle::SouthWest
                | ResizeHandle::NorthWest
        )
    }

    /// Outward direction of the handle, each component in {-1, 0, 1}.
    pub fn direction(self) -> Vec2 {
        match self {
            ResizeHandle::North => Vec2::new(0.0, -1.0),
            ResizeHandle::NorthEast => Vec2::new(1.0, -1.0),
            ResizeHandle::East => Vec2::new(1.0, 0.0),
            ResizeHandle::SouthEast => Vec2::new(1.0, 1.0),
            ResizeHandle::South => Vec2::new(0.0, 1.0),
            ResizeHandle::SouthWest => Vec2::new(-1.0, 1.0),
            ResizeHandle::West => Vec2::new(-1.0, 0.0),
            ResizeHandle::NorthWest => Vec2::new(-1.0, -1.0),
        }
    }

    /// Handle position on an unrotated box.
    pub fn position_on(self, rect: Rect) -> Point {
        let c = rect.center();
        let d = self.direction();
        Point::new(
            c.x + d.x * rect.width() / 2.0,
            c.y + d.y * rect.height() / 2.0,
        )
    }

    /// The handle that appears in this handle's place once the frame is
    /// rotated by `degrees`.
    pub fn visual(self, degrees: f64) -> Self {
        let d = self.direction();
        let angle = normalize_degrees(d.y.atan2(d.x).to_degrees() + degrees);
        let octant = ((angle / 45.0).round() as usize) % 8;
        Self::OCTANTS[octant]
    }

    /// Cursor for an unrotated handle.
    pub fn cursor(self) -> CursorKind {
        match self {
            ResizeHandle::North | ResizeHandle::South => CursorKind::NsResize,
            ResizeHandle::East | ResizeHandle::West => CursorKind::EwResize,
            ResizeHandle::NorthEast | ResizeHandle::SouthWest => CursorKind::NeswResize,
            ResizeHandle::NorthWest | ResizeHandle::SouthEast => CursorKind::NwseResize,
        }
    }
}

/// Pointer cursor requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorKind {
    #[default]
    Default,
    Pointer,
    Move,
    Crosshair,
    Text,
    Grab,
    Grabbing,
    NsResize,
    EwResize,
    NeswResize,
    NwseResize,
    Rotate,
    NotAllowed,
}

/// What a pick on the selection frame landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHit {
    Rotate,
    Resize(ResizeHandle),
}

/// The box drawn around the current selection.
///
/// `rect` is unrotated; `rotation` (degrees) turns it about its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionFrame {
    pub rect: Rect,
    pub rotation: f64,
}

impl SelectionFrame {
    pub fn new(rect: Rect, rotation: f64) -> Self {
        Self { rect, rotation }
    }

    /// Frame around a selection. A single element keeps its own rotation;
    /// several elements share an axis-aligned box.
    pub fn for_elements(elements: &[&Element]) -> Option<Self> {
        match elements {
            [] => None,
            [single] => Some(Self::new(element_bounds(single), single.rotation)),
            many => combined_bounds(many.iter().copied()).map(|r| Self::new(r, 0.0)),
        }
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn to_local(&self, world: Point) -> Point {
        rotate_point(world, self.center(), -self.rotation)
    }

    pub fn to_world(&self, local: Point) -> Point {
        rotate_point(local, self.center(), self.rotation)
    }

    pub fn handle_position(&self, handle: ResizeHandle) -> Point {
        self.to_world(handle.position_on(self.rect))
    }

    pub fn rotate_handle_position(&self, zoom: f64) -> Point {
        let local = Point::new(
            self.rect.center().x,
            self.rect.y0 - ROTATE_HANDLE_OFFSET / zoom,
        );
        self.to_world(local)
    }

    /// Whether a world point lies inside the rotated frame.
    pub fn contains(&self, world: Point) -> bool {
        rect_contains_point(self.rect, self.to_local(world))
    }

    /// Pick a resize handle or the frame edge.
    pub fn hit_resize(&self, world: Point, zoom: f64) -> Option<ResizeHandle> {
        let local = self.to_local(world);
        let handle = self.handle_at(local, zoom);
        if handle.is_some() {
            return handle;
        }

        let edge_tolerance = EDGE_HIT_TOLERANCE / zoom;
        let r = self.rect;
        let edges = [
            (ResizeHandle::North, Point::new(r.x0, r.y0), Point::new(r.x1, r.y0)),
            (ResizeHandle::East, Point::new(r.x1, r.y0), Point::new(r.x1, r.y1)),
            (ResizeHandle::South, Point::new(r.x0, r.y1), Point::new(r.x1, r.y1)),
            (ResizeHandle::West, Point::new(r.x0, r.y0), Point::new(r.x0, r.y1)),
        ];
        edges
            .into_iter()
            .find(|(_, a, b)| point_to_segment_dist(local, *a, *b) <= edge_tolerance)
            .map(|(h, _, _)| h)
    }

    fn handle_at(&self, local: Point, zoom: f64) -> Option<ResizeHandle> {
        let tolerance = HANDLE_HIT_TOLERANCE / zoom;
        ResizeHandle::ALL.into_iter().find(|h| {
            let p = h.position_on(self.rect);
            (local.x - p.x).abs() <= tolerance && (local.y - p.y).abs() <= tolerance
        })
    }

    pub fn hit_rotate(&self, world: Point, zoom: f64) -> bool {
        let p = self.rotate_handle_position(zoom);
        (world - p).hypot() <= HANDLE_HIT_TOLERANCE / zoom
    }

    /// Rotate handle first, then resize handles and edges.
    pub fn hit(&self, world: Point, zoom: f64, allow_rotate: bool) -> Option<FrameHit> {
        if allow_rotate && self.hit_rotate(world, zoom) {
            return Some(FrameHit::Rotate);
        }
        self.hit_resize(world, zoom).map(FrameHit::Resize)
    }

    /// Like [`SelectionFrame::hit`] but only the handle squares count, not
    /// the edges between them. A flat frame has no resize handles.
    pub fn hit_handles(&self, world: Point, zoom: f64, allow_rotate: bool) -> Option<FrameHit> {
        if allow_rotate && self.hit_rotate(world, zoom) {
            return Some(FrameHit::Rotate);
        }
        if self.rect.width() <= 0.0 || self.rect.height() <= 0.0 {
            return None;
        }
        self.handle_at(self.to_local(world), zoom).map(FrameHit::Resize)
    }

    /// Cursor for a handle on this frame, chosen from where the handle
    /// appears after rotation.
    pub fn cursor_for(&self, handle: ResizeHandle) -> CursorKind {
        handle.visual(self.rotation).cursor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_positions() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(ResizeHandle::NorthWest.position_on(rect), Point::new(0.0, 0.0));
        assert_eq!(ResizeHandle::East.position_on(rect), Point::new(100.0, 25.0));
        assert_eq!(ResizeHandle::South.position_on(rect), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_opposites_pair_up() {
        for h in ResizeHandle::ALL {
            assert_eq!(h.opposite().opposite(), h);
            assert_eq!(h.direction() + h.opposite().direction(), Vec2::ZERO);
        }
    }

    #[test]
    fn test_hit_resize_unrotated() {
        let frame = SelectionFrame::new(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0);
        assert_eq!(frame.hit_resize(Point::new(101.0, 99.0), 1.0), Some(ResizeHandle::SouthEast));
        assert_eq!(frame.hit_resize(Point::new(50.0, -2.0), 1.0), Some(ResizeHandle::North));
        assert_eq!(frame.hit_resize(Point::new(2.0, 30.0), 1.0), Some(ResizeHandle::West));
        assert_eq!(frame.hit_resize(Point::new(50.0, 50.0), 1.0), None);
    }

    #[test]
    fn test_hit_resize_rotated_maps_to_local() {
        let frame = SelectionFrame::new(Rect::new(0.0, 0.0, 100.0, 100.0), 90.0);
        // After a quarter turn the local north-west corner sits at the world
        // top-right.
        let world = frame.handle_position(ResizeHandle::NorthWest);
        assert!((world.x - 100.0).abs() < 1e-9 && world.y.abs() < 1e-9);
        assert_eq!(frame.hit_resize(world, 1.0), Some(ResizeHandle::NorthWest));
        assert_eq!(frame.cursor_for(ResizeHandle::NorthWest), CursorKind::NeswResize);
    }

    #[test]
    fn test_visual_handle_at_45_degrees() {
        assert_eq!(ResizeHandle::NorthWest.visual(45.0), ResizeHandle::North);
        assert_eq!(ResizeHandle::West.visual(45.0), ResizeHandle::NorthWest);
        assert_eq!(ResizeHandle::East.visual(-90.0), ResizeHandle::North);
        assert_eq!(ResizeHandle::North.visual(0.0), ResizeHandle::North);
    }

    #[test]
    fn test_rotate_handle_scales_with_zoom() {
        let frame = SelectionFrame::new(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0);
        assert_eq!(frame.rotate_handle_position(2.0), Point::new(50.0, -12.0));
        assert!(frame.hit_rotate(Point::new(50.0, -24.0), 1.0));
        assert_eq!(frame.hit(Point::new(50.0, -24.0), 1.0, false), None);
    }

    #[test]
    fn test_hit_handles_ignores_edges() {
        let frame = SelectionFrame::new(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0);
        assert_eq!(frame.hit_handles(Point::new(30.0, 1.0), 1.0, true), None);
        assert_eq!(
            frame.hit_handles(Point::new(99.0, 101.0), 1.0, false),
            Some(FrameHit::Resize(ResizeHandle::SouthEast))
        );
        assert_eq!(frame.hit_handles(Point::new(50.0, -24.0), 1.0, true), Some(FrameHit::Rotate));

        let flat = SelectionFrame::new(Rect::new(0.0, 0.0, 100.0, 0.0), 0.0);
        assert_eq!(flat.hit_handles(Point::new(100.0, 0.0), 1.0, false), None);
    }
}
