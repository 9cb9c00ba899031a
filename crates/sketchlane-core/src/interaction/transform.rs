//! Dragging, resizing and rotating selected elements.
//!
//! Every operation keeps snapshots taken at pointer-down and recomputes the
//! result from them on each move, so errors never accumulate.

use kurbo::{Point, Rect, Vec2};

use crate::connector::{self, ConnectorHandleKind};
use crate::elements::{Element, ElementKind};
use crate::geometry::{
    MIN_EXTENT, ResizeHandle, SelectionFrame, TextMetrics, angle_from, element_bounds,
    element_center, rotate_point, rotate_vec, snap_angle,
};

/// Rotation step used while shift is held, in degrees.
pub const ROTATION_SNAP_STEP: f64 = 15.0;

/// Moving the selection.
#[derive(Debug, Clone)]
pub struct DragState {
    pub start: Point,
    pub originals: Vec<Element>,
}

impl DragState {
    pub fn new(start: Point, originals: Vec<Element>) -> Self {
        Self { start, originals }
    }

    pub fn apply(&self, world: Point) -> Vec<Element> {
        let delta = world - self.start;
        self.originals
            .iter()
            .map(|original| {
                let mut el = original.clone();
                el.translate(delta);
                el
            })
            .collect()
    }
}

/// Resizing the selection from one handle.
#[derive(Debug, Clone)]
pub struct ResizeState {
    pub handle: ResizeHandle,
    pub start: Point,
    pub frame: SelectionFrame,
    pub originals: Vec<Element>,
}

impl ResizeState {
    pub fn new(handle: ResizeHandle, start: Point, frame: SelectionFrame, originals: Vec<Element>) -> Self {
        Self {
            handle,
            start,
            frame,
            originals,
        }
    }

    pub fn apply(&self, world: Point, keep_aspect: bool, metrics: &mut TextMetrics) -> Vec<Element> {
        let delta = world - self.start;
        match self.originals.as_slice() {
            [single] => vec![resize_element(single, self.handle, delta, keep_aspect, metrics)],
            many => resize_group(many, self.frame.rect, self.handle, delta, keep_aspect),
        }
    }
}

/// Rotating the selection about its center.
#[derive(Debug, Clone)]
pub struct RotateState {
    pub pivot: Point,
    pub start_angle: f64,
    pub originals: Vec<Element>,
}

impl RotateState {
    pub fn new(pivot: Point, start: Point, originals: Vec<Element>) -> Self {
        Self {
            pivot,
            start_angle: angle_from(pivot, start),
            originals,
        }
    }

    pub fn apply(&self, world: Point, snap: bool) -> Vec<Element> {
        let delta = angle_from(self.pivot, world) - self.start_angle;
        match self.originals.as_slice() {
            [single] => {
                let mut el = single.clone();
                let target = single.rotation + delta;
                el.rotation = if snap {
                    snap_angle(target, ROTATION_SNAP_STEP)
                } else {
                    target
                };
                vec![el]
            }
            many => {
                let delta = if snap {
                    snap_angle(delta, ROTATION_SNAP_STEP)
                } else {
                    delta
                };
                rotate_group(many, self.pivot, delta)
            }
        }
    }
}

/// Editing one connector's points.
#[derive(Debug, Clone)]
pub struct ConnectorEditState {
    pub handle: ConnectorHandleKind,
    pub start: Point,
    pub original: Element,
}

impl ConnectorEditState {
    pub fn new(handle: ConnectorHandleKind, start: Point, original: Element) -> Self {
        Self {
            handle,
            start,
            original,
        }
    }

    pub fn apply(&self, world: Point) -> Element {
        connector::edit::apply_drag(&self.original, self.handle, world - self.start)
    }

    pub fn finish(&self, world: Point) -> Element {
        connector::edit::finish(&self.apply(world))
    }
}

/// Box after dragging `handle` by a local delta. Extents may go negative.
fn dragged_rect(rect: Rect, handle: ResizeHandle, d: Vec2, keep_aspect: bool) -> Rect {
    let dir = handle.direction();
    let (mut x0, mut y0, mut x1, mut y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
    if dir.x < 0.0 {
        x0 += d.x;
    } else if dir.x > 0.0 {
        x1 += d.x;
    }
    if dir.y < 0.0 {
        y0 += d.y;
    } else if dir.y > 0.0 {
        y1 += d.y;
    }

    if keep_aspect && handle.is_corner() && rect.width() > MIN_EXTENT && rect.height() > MIN_EXTENT {
        let (w, h) = (x1 - x0, y1 - y0);
        let scale = (w.abs() / rect.width()).max(h.abs() / rect.height());
        let new_w = rect.width() * scale * w.signum();
        let new_h = rect.height() * scale * h.signum();
        if dir.x < 0.0 {
            x0 = x1 - new_w;
        } else {
            x1 = x0 + new_w;
        }
        if dir.y < 0.0 {
            y0 = y1 - new_h;
        } else {
            y1 = y0 + new_h;
        }
    }
    Rect { x0, y0, x1, y1 }
}

fn ratio(new: f64, old: f64) -> f64 {
    if old.abs() < MIN_EXTENT { 1.0 } else { new / old }
}

/// Scale `p` about `anchor` by `(sx, sy)`.
fn scale_about(p: Point, anchor: Point, sx: f64, sy: f64) -> Point {
    Point::new(anchor.x + (p.x - anchor.x) * sx, anchor.y + (p.y - anchor.y) * sy)
}

/// Text grows downward, so edge drags anchor on the top corners.
fn text_anchor(handle: ResizeHandle) -> ResizeHandle {
    match handle.opposite() {
        ResizeHandle::West | ResizeHandle::North => ResizeHandle::NorthWest,
        ResizeHandle::East => ResizeHandle::NorthEast,
        ResizeHandle::South => ResizeHandle::SouthWest,
        corner => corner,
    }
}

/// Resize one element from `handle` by a world-space `delta`.
///
/// The delta is applied in the element's unrotated frame and the result is
/// shifted so the opposite handle stays where it was in world space.
pub fn resize_element(
    original: &Element,
    handle: ResizeHandle,
    delta: Vec2,
    keep_aspect: bool,
    metrics: &mut TextMetrics,
) -> Element {
    let rect = element_bounds(original);
    let theta = original.rotation;
    let center = rect.center();
    let d = rotate_vec(delta, -theta);
    let mut el = original.clone();

    let (anchor_before, anchor_after, new_center) = if let Some(props) = original.text_props() {
        let font = crate::geometry::FontDescriptor::of(props);
        let min_w = metrics.widest_char(&props.text, &font).max(MIN_EXTENT);
        let dir = handle.direction();
        let raw = dragged_rect(rect, handle, d, false);
        let (mut x0, mut x1) = (rect.x0, rect.x1);
        if dir.x < 0.0 {
            x0 = raw.x0.min(rect.x1 - min_w);
        } else if dir.x > 0.0 {
            x1 = raw.x1.max(rect.x0 + min_w);
        }
        let mut new_props = props.clone();
        new_props.is_text_box = true;
        new_props.width = x1 - x0;
        let (_, h) = metrics.measure_block(&new_props, Some(new_props.width));
        let h = h.max(props.line_px());
        let (y0, y1) = if dir.y < 0.0 {
            (rect.y1 - h, rect.y1)
        } else {
            (rect.y0, rect.y0 + h)
        };
        let new_rect = Rect::new(x0, y0, x1, y1);
        new_props.x = new_rect.x0;
        new_props.y = new_rect.y0;
        new_props.height = h;
        el.kind = ElementKind::Text(new_props);
        let anchor = text_anchor(handle);
        (
            anchor.position_on(rect),
            anchor.position_on(new_rect),
            new_rect.center(),
        )
    } else {
        let anchor_local = handle.opposite().position_on(rect);
        let new_rect = dragged_rect(rect, handle, d, keep_aspect);
        if el.is_box_like() {
            el.set_box_rect(new_rect);
        } else {
            // Point shapes scale with sign, so dragging past the anchor mirrors.
            let sx = ratio(new_rect.width(), rect.width());
            let sy = ratio(new_rect.height(), rect.height());
            for p in &mut el.points {
                *p = scale_about(*p, anchor_local, sx, sy);
            }
        }
        (anchor_local, anchor_local, element_bounds(&el).center())
    };

    if theta % 360.0 != 0.0 {
        let world_before = rotate_point(anchor_before, center, theta);
        let world_after = rotate_point(anchor_after, new_center, theta);
        el.translate(world_before - world_after);
    } else {
        el.translate(anchor_before - anchor_after);
    }
    el
}

/// Scale a group proportionally to the change of its combined box.
///
/// Each member keeps its rotation; its center and extents are scaled. Text
/// scales its font with the vertical factor instead of re-wrapping.
pub fn resize_group(
    originals: &[Element],
    frame: Rect,
    handle: ResizeHandle,
    delta: Vec2,
    keep_aspect: bool,
) -> Vec<Element> {
    let anchor = handle.opposite().position_on(frame);
    let new_frame = dragged_rect(frame, handle, delta, keep_aspect);
    let sx = new_frame.width() / frame.width().max(MIN_EXTENT);
    let sy = new_frame.height() / frame.height().max(MIN_EXTENT);

    originals
        .iter()
        .map(|original| {
            let mut el = original.clone();
            let rect = element_bounds(original);
            let center = rect.center();
            let new_center = scale_about(center, anchor, sx, sy);
            if let Some(props) = el.text_props_mut() {
                let (w, h) = (rect.width() * sx.abs(), rect.height() * sy.abs());
                props.x = new_center.x - w / 2.0;
                props.y = new_center.y - h / 2.0;
                props.width = w;
                props.height = h;
                props.font_size = (props.font_size * sy.abs()).max(MIN_EXTENT);
            } else if el.is_box_like() {
                let (w, h) = (rect.width() * sx.abs(), rect.height() * sy.abs());
                el.set_box_rect(Rect::from_center_size(new_center, (w, h)));
            } else {
                for p in &mut el.points {
                    *p = scale_about(*p, center, sx, sy) + (new_center - center);
                }
            }
            el
        })
        .collect()
}

/// Rotate every member about `pivot` by `delta` degrees.
pub fn rotate_group(originals: &[Element], pivot: Point, delta: f64) -> Vec<Element> {
    originals
        .iter()
        .map(|original| {
            let mut el = original.clone();
            let center = element_center(original);
            el.translate(rotate_point(center, pivot, delta) - center);
            el.rotation = original.rotation + delta;
            el
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementStyle, TextProps};

    fn rect_el(rect: Rect) -> Element {
        Element::rectangle(rect, ElementStyle::default())
    }

    fn world_handle(el: &Element, h: ResizeHandle) -> Point {
        SelectionFrame::new(element_bounds(el), el.rotation).handle_position(h)
    }

    #[test]
    fn test_drag_translates_from_snapshot() {
        let el = rect_el(Rect::new(0.0, 0.0, 10.0, 10.0));
        let drag = DragState::new(Point::ZERO, vec![el]);
        let _ = drag.apply(Point::new(5.0, 5.0));
        let moved = drag.apply(Point::new(20.0, 0.0));
        assert_eq!(moved[0].box_rect(), Some(Rect::new(20.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn test_resize_unrotated_corner() {
        let el = rect_el(Rect::new(0.0, 0.0, 100.0, 50.0));
        let mut m = TextMetrics::default();
        let out = resize_element(&el, ResizeHandle::SouthEast, Vec2::new(20.0, 10.0), false, &mut m);
        assert_eq!(out.box_rect(), Some(Rect::new(0.0, 0.0, 120.0, 60.0)));
    }

    #[test]
    fn test_resize_past_anchor_swaps_origin() {
        let el = rect_el(Rect::new(0.0, 0.0, 100.0, 50.0));
        let mut m = TextMetrics::default();
        let out = resize_element(&el, ResizeHandle::East, Vec2::new(-150.0, 0.0), false, &mut m);
        let b = out.box_props().unwrap();
        assert!((b.x + 50.0).abs() < 1e-9);
        assert!((b.width - 50.0).abs() < 1e-9);
        assert!(b.width >= 0.0 && b.height >= 0.0);
    }

    #[test]
    fn test_rotated_resize_keeps_opposite_handle() {
        let mut el = rect_el(Rect::new(0.0, 0.0, 100.0, 60.0));
        el.rotation = 37.0;
        let mut m = TextMetrics::default();
        for handle in ResizeHandle::ALL {
            let fixed = world_handle(&el, handle.opposite());
            let out = resize_element(&el, handle, Vec2::new(23.0, -11.0), false, &mut m);
            let after = world_handle(&out, handle.opposite());
            assert!((fixed - after).hypot() < 1e-6, "{handle:?} moved anchor");
            assert!((out.rotation - 37.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_aspect_lock_uses_larger_dimension() {
        let el = rect_el(Rect::new(0.0, 0.0, 100.0, 50.0));
        let mut m = TextMetrics::default();
        let out = resize_element(&el, ResizeHandle::SouthEast, Vec2::new(100.0, 10.0), true, &mut m);
        assert_eq!(out.box_rect(), Some(Rect::new(0.0, 0.0, 200.0, 100.0)));
    }

    #[test]
    fn test_point_shape_mirrors() {
        let el = Element::freehand(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 50.0)],
            ElementStyle::default(),
        );
        let mut m = TextMetrics::default();
        let out = resize_element(&el, ResizeHandle::East, Vec2::new(-200.0, 0.0), false, &mut m);
        // The west edge stays put and the stroke flips to its left.
        assert_eq!(out.points[0], Point::new(0.0, 0.0));
        assert_eq!(out.points[1], Point::new(-100.0, 50.0));
    }

    #[test]
    fn test_text_resize_rewraps_and_never_flips() {
        let mut m = TextMetrics::default();
        let mut props = TextProps::new(Point::ZERO, "hello wide world");
        m.relayout(&mut props);
        let el = Element::text(props.clone(), ElementStyle::default());
        let font = crate::geometry::FontDescriptor::of(&props);
        let widest = m.widest_char(&props.text, &font);

        let out = resize_element(&el, ResizeHandle::East, Vec2::new(-10_000.0, 0.0), false, &mut m);
        let t = out.text_props().unwrap();
        assert!((t.width - widest).abs() < 1e-9);
        assert!((t.x - 0.0).abs() < 1e-9);
        assert!(t.height > props.height);
        assert!(t.is_text_box);

        let wide = resize_element(&el, ResizeHandle::SouthEast, Vec2::new(500.0, 500.0), false, &mut m);
        let t = wide.text_props().unwrap();
        assert!((t.height - props.line_px()).abs() < 1e-9);
    }

    #[test]
    fn test_group_resize_scales_members() {
        let a = rect_el(Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = rect_el(Rect::new(50.0, 50.0, 100.0, 100.0));
        let mut text = TextProps::new(Point::new(0.0, 60.0), "hi");
        text.width = 20.0;
        let t = Element::text(text, ElementStyle::default());
        let frame = Rect::new(0.0, 0.0, 100.0, 100.0);
        let out = resize_group(
            &[a, b, t],
            frame,
            ResizeHandle::SouthEast,
            Vec2::new(100.0, 100.0),
            false,
        );
        assert_eq!(out[0].box_rect(), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(out[1].box_rect(), Some(Rect::new(100.0, 100.0, 200.0, 200.0)));
        let tp = out[2].text_props().unwrap();
        assert!((tp.font_size - 40.0).abs() < 1e-9);
        assert!((tp.width - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_resize_survives_zero_extent() {
        let a = Element::freehand(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)], ElementStyle::default());
        let frame = element_bounds(&a);
        let out = resize_group(&[a], frame, ResizeHandle::South, Vec2::new(0.0, 30.0), false);
        assert!(out[0].points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_rotate_single_with_snap() {
        let el = rect_el(Rect::new(0.0, 0.0, 100.0, 100.0));
        let state = RotateState::new(Point::new(50.0, 50.0), Point::new(50.0, -10.0), vec![el]);
        // A quarter turn clockwise from straight up.
        let out = state.apply(Point::new(110.0, 50.0), false);
        assert!((out[0].rotation - 90.0).abs() < 1e-9);
        let snapped = state.apply(Point::new(110.0, 45.0), true);
        assert!((snapped[0].rotation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_group_moves_centers() {
        let a = rect_el(Rect::new(0.0, 0.0, 10.0, 10.0));
        let out = rotate_group(&[a], Point::new(50.0, 5.0), 180.0);
        let c = element_center(&out[0]);
        assert!((c - Point::new(95.0, 5.0)).hypot() < 1e-9);
        assert!((out[0].rotation - 180.0).abs() < 1e-12);
    }
}
