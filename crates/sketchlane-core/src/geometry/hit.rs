//! Hit-testing and distance queries against element geometry.
//!
//! Every query first moves the probe into the element's unrotated frame.

use kurbo::{Point, Rect};

use super::bounds::element_center;
use super::{
    point_to_polyline_dist, point_to_rect_dist, point_to_segment_dist, rect_contains_point,
    rotate_point, segment_to_rect_dist, segment_to_segment_dist,
};
use crate::connector;
use crate::elements::{BoxProps, Element, ElementKind, FillPattern};

/// Map a world point into the element's unrotated frame.
pub fn to_local(element: &Element, world: Point) -> Point {
    if element.rotation % 360.0 == 0.0 {
        return world;
    }
    rotate_point(world, element_center(element), -element.rotation)
}

/// The polyline actually drawn for a point-based element, unrotated.
pub fn rendered_points(element: &Element) -> Vec<Point> {
    if element.is_connector() {
        connector::rendered_polyline(element)
    } else {
        element.points.clone()
    }
}

fn is_filled(b: &BoxProps) -> bool {
    b.fill_color.is_some() && b.fill_pattern != FillPattern::None
}

fn diamond_outline(rect: Rect) -> [Point; 5] {
    let c = rect.center();
    [
        Point::new(c.x, rect.y0),
        Point::new(rect.x1, c.y),
        Point::new(c.x, rect.y1),
        Point::new(rect.x0, c.y),
        Point::new(c.x, rect.y0),
    ]
}

fn rect_border_dist(point: Point, rect: Rect) -> f64 {
    if rect_contains_point(rect, point) {
        (point.x - rect.x0)
            .min(rect.x1 - point.x)
            .min(point.y - rect.y0)
            .min(rect.y1 - point.y)
    } else {
        point_to_rect_dist(point, rect)
    }
}

fn ellipse_hit(local: Point, rect: Rect, filled: bool, reach: f64) -> bool {
    let c = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    let outer = |dx: f64, dy: f64| {
        let nx = dx / (rx + reach);
        let ny = dy / (ry + reach);
        nx * nx + ny * ny <= 1.0
    };
    let (dx, dy) = (local.x - c.x, local.y - c.y);
    if !outer(dx, dy) {
        return false;
    }
    if filled {
        return true;
    }
    let (irx, iry) = ((rx - reach).max(0.0), (ry - reach).max(0.0));
    if irx < f64::EPSILON || iry < f64::EPSILON {
        return true;
    }
    (dx / irx).powi(2) + (dy / iry).powi(2) > 1.0
}

/// Whether a world point hits the element.
///
/// Filled shapes, frames, text and embeds hit anywhere inside; outlined
/// shapes and strokes hit within `tolerance` of their stroke.
pub fn hit_test(element: &Element, world: Point, tolerance: f64) -> bool {
    let local = to_local(element, world);
    let reach = tolerance + element.style.stroke_width / 2.0;
    match &element.kind {
        ElementKind::Rectangle(b) => {
            let rect = b.rect();
            if is_filled(b) {
                point_to_rect_dist(local, rect) <= tolerance
            } else {
                rect_border_dist(local, rect) <= reach
            }
        }
        ElementKind::Ellipse(b) => ellipse_hit(local, b.rect(), is_filled(b), reach),
        ElementKind::Diamond(b) => {
            let rect = b.rect();
            let c = rect.center();
            let (hw, hh) = (rect.width() / 2.0, rect.height() / 2.0);
            let inside = hw > 0.0
                && hh > 0.0
                && (local.x - c.x).abs() / hw + (local.y - c.y).abs() / hh <= 1.0;
            (is_filled(b) && inside)
                || point_to_polyline_dist(local, &diamond_outline(rect)) <= reach
        }
        ElementKind::Text(t) => point_to_rect_dist(local, t.rect()) <= tolerance,
        ElementKind::Frame(b) => point_to_rect_dist(local, b.rect()) <= tolerance,
        ElementKind::EmbeddedRegion(e) => point_to_rect_dist(local, e.area.rect()) <= tolerance,
        ElementKind::FreehandStroke
        | ElementKind::Line(_)
        | ElementKind::Arrow(_)
        | ElementKind::LaserTrace { .. } => {
            point_to_polyline_dist(local, &rendered_points(element)) <= reach
        }
    }
}

/// Smallest distance between the element geometry and a traveled path.
///
/// Strokes and connectors are measured along their rendered polyline; shapes,
/// frames and text are measured to their box.
pub fn element_distance_to_path(element: &Element, path: &[Point]) -> f64 {
    let local: Vec<Point> = path.iter().map(|p| to_local(element, *p)).collect();
    if let Some(rect) = element.box_rect() {
        return match local.as_slice() {
            [] => f64::INFINITY,
            [only] => point_to_rect_dist(*only, rect),
            _ => local
                .windows(2)
                .map(|w| segment_to_rect_dist(w[0], w[1], rect))
                .fold(f64::INFINITY, f64::min),
        };
    }

    let geometry = rendered_points(element);
    match (geometry.as_slice(), local.as_slice()) {
        ([], _) | (_, []) => f64::INFINITY,
        (g, [only]) => point_to_polyline_dist(*only, g),
        ([single], l) => point_to_polyline_dist(*single, l),
        (g, l) => {
            let mut best = f64::INFINITY;
            for a in l.windows(2) {
                for b in g.windows(2) {
                    best = best.min(segment_to_segment_dist(a[0], a[1], b[0], b[1]));
                    if best == 0.0 {
                        return 0.0;
                    }
                }
            }
            best
        }
    }
}

/// Distance from a world point to the nearest segment of a point-based
/// element, with the segment index. Used to insert vertices.
pub fn nearest_segment(element: &Element, world: Point) -> Option<(usize, f64)> {
    let local = to_local(element, world);
    element
        .points
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i, point_to_segment_dist(local, w[0], w[1])))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
