//! Arrow-head markers.
//!
//! A marker is built from a tip and a `from` reference that sets its facing.
//! The tip is pushed outward past the mathematical endpoint so the visible
//! point of the marker meets the end of the stroked line.

use kurbo::{Point, Vec2};

use super::{End, end_anchor};
use crate::elements::{ArrowHead, Element};

/// Marker length as a multiple of stroke width.
const SIZE_FACTOR: f64 = 4.0;

/// Smallest marker length in world units.
const MIN_SIZE: f64 = 10.0;

/// Geometry of a marker, ready to fill or stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerShape {
    /// Open polyline (stroked).
    Open(Vec<Point>),
    /// Closed polygon, filled or outlined.
    Polygon { points: Vec<Point>, filled: bool },
    Circle {
        center: Point,
        radius: f64,
        filled: bool,
    },
}

/// How far past the endpoint the marker tip sits, in stroke widths.
pub fn tip_offset(head: ArrowHead) -> f64 {
    match head {
        ArrowHead::None | ArrowHead::Bar => 0.0,
        ArrowHead::Arrow | ArrowHead::Triangle | ArrowHead::Diamond | ArrowHead::Circle => 0.5,
        ArrowHead::TriangleOutline | ArrowHead::DiamondOutline | ArrowHead::CircleOutline => 1.0,
    }
}

pub fn marker_size(stroke_width: f64) -> f64 {
    (stroke_width * SIZE_FACTOR).max(MIN_SIZE)
}

/// Build a marker at `tip` facing away from `from`.
pub fn build(head: ArrowHead, tip: Point, from: Point, stroke_width: f64) -> Option<MarkerShape> {
    if head == ArrowHead::None {
        return None;
    }
    let d = tip - from;
    let len = d.hypot();
    let dir = if len > f64::EPSILON { d / len } else { Vec2::new(1.0, 0.0) };
    let normal = Vec2::new(-dir.y, dir.x);
    let size = marker_size(stroke_width);
    let tip = tip + dir * (tip_offset(head) * stroke_width);
    let back = tip - dir * size;
    let half = size * 0.5;

    Some(match head {
        ArrowHead::None => return None,
        ArrowHead::Arrow => MarkerShape::Open(vec![
            back + normal * half,
            tip,
            back - normal * half,
        ]),
        ArrowHead::Triangle | ArrowHead::TriangleOutline => MarkerShape::Polygon {
            points: vec![tip, back + normal * half, back - normal * half],
            filled: head == ArrowHead::Triangle,
        },
        ArrowHead::Diamond | ArrowHead::DiamondOutline => {
            let mid = tip - dir * (size * 0.5);
            MarkerShape::Polygon {
                points: vec![
                    tip,
                    mid + normal * (half * 0.6),
                    back,
                    mid - normal * (half * 0.6),
                ],
                filled: head == ArrowHead::Diamond,
            }
        }
        ArrowHead::Circle | ArrowHead::CircleOutline => {
            let radius = size * 0.35;
            MarkerShape::Circle {
                center: tip - dir * radius,
                radius,
                filled: head == ArrowHead::Circle,
            }
        }
        ArrowHead::Bar => MarkerShape::Open(vec![tip + normal * half, tip - normal * half]),
    })
}

/// Markers for both ends of a connector, start first.
pub fn connector_markers(element: &Element) -> Vec<MarkerShape> {
    let Some(props) = element.connector_props() else {
        return Vec::new();
    };
    let width = element.style.stroke_width;
    [(End::Start, props.start_marker), (End::End, props.end_marker)]
        .into_iter()
        .filter_map(|(end, head)| {
            let (tip, from) = end_anchor(element, end)?;
            build(head, tip, from, width)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ConnectorProps, ElementStyle};

    #[test]
    fn test_none_builds_nothing() {
        assert!(build(ArrowHead::None, Point::ZERO, Point::new(-1.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn test_triangle_tip_is_offset_outward() {
        let shape = build(ArrowHead::Triangle, Point::new(100.0, 0.0), Point::ZERO, 4.0).unwrap();
        let MarkerShape::Polygon { points, filled } = shape else {
            panic!("expected polygon");
        };
        assert!(filled);
        assert!((points[0] - Point::new(102.0, 0.0)).hypot() < 1e-9);
        // Base sits behind the tip along the line.
        assert!(points[1].x < points[0].x && points[2].x < points[0].x);
    }

    #[test]
    fn test_outline_offsets_further() {
        assert!(tip_offset(ArrowHead::TriangleOutline) > tip_offset(ArrowHead::Triangle));
        assert_eq!(tip_offset(ArrowHead::Bar), 0.0);
    }

    #[test]
    fn test_connector_markers_face_the_line() {
        let props = ConnectorProps {
            start_marker: ArrowHead::Bar,
            end_marker: ArrowHead::Arrow,
            ..Default::default()
        };
        let el = Element::arrow(
            vec![Point::ZERO, Point::new(0.0, 100.0)],
            props,
            ElementStyle::default(),
        );
        let markers = connector_markers(&el);
        assert_eq!(markers.len(), 2);
        let MarkerShape::Open(bar) = &markers[0] else {
            panic!("expected bar");
        };
        // A bar across a vertical line is horizontal.
        assert!((bar[0].y - bar[1].y).abs() < 1e-9);
        let MarkerShape::Open(chevron) = &markers[1] else {
            panic!("expected chevron");
        };
        assert!((chevron[1] - Point::new(0.0, 101.0)).hypot() < 1e-9);
    }
}
