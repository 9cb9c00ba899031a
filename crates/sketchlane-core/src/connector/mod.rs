//! Connector routing for lines and arrows.
//!
//! Two points draw a straight segment. With three or more points the
//! connector style decides between a polyline, a curve and an orthogonal
//! route.

pub mod curve;
pub mod edit;
pub mod elbow;
pub mod markers;

pub use edit::{ConnectorHandle, ConnectorHandleKind, End};
pub use markers::MarkerShape;

use kurbo::{BezPath, Point};

use crate::elements::{ConnectorStyle, Element};
use crate::geometry::CURVE_SAMPLES_PER_SEGMENT;

/// Routing style of an element, `Sharp` for non-connectors.
pub fn style_of(element: &Element) -> ConnectorStyle {
    element
        .connector_props()
        .map(|c| c.connector_style)
        .unwrap_or(ConnectorStyle::Sharp)
}

/// Vertices of the drawn polyline before curve sampling.
///
/// A three-point elbow is expanded into its four-point orthogonal route.
pub fn rendered_vertices(element: &Element) -> Vec<Point> {
    let Some(props) = element.connector_props() else {
        return element.points.clone();
    };
    match (props.connector_style, element.points.as_slice()) {
        (ConnectorStyle::Elbow, [start, control, end]) => {
            elbow::synthesize_route(*start, *control, *end, props.elbow_route).to_vec()
        }
        _ => element.points.clone(),
    }
}

/// The drawn path flattened into a polyline.
///
/// Curves are sampled at [`CURVE_SAMPLES_PER_SEGMENT`] points per segment.
pub fn rendered_polyline(element: &Element) -> Vec<Point> {
    if style_of(element) == ConnectorStyle::Curved && element.points.len() >= 3 {
        curve::sample(&element.points, CURVE_SAMPLES_PER_SEGMENT)
    } else {
        rendered_vertices(element)
    }
}

/// Path for rendering a connector body, unrotated.
pub fn to_path(element: &Element) -> BezPath {
    if style_of(element) == ConnectorStyle::Curved && element.points.len() >= 3 {
        return curve::to_bez_path(&element.points);
    }
    let mut path = BezPath::new();
    let vertices = rendered_vertices(element);
    if let Some((first, rest)) = vertices.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

/// Tip and facing reference for one end of a connector.
///
/// `from` is the adjacent control point or vertex, so a marker drawn from
/// `from` toward `tip` follows the rendered direction of the path.
pub fn end_anchor(element: &Element, end: End) -> Option<(Point, Point)> {
    let points = &element.points;
    if points.len() < 2 {
        return None;
    }
    if style_of(element) == ConnectorStyle::Curved && points.len() >= 3 {
        let (start_from, end_from) = curve::end_references(points);
        return Some(match end {
            End::Start => (points[0], start_from),
            End::End => (points[points.len() - 1], end_from),
        });
    }
    let vertices = rendered_vertices(element);
    let n = vertices.len();
    let (tip, candidates): (Point, Vec<Point>) = match end {
        End::Start => (vertices[0], vertices[1..].to_vec()),
        End::End => (vertices[n - 1], vertices[..n - 1].iter().rev().copied().collect()),
    };
    // Skip vertices stacked on the tip so the facing direction is defined.
    let from = candidates
        .into_iter()
        .find(|p| (*p - tip).hypot() > elbow::MERGE_EPSILON)
        .unwrap_or(tip);
    Some((tip, from))
}
