//! Editing connector points: endpoint, vertex, midpoint and run handles.
//!
//! Drags are applied to a snapshot of the connector taken at pointer-down,
//! so each move recomputes the result from the original points.

use kurbo::{Point, Vec2};

use super::elbow::{self, RUN_HANDLE_MIN_SCREEN_LEN};
use super::{rendered_vertices, style_of};
use crate::elements::{ConnectorStyle, Element};
use crate::geometry::handles::HANDLE_HIT_TOLERANCE;
use crate::geometry::hit::{nearest_segment, to_local};
use crate::geometry::{element_center, rotate_point, rotate_vec};

/// One end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum End {
    Start,
    End,
}

/// What a connector handle edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorHandleKind {
    Endpoint(End),
    /// Interior vertex by index.
    Vertex(usize),
    /// Midpoint of the segment starting at this vertex; dragging inserts a
    /// new vertex there.
    Midpoint(usize),
    /// Elbow run by index.
    Run(usize),
}

/// A handle and its world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorHandle {
    pub kind: ConnectorHandleKind,
    pub position: Point,
}

fn to_world(element: &Element, local: Point) -> Point {
    if element.rotation % 360.0 == 0.0 {
        return local;
    }
    rotate_point(local, element_center(element), element.rotation)
}

/// Handles shown for a selected connector at `zoom`.
pub fn handles(element: &Element, zoom: f64) -> Vec<ConnectorHandle> {
    let points = &element.points;
    if !element.is_connector() || points.len() < 2 {
        return Vec::new();
    }
    let n = points.len();
    let mut out = vec![
        ConnectorHandle {
            kind: ConnectorHandleKind::Endpoint(End::Start),
            position: points[0],
        },
        ConnectorHandle {
            kind: ConnectorHandleKind::Endpoint(End::End),
            position: points[n - 1],
        },
    ];

    if style_of(element) == ConnectorStyle::Elbow && n >= 3 {
        out.extend(
            elbow::run_handles(&rendered_vertices(element), zoom)
                .into_iter()
                .map(|h| ConnectorHandle {
                    kind: ConnectorHandleKind::Run(h.run),
                    position: h.position,
                }),
        );
    } else {
        out.extend((1..n - 1).map(|i| ConnectorHandle {
            kind: ConnectorHandleKind::Vertex(i),
            position: points[i],
        }));
        out.extend(points.windows(2).enumerate().filter_map(|(i, w)| {
            let long_enough = (w[1] - w[0]).hypot() * zoom >= RUN_HANDLE_MIN_SCREEN_LEN;
            long_enough.then(|| ConnectorHandle {
                kind: ConnectorHandleKind::Midpoint(i),
                position: w[0].midpoint(w[1]),
            })
        }));
    }

    for h in &mut out {
        h.position = to_world(element, h.position);
    }
    out
}

/// Closest handle within pick tolerance of a world point.
pub fn hit_handle(element: &Element, world: Point, zoom: f64) -> Option<ConnectorHandleKind> {
    let tolerance = HANDLE_HIT_TOLERANCE / zoom;
    handles(element, zoom)
        .into_iter()
        .map(|h| (h.kind, (h.position - world).hypot()))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(kind, _)| kind)
}

/// Apply a drag of `delta` (world units) on `handle` to a snapshot.
pub fn apply_drag(original: &Element, handle: ConnectorHandleKind, delta: Vec2) -> Element {
    let mut el = original.clone();
    let d = rotate_vec(delta, -original.rotation);
    let style = style_of(original);
    let n = original.points.len();
    if n < 2 {
        return el;
    }

    match handle {
        ConnectorHandleKind::Endpoint(end) => {
            let index = if end == End::Start { 0 } else { n - 1 };
            let target = original.points[index] + d;
            if style == ConnectorStyle::Elbow && n >= 4 {
                el.points = elbow::drag_endpoint(&original.points, end, target);
            } else {
                el.points[index] = target;
            }
        }
        ConnectorHandleKind::Vertex(i) if i > 0 && i < n - 1 => {
            el.points[i] = original.points[i] + d;
        }
        ConnectorHandleKind::Midpoint(i) if i + 1 < n => {
            let mid = original.points[i].midpoint(original.points[i + 1]);
            el.points.insert(i + 1, mid + d);
        }
        ConnectorHandleKind::Run(run) => {
            el.points = elbow::drag_run(&rendered_vertices(original), run, d);
        }
        _ => {
            log::warn!("Ignoring stale connector handle {handle:?} on {}", original.id);
        }
    }
    el
}

/// Tidy a connector once its edit is released.
pub fn finish(element: &Element) -> Element {
    let mut el = element.clone();
    if el.points.len() < 3 {
        return el;
    }
    el.points = match style_of(element) {
        ConnectorStyle::Elbow if el.points.len() >= 4 => elbow::simplify(&el.points),
        _ => elbow::merge_close_points(&el.points, elbow::MERGE_EPSILON),
    };
    el
}

/// Insert a vertex at the world point on the nearest segment.
///
/// Elbow connectors are left alone: their vertices must stay orthogonal.
pub fn insert_vertex(element: &Element, world: Point) -> Option<Element> {
    if !element.is_connector() || style_of(element) == ConnectorStyle::Elbow {
        return None;
    }
    let (segment, _) = nearest_segment(element, world)?;
    let mut el = element.clone();
    el.points.insert(segment + 1, to_local(element, world));
    Some(el)
}
