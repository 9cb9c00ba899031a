//! Bounding boxes for elements.
//!
//! [`element_bounds`] is the unrotated box in world space. Rotation is applied
//! separately through [`rotated_bounds`] and never baked into stored points.

use kurbo::{Point, Rect};

use super::{points_bounds, rotated_corners};
use crate::connector;
use crate::elements::Element;

/// Unrotated bounding box of an element.
///
/// Connectors with three or more points are bounded by their rendered path,
/// not by their control points.
pub fn element_bounds(element: &Element) -> Rect {
    if let Some(rect) = element.box_rect() {
        return rect.abs();
    }
    let bounds = if element.is_connector() && element.points.len() >= 3 {
        points_bounds(&connector::rendered_polyline(element))
    } else {
        points_bounds(&element.points)
    };
    bounds.unwrap_or(Rect::ZERO)
}

/// Center of the unrotated box; the pivot for the element's rotation.
pub fn element_center(element: &Element) -> Point {
    element_bounds(element).center()
}

/// Axis-aligned world box of the element after its rotation is applied.
pub fn rotated_bounds(element: &Element) -> Rect {
    let rect = element_bounds(element);
    if element.rotation % 360.0 == 0.0 {
        return rect;
    }
    let corners = rotated_corners(rect, element.rotation);
    points_bounds(&corners).unwrap_or(rect)
}

/// The four world-space corners of the element's rotated frame.
pub fn element_corners(element: &Element) -> [Point; 4] {
    rotated_corners(element_bounds(element), element.rotation)
}

/// Union of the rotated bounds of several elements.
pub fn combined_bounds<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Option<Rect> {
    elements
        .into_iter()
        .map(rotated_bounds)
        .reduce(|acc, r| acc.union(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ConnectorProps, ConnectorStyle, ElementStyle};

    fn curved(points: Vec<Point>) -> Element {
        let props = ConnectorProps {
            connector_style: ConnectorStyle::Curved,
            ..Default::default()
        };
        Element::line(points, props, ElementStyle::default())
    }

    #[test]
    fn test_bounds_idempotent() {
        let el = curved(vec![
            Point::new(0.0, 0.0),
            Point::new(40.0, 60.0),
            Point::new(90.0, 10.0),
            Point::new(120.0, 80.0),
        ]);
        assert_eq!(element_bounds(&el), element_bounds(&el));
        let mut rect = Element::rectangle(Rect::new(0.0, 0.0, 30.0, 10.0), ElementStyle::default());
        rect.rotation = 33.0;
        assert_eq!(rotated_bounds(&rect), rotated_bounds(&rect));
    }

    #[test]
    fn test_box_bounds_ignore_rotation() {
        let mut el = Element::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0), ElementStyle::default());
        el.rotation = 90.0;
        assert_eq!(element_bounds(&el), Rect::new(0.0, 0.0, 100.0, 50.0));
        let r = rotated_bounds(&el);
        assert!((r.width() - 50.0).abs() < 1e-9);
        assert!((r.height() - 100.0).abs() < 1e-9);
        assert!((r.center().x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_curved_bounds_cover_rendered_path() {
        // The stored middle point lies on the curve, so the rendered path
        // reaches y = 50 even though the control polygon does not go past it.
        let el = curved(vec![Point::ZERO, Point::new(50.0, 50.0), Point::new(100.0, 0.0)]);
        let b = element_bounds(&el);
        assert!((b.y1 - 50.0).abs() < 0.5);
        assert!(b.x0.abs() < 1e-9 && (b.x1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_combined_bounds() {
        let a = Element::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), ElementStyle::default());
        let b = Element::ellipse(Rect::new(20.0, 5.0, 30.0, 40.0), ElementStyle::default());
        assert_eq!(combined_bounds([&a, &b]), Some(Rect::new(0.0, 0.0, 30.0, 40.0)));
        assert_eq!(combined_bounds(std::iter::empty()), None);
    }
}
