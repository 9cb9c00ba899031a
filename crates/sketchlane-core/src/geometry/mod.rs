//! Geometry library: pure functions over points, boxes and elements.

pub mod bounds;
pub mod handles;
pub mod hit;
pub mod text;

pub use bounds::{combined_bounds, element_bounds, element_center, rotated_bounds};
pub use handles::{CursorKind, ResizeHandle, SelectionFrame};
pub use hit::{element_distance_to_path, hit_test};
pub use text::{ApproximateMeasurer, FontDescriptor, TextMeasurer, TextMetrics};

use kurbo::{Point, Rect, Vec2};

/// Samples taken per curve segment when bounding or hit-testing rendered paths.
pub const CURVE_SAMPLES_PER_SEGMENT: usize = 16;

/// Smallest extent used as a scale denominator.
pub const MIN_EXTENT: f64 = 1e-6;

/// Rotate `point` about `pivot` by `degrees` (clockwise on a y-down screen).
pub fn rotate_point(point: Point, pivot: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - pivot;
    Point::new(
        pivot.x + d.x * cos - d.y * sin,
        pivot.y + d.x * sin + d.y * cos,
    )
}

/// Rotate a vector by `degrees`.
pub fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    rotate_point(v.to_point(), Point::ZERO, degrees).to_vec2()
}

/// Bring an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees % 360.0;
    if d < 0.0 { d + 360.0 } else { d }
}

/// Angle of `point` around `center` in degrees, y-down.
pub fn angle_from(center: Point, point: Point) -> f64 {
    (point.y - center.y).atan2(point.x - center.x).to_degrees()
}

/// Snap an angle to the nearest multiple of `step` degrees.
pub fn snap_angle(degrees: f64, step: f64) -> f64 {
    (degrees / step).round() * step
}

/// Grow a box by `padding` on every side.
pub fn expand_rect(rect: Rect, padding: f64) -> Rect {
    Rect::new(
        rect.x0 - padding,
        rect.y0 - padding,
        rect.x1 + padding,
        rect.y1 + padding,
    )
}

/// Normalized box spanning two corners.
pub fn rect_from_points(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Whether `inner` lies entirely inside `outer` (edges inclusive).
pub fn rect_contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Whether `point` lies inside `rect` (edges inclusive).
pub fn rect_contains_point(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Bounding box of a point list, `None` when empty.
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    Some(
        points
            .iter()
            .skip(1)
            .fold(Rect::from_origin_size(*first, (0.0, 0.0)), |r, p| {
                r.union_pt(*p)
            }),
    )
}

/// The four corners of `rect` rotated about its center.
pub fn rotated_corners(rect: Rect, degrees: f64) -> [Point; 4] {
    let c = rect.center();
    [
        rotate_point(Point::new(rect.x0, rect.y0), c, degrees),
        rotate_point(Point::new(rect.x1, rect.y0), c, degrees),
        rotate_point(Point::new(rect.x1, rect.y1), c, degrees),
        rotate_point(Point::new(rect.x0, rect.y1), c, degrees),
    ]
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Whether segments a→b and c→d intersect (touching counts).
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on = |p: Point, q: Point, r: Point| point_to_segment_dist(r, p, q) < 1e-9;
    on(c, d, a) || on(c, d, b) || on(a, b, c) || on(a, b, d)
}

/// Minimum distance between segments a→b and c→d.
pub fn segment_to_segment_dist(a: Point, b: Point, c: Point, d: Point) -> f64 {
    if segments_intersect(a, b, c, d) {
        return 0.0;
    }
    point_to_segment_dist(a, c, d)
        .min(point_to_segment_dist(b, c, d))
        .min(point_to_segment_dist(c, a, b))
        .min(point_to_segment_dist(d, a, b))
}

/// Distance from a point to a box; zero inside.
pub fn point_to_rect_dist(point: Point, rect: Rect) -> f64 {
    let dx = (rect.x0 - point.x).max(0.0).max(point.x - rect.x1);
    let dy = (rect.y0 - point.y).max(0.0).max(point.y - rect.y1);
    dx.hypot(dy)
}

/// Distance from a segment to a box; zero when they overlap.
pub fn segment_to_rect_dist(a: Point, b: Point, rect: Rect) -> f64 {
    if rect_contains_point(rect, a) || rect_contains_point(rect, b) {
        return 0.0;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    (0..4)
        .map(|i| segment_to_segment_dist(a, b, corners[i], corners[(i + 1) % 4]))
        .fold(f64::INFINITY, f64::min)
}

/// Simplify a polyline with Ramer-Douglas-Peucker.
pub fn simplify_polyline(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        let mut max_dist = 0.0;
        let mut index = start;
        for i in start + 1..end {
            let d = point_to_segment_dist(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        if max_dist > tolerance {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }
    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}
