//! Curved connector geometry.
//!
//! Three points form a quadratic Bézier. The stored middle point is the point
//! the curve passes through at t = 0.5, not the control point, so dragging it
//! drags the curve itself. Four or more points form Catmull-Rom cubics.

use kurbo::{BezPath, CubicBez, ParamCurve, Point, QuadBez};

/// Catmull-Rom tension (control points at tension/3 of the neighbor span).
const TENSION: f64 = 0.5;

/// One rendered curve piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSegment {
    Quad(QuadBez),
    Cubic(CubicBez),
}

impl CurveSegment {
    pub fn eval(&self, t: f64) -> Point {
        match self {
            CurveSegment::Quad(q) => q.eval(t),
            CurveSegment::Cubic(c) => c.eval(t),
        }
    }
}

/// Quadratic control point for a curve through `on_curve` at t = 0.5.
pub fn quad_control(p0: Point, on_curve: Point, p2: Point) -> Point {
    Point::new(
        2.0 * on_curve.x - (p0.x + p2.x) / 2.0,
        2.0 * on_curve.y - (p0.y + p2.y) / 2.0,
    )
}

/// Point at t = 0.5 of the quadratic with the given control point.
pub fn on_curve_point(p0: Point, control: Point, p2: Point) -> Point {
    Point::new(
        (p0.x + 2.0 * control.x + p2.x) / 4.0,
        (p0.y + 2.0 * control.y + p2.y) / 4.0,
    )
}

/// Cubic for the span `points[i] → points[i + 1]`, using the neighbors as
/// tangent references and clamping at the ends.
fn catmull_rom_span(points: &[Point], i: usize) -> CubicBez {
    let p0 = if i == 0 { points[0] } else { points[i - 1] };
    let p1 = points[i];
    let p2 = points[i + 1];
    let p3 = if i + 2 < points.len() { points[i + 2] } else { p2 };
    let k = TENSION / 3.0;
    let c1 = p1 + (p2 - p0) * k;
    let c2 = p2 - (p3 - p1) * k;
    CubicBez::new(p1, c1, c2, p2)
}

/// Curve pieces for a vertex list. Fewer than three points yield nothing.
pub fn segments(points: &[Point]) -> Vec<CurveSegment> {
    match points {
        [p0, mid, p2] => vec![CurveSegment::Quad(QuadBez::new(
            *p0,
            quad_control(*p0, *mid, *p2),
            *p2,
        ))],
        _ if points.len() >= 4 => (0..points.len() - 1)
            .map(|i| CurveSegment::Cubic(catmull_rom_span(points, i)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Flatten the curve into a polyline with `per_segment` samples per piece.
pub fn sample(points: &[Point], per_segment: usize) -> Vec<Point> {
    let segs = segments(points);
    if segs.is_empty() {
        return points.to_vec();
    }
    let per_segment = per_segment.max(1);
    let mut out = Vec::with_capacity(segs.len() * per_segment + 1);
    out.push(points[0]);
    for seg in &segs {
        for step in 1..=per_segment {
            out.push(seg.eval(step as f64 / per_segment as f64));
        }
    }
    out
}

/// Bézier path of the curve.
pub fn to_bez_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    path.move_to(*first);
    let segs = segments(points);
    if segs.is_empty() {
        for p in &points[1..] {
            path.line_to(*p);
        }
        return path;
    }
    for seg in segs {
        match seg {
            CurveSegment::Quad(q) => path.quad_to(q.p1, q.p2),
            CurveSegment::Cubic(c) => path.curve_to(c.p1, c.p2, c.p3),
        }
    }
    path
}

/// Facing references for markers at the start and end of a curve.
///
/// Uses the adjacent control point; falls back to the neighboring vertex
/// when the control point sits on the tip.
pub fn end_references(points: &[Point]) -> (Point, Point) {
    let n = points.len();
    let fallback = if n >= 2 {
        (points[1], points[n - 2])
    } else {
        let p = points.first().copied().unwrap_or(Point::ZERO);
        (p, p)
    };
    let segs = segments(points);
    let (Some(first), Some(last)) = (segs.first(), segs.last()) else {
        return fallback;
    };
    let start = match first {
        CurveSegment::Quad(q) => q.p1,
        CurveSegment::Cubic(c) => c.p1,
    };
    let end = match last {
        CurveSegment::Quad(q) => q.p1,
        CurveSegment::Cubic(c) => c.p2,
    };
    let start = if (start - points[0]).hypot() < 1e-9 { fallback.0 } else { start };
    let end = if (end - points[n - 1]).hypot() < 1e-9 { fallback.1 } else { end };
    (start, end)
}
