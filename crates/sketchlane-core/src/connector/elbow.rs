//! Orthogonal ("elbow") routing.
//!
//! A three-point elbow (start, control, end) is drawn as a synthesized
//! four-point route. Four or more points are an explicit vertex chain edited
//! through its runs: maximal stretches of collinear segments on one axis.

use kurbo::{Point, Vec2};

use super::End;
use crate::elements::ElbowRoute;
use crate::geometry::handles::HANDLE_SIZE;

/// Consecutive points closer than this are merged before editing.
pub const MERGE_EPSILON: f64 = 1.0;

/// Coordinate difference still treated as the same axis.
pub const AXIS_EPSILON: f64 = 0.5;

/// Screen length a run needs before it gets its own drag handle: room for
/// the run handle and the handles at both of its ends.
pub const RUN_HANDLE_MIN_SCREEN_LEN: f64 = 3.0 * HANDLE_SIZE;

/// Direction of an orthogonal segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A maximal stretch of same-axis segments between vertex `first` and
/// vertex `last` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub axis: Axis,
    pub first: usize,
    pub last: usize,
}

/// A draggable run handle at the middle of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunHandle {
    pub run: usize,
    pub axis: Axis,
    pub position: Point,
}

/// Which axis the route travels first when not set explicitly.
pub fn infer_route(start: Point, end: Point) -> ElbowRoute {
    if (end.x - start.x).abs() >= (end.y - start.y).abs() {
        ElbowRoute::Horizontal
    } else {
        ElbowRoute::Vertical
    }
}

/// Orthogonal route through the control point.
///
/// Horizontal-first routes put the vertical leg at `control.x`;
/// vertical-first routes put the horizontal leg at `control.y`.
pub fn synthesize_route(
    start: Point,
    control: Point,
    end: Point,
    route: Option<ElbowRoute>,
) -> [Point; 4] {
    match route.unwrap_or_else(|| infer_route(start, end)) {
        ElbowRoute::Horizontal => [
            start,
            Point::new(control.x, start.y),
            Point::new(control.x, end.y),
            end,
        ],
        ElbowRoute::Vertical => [
            start,
            Point::new(start.x, control.y),
            Point::new(end.x, control.y),
            end,
        ],
    }
}

/// Axis of a segment, `None` when it is diagonal or has no length.
pub fn segment_axis(a: Point, b: Point, eps: f64) -> Option<Axis> {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    if dy <= eps && dx > eps {
        Some(Axis::Horizontal)
    } else if dx <= eps && dy > eps {
        Some(Axis::Vertical)
    } else {
        None
    }
}

/// Whether every segment is axis-aligned within `eps`.
pub fn is_orthogonal(points: &[Point], eps: f64) -> bool {
    points
        .windows(2)
        .all(|w| (w[0].x - w[1].x).abs() <= eps || (w[0].y - w[1].y).abs() <= eps)
}

/// Drop points closer than `eps` to the previously kept one. Both endpoints
/// always survive.
pub fn merge_close_points(points: &[Point], eps: f64) -> Vec<Point> {
    let n = points.len();
    let mut out: Vec<Point> = Vec::with_capacity(n);
    for (i, p) in points.iter().enumerate() {
        let close = out.last().is_some_and(|last| (*p - *last).hypot() < eps);
        if !close {
            out.push(*p);
        } else if i == n - 1 {
            if out.len() > 1 {
                out.pop();
            }
            out.push(*p);
        }
    }
    out
}

/// Maximal same-axis runs of a vertex chain. Diagonal segments form no run.
pub fn compute_runs(points: &[Point]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;
    for i in 0..points.len().saturating_sub(1) {
        let axis = segment_axis(points[i], points[i + 1], AXIS_EPSILON);
        match (&mut current, axis) {
            (Some(run), Some(axis)) if run.axis == axis && run.last == i => {
                run.last = i + 1;
            }
            _ => {
                runs.extend(current.take());
                current = axis.map(|axis| Run {
                    axis,
                    first: i,
                    last: i + 1,
                });
            }
        }
    }
    runs.extend(current);
    runs
}

/// Handles for the runs that are long enough on screen at `zoom`.
pub fn run_handles(points: &[Point], zoom: f64) -> Vec<RunHandle> {
    let merged = merge_close_points(points, MERGE_EPSILON);
    compute_runs(&merged)
        .into_iter()
        .enumerate()
        .filter_map(|(index, run)| {
            let a = merged[run.first];
            let b = merged[run.last];
            let screen_len = (b - a).hypot() * zoom;
            (screen_len >= RUN_HANDLE_MIN_SCREEN_LEN).then(|| RunHandle {
                run: index,
                axis: run.axis,
                position: a.midpoint(b),
            })
        })
        .collect()
}

/// Slide one run perpendicular to its axis.
///
/// Postcondition: the first and last points of the result equal those of
/// the input. A run touching a global endpoint gets a duplicate of that
/// endpoint inserted next to it first, so only the duplicate moves and the
/// segment from the endpoint to the slid run stays axis-aligned.
pub fn drag_run(points: &[Point], run_index: usize, delta: Vec2) -> Vec<Point> {
    let mut pts = merge_close_points(points, MERGE_EPSILON);
    let runs = compute_runs(&pts);
    let Some(run) = runs.get(run_index).copied() else {
        return pts;
    };
    let (mut first, mut last) = (run.first, run.last);
    if first == 0 {
        pts.insert(1, pts[0]);
        first = 1;
        last += 1;
    }
    if last == pts.len() - 1 {
        let end = pts[last];
        pts.insert(last, end);
    }
    let offset = match run.axis {
        Axis::Horizontal => Vec2::new(0.0, delta.y),
        Axis::Vertical => Vec2::new(delta.x, 0.0),
    };
    for p in &mut pts[first..=last] {
        *p += offset;
    }
    pts
}

/// Remove points that no longer turn a corner.
pub fn simplify(points: &[Point]) -> Vec<Point> {
    let mut pts = merge_close_points(points, MERGE_EPSILON);
    let mut i = 1;
    while i + 1 < pts.len() {
        let before = segment_axis(pts[i - 1], pts[i], AXIS_EPSILON);
        let after = segment_axis(pts[i], pts[i + 1], AXIS_EPSILON);
        if before.is_some() && before == after {
            pts.remove(i);
            i = i.saturating_sub(1).max(1);
        } else {
            i += 1;
        }
    }
    pts
}

/// Move one endpoint of an explicit chain and bend its neighbor so the
/// first or last segment keeps its axis.
pub fn drag_endpoint(points: &[Point], end: End, target: Point) -> Vec<Point> {
    let mut pts = points.to_vec();
    let n = pts.len();
    if n < 2 {
        return pts;
    }
    let (tip, next) = match end {
        End::Start => (0, 1),
        End::End => (n - 1, n - 2),
    };
    let axis = segment_axis(pts[tip], pts[next], AXIS_EPSILON);
    pts[tip] = target;
    match axis {
        Some(Axis::Horizontal) => pts[next].y = target.y,
        Some(Axis::Vertical) => pts[next].x = target.x,
        None => {
            let corner = Point::new(target.x, pts[next].y);
            match end {
                End::Start => pts.insert(1, corner),
                End::End => pts.insert(n - 1, corner),
            }
        }
    }
    pts
}
