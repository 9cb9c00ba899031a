//! Drafts: elements being drawn that are not in the store yet.

use kurbo::{Point, Rect, Vec2};

use crate::elements::{ConnectorStyle, Element, SerializableColor};
use crate::geometry::{rect_from_points, rotate_vec, simplify_polyline, snap_angle};
use crate::interaction::tools::Tool;
use crate::options::CanvasOptions;

/// Box drafts must be larger than this in both directions to commit.
pub const MIN_BOX_SIZE: f64 = 2.0;

/// Angle step for shift-snapped connectors, in degrees.
pub const ANGLE_SNAP_STEP: f64 = 15.0;

/// RDP tolerance applied to freehand strokes on commit.
pub const FREEHAND_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// Connector endpoints closer than this count as the same point.
pub const MIN_CONNECTOR_LENGTH: f64 = 1e-3;

/// Laser traces are always drawn in this color.
pub const LASER_COLOR: SerializableColor = SerializableColor {
    r: 255,
    g: 59,
    b: 48,
    a: 255,
};

/// A draft being drawn with a creation tool.
#[derive(Debug, Clone)]
pub struct DraftState {
    pub tool: Tool,
    pub start: Point,
    pub element: Element,
}

impl DraftState {
    /// Start a draft for `tool` at `start`. Non-drawing tools give `None`.
    pub fn begin(tool: Tool, start: Point, options: &CanvasOptions, now_ms: u64) -> Option<Self> {
        let style = options.element_style();
        let element = match tool {
            Tool::Rectangle | Tool::Diamond | Tool::Ellipse => {
                let rect = Rect::from_points(start, start);
                let mut el = match tool {
                    Tool::Rectangle => Element::rectangle(rect, style),
                    Tool::Diamond => Element::diamond(rect, style),
                    _ => Element::ellipse(rect, style),
                };
                if let Some(b) = el.box_props_mut() {
                    b.fill_color = options.fill_color;
                    b.fill_pattern = options.fill_pattern;
                    b.corner_radius = options.corner_radius;
                }
                el
            }
            Tool::Line => Element::line(vec![start, start], options.connector_props(false), style),
            Tool::Arrow => Element::arrow(vec![start, start], options.connector_props(true), style),
            Tool::Freehand => Element::freehand(vec![start], style),
            Tool::Laser => {
                let mut style = style;
                style.stroke_color = LASER_COLOR;
                Element::laser(vec![start], now_ms, style)
            }
            _ => return None,
        };
        Some(Self {
            tool,
            start,
            element,
        })
    }

    /// Follow the pointer. `shift` locks squares and snaps connector angles.
    pub fn update(&mut self, world: Point, shift: bool) {
        match self.tool {
            Tool::Rectangle | Tool::Diamond | Tool::Ellipse => {
                let mut d = world - self.start;
                if shift {
                    let side = d.x.abs().max(d.y.abs());
                    d = Vec2::new(side.copysign(d.x), side.copysign(d.y));
                }
                self.element
                    .set_box_rect(rect_from_points(self.start, self.start + d));
            }
            Tool::Line | Tool::Arrow => {
                let end = if shift {
                    snap_segment(self.start, world)
                } else {
                    world
                };
                if let Some(last) = self.element.points.last_mut() {
                    *last = end;
                }
            }
            Tool::Freehand | Tool::Laser => {
                if self.element.points.last() != Some(&world) {
                    self.element.points.push(world);
                }
            }
            _ => {}
        }
    }

    /// Whether the draft is big enough to keep.
    pub fn meets_threshold(&self) -> bool {
        match self.tool {
            Tool::Rectangle | Tool::Diamond | Tool::Ellipse => self
                .element
                .box_rect()
                .is_some_and(|r| r.width() > MIN_BOX_SIZE && r.height() > MIN_BOX_SIZE),
            Tool::Line | Tool::Arrow => match self.element.points.as_slice() {
                [a, b] => (*b - *a).hypot() > MIN_CONNECTOR_LENGTH,
                _ => false,
            },
            Tool::Freehand | Tool::Laser => !self.element.points.is_empty(),
            _ => false,
        }
    }

    /// Finish the draft. Returns the element to add, or `None` to discard.
    pub fn commit(self) -> Option<Element> {
        if !self.meets_threshold() {
            log::debug!("Discarding {} draft below size threshold", self.element.type_name());
            return None;
        }
        let mut el = self.element;
        match self.tool {
            Tool::Freehand => {
                el.points = simplify_polyline(&el.points, FREEHAND_SIMPLIFY_TOLERANCE);
            }
            Tool::Line | Tool::Arrow => {
                let is_elbow = el
                    .connector_props()
                    .is_some_and(|c| c.connector_style == ConnectorStyle::Elbow);
                if let ([a, b], true) = (el.points.as_slice(), is_elbow) {
                    let (a, b) = (*a, *b);
                    // Diagonal elbows get a control point so they route orthogonally.
                    if (a.x - b.x).abs() > MIN_CONNECTOR_LENGTH && (a.y - b.y).abs() > MIN_CONNECTOR_LENGTH {
                        el.points.insert(1, a.midpoint(b));
                    }
                }
            }
            _ => {}
        }
        Some(el)
    }
}

/// Snap the direction of `start -> end` to [`ANGLE_SNAP_STEP`], keeping length.
pub fn snap_segment(start: Point, end: Point) -> Point {
    let d = end - start;
    let length = d.hypot();
    if length < f64::EPSILON {
        return end;
    }
    let angle = d.y.atan2(d.x).to_degrees();
    let snapped = snap_angle(angle, ANGLE_SNAP_STEP);
    start + rotate_vec(Vec2::new(length, 0.0), snapped)
}
