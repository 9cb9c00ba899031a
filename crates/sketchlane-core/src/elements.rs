//! Element definitions for the canvas.
//!
//! An [`Element`] is one drawable object. Shared fields (id, points, style,
//! rotation, z-order) live on the element; variant data lives in
//! [`ElementKind`].

use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = String;

/// Generate a fresh element id.
pub fn new_element_id() -> ElementId {
    Uuid::new_v4().to_string()
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke style for outlines and connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Line cap applied to open strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineCap {
    #[default]
    Round,
    Square,
    Butt,
}

/// Fill pattern style for closed shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillPattern {
    None,
    #[default]
    Solid,
    Hachure,
    CrossHatch,
    Dots,
}

/// Horizontal alignment of text lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// How a connector with more than two points is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectorStyle {
    /// Straight segments between vertices.
    #[default]
    Sharp,
    /// Quadratic (3 points) or Catmull-Rom cubic (4+ points) curve.
    Curved,
    /// Orthogonal polyline.
    Elbow,
}

/// Which axis an elbow connector travels first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElbowRoute {
    Horizontal,
    Vertical,
}

/// Marker drawn at a connector end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrowHead {
    #[default]
    None,
    Arrow,
    Triangle,
    TriangleOutline,
    Diamond,
    DiamondOutline,
    Circle,
    CircleOutline,
    Bar,
}

/// Kind of content hosted by an embedded region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedKind {
    #[default]
    RichText,
    Code,
    Diagram,
    Bookmark,
    StickyNote,
}

/// Style shared by every element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default)]
    pub line_cap: LineCap,
    /// Overall opacity, 0 (transparent) to 100 (opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    100.0
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::default(),
            line_cap: LineCap::default(),
            opacity: 100.0,
        }
    }
}

impl ElementStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        let rgba = self.stroke().to_rgba8();
        let alpha = (rgba.a as f64 * (self.opacity / 100.0).clamp(0.0, 1.0)) as u8;
        Color::from_rgba8(rgba.r, rgba.g, rgba.b, alpha)
    }
}

/// Geometry and fill of a box-like shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxProps {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<SerializableColor>,
    #[serde(default)]
    pub fill_pattern: FillPattern,
    #[serde(default)]
    pub corner_radius: f64,
}

impl BoxProps {
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            fill_color: None,
            fill_pattern: FillPattern::default(),
            corner_radius: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Overwrite position and size, normalizing negative extents.
    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.x = rect.x0;
        self.y = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }
}

/// Text content and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    /// Multiple of `font_size`.
    pub line_height: f64,
    #[serde(default)]
    pub letter_spacing: f64,
    #[serde(default)]
    pub text_align: TextAlign,
    /// Fixed-width box that wraps; otherwise width follows the content.
    #[serde(default)]
    pub is_text_box: bool,
    pub width: f64,
    pub height: f64,
}

impl TextProps {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    pub const DEFAULT_LINE_HEIGHT: f64 = 1.25;

    pub fn new(position: Point, text: impl Into<String>) -> Self {
        Self {
            x: position.x,
            y: position.y,
            text: text.into(),
            font_family: "Virgil".to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            line_height: Self::DEFAULT_LINE_HEIGHT,
            letter_spacing: 0.0,
            text_align: TextAlign::default(),
            is_text_box: false,
            width: 0.0,
            height: Self::DEFAULT_FONT_SIZE * Self::DEFAULT_LINE_HEIGHT,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Height of a single line.
    pub fn line_px(&self) -> f64 {
        self.font_size * self.line_height
    }
}

/// Connector routing and markers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorProps {
    #[serde(default)]
    pub connector_style: ConnectorStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elbow_route: Option<ElbowRoute>,
    #[serde(default)]
    pub start_marker: ArrowHead,
    #[serde(default)]
    pub end_marker: ArrowHead,
}

/// An embeddable content tile. The content editor itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedProps {
    pub area: BoxProps,
    #[serde(default)]
    pub content: EmbedKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ref: Option<String>,
}

/// Variant-specific element data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    FreehandStroke,
    Line(ConnectorProps),
    Arrow(ConnectorProps),
    Rectangle(BoxProps),
    Diamond(BoxProps),
    Ellipse(BoxProps),
    Text(TextProps),
    Frame(BoxProps),
    EmbeddedRegion(EmbedProps),
    #[serde(rename_all = "camelCase")]
    LaserTrace {
        created_at: u64,
    },
}

/// One drawable object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    /// Vertices for strokes and connectors; unused by box-like shapes.
    #[serde(default)]
    pub points: Vec<Point>,
    pub style: ElementStyle,
    /// Degrees about the element center. Stored unnormalized.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(kind: ElementKind, points: Vec<Point>, style: ElementStyle) -> Self {
        Self {
            id: new_element_id(),
            points,
            style,
            rotation: 0.0,
            z_index: None,
            kind,
        }
    }

    pub fn rectangle(rect: Rect, style: ElementStyle) -> Self {
        Self::new(ElementKind::Rectangle(BoxProps::from_rect(rect)), Vec::new(), style)
    }

    pub fn ellipse(rect: Rect, style: ElementStyle) -> Self {
        Self::new(ElementKind::Ellipse(BoxProps::from_rect(rect)), Vec::new(), style)
    }

    pub fn diamond(rect: Rect, style: ElementStyle) -> Self {
        Self::new(ElementKind::Diamond(BoxProps::from_rect(rect)), Vec::new(), style)
    }

    pub fn frame(rect: Rect, style: ElementStyle) -> Self {
        Self::new(ElementKind::Frame(BoxProps::from_rect(rect)), Vec::new(), style)
    }

    pub fn freehand(points: Vec<Point>, style: ElementStyle) -> Self {
        Self::new(ElementKind::FreehandStroke, points, style)
    }

    pub fn line(points: Vec<Point>, props: ConnectorProps, style: ElementStyle) -> Self {
        Self::new(ElementKind::Line(props), points, style)
    }

    pub fn arrow(points: Vec<Point>, props: ConnectorProps, style: ElementStyle) -> Self {
        Self::new(ElementKind::Arrow(props), points, style)
    }

    pub fn text(props: TextProps, style: ElementStyle) -> Self {
        Self::new(ElementKind::Text(props), Vec::new(), style)
    }

    pub fn laser(points: Vec<Point>, created_at: u64, style: ElementStyle) -> Self {
        Self::new(ElementKind::LaserTrace { created_at }, points, style)
    }

    /// Kebab-case variant tag, as serialized.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ElementKind::FreehandStroke => "freehand-stroke",
            ElementKind::Line(_) => "line",
            ElementKind::Arrow(_) => "arrow",
            ElementKind::Rectangle(_) => "rectangle",
            ElementKind::Diamond(_) => "diamond",
            ElementKind::Ellipse(_) => "ellipse",
            ElementKind::Text(_) => "text",
            ElementKind::Frame(_) => "frame",
            ElementKind::EmbeddedRegion(_) => "embedded-region",
            ElementKind::LaserTrace { .. } => "laser-trace",
        }
    }

    /// Minimum number of points this variant needs to render.
    pub fn min_points(&self) -> usize {
        match &self.kind {
            ElementKind::FreehandStroke | ElementKind::LaserTrace { .. } => 1,
            ElementKind::Line(_) | ElementKind::Arrow(_) => 2,
            _ => 0,
        }
    }

    /// Whether the element geometry is well formed enough to draw.
    pub fn is_renderable(&self) -> bool {
        if self.points.len() < self.min_points() {
            return false;
        }
        if !self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return false;
        }
        match self.box_rect() {
            Some(rect) => {
                rect.x0.is_finite()
                    && rect.y0.is_finite()
                    && rect.width() > 0.0
                    && rect.height() > 0.0
            }
            None => true,
        }
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, ElementKind::Line(_) | ElementKind::Arrow(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    pub fn is_laser(&self) -> bool {
        matches!(self.kind, ElementKind::LaserTrace { .. })
    }

    /// Strokes, connectors and laser traces: geometry is the point list.
    pub fn is_point_based(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::FreehandStroke
                | ElementKind::Line(_)
                | ElementKind::Arrow(_)
                | ElementKind::LaserTrace { .. }
        )
    }

    /// Shapes whose geometry is an `x,y,width,height` box (text excluded).
    pub fn is_box_like(&self) -> bool {
        self.box_props().is_some()
    }

    pub fn box_props(&self) -> Option<&BoxProps> {
        match &self.kind {
            ElementKind::Rectangle(b)
            | ElementKind::Diamond(b)
            | ElementKind::Ellipse(b)
            | ElementKind::Frame(b) => Some(b),
            ElementKind::EmbeddedRegion(e) => Some(&e.area),
            _ => None,
        }
    }

    pub fn box_props_mut(&mut self) -> Option<&mut BoxProps> {
        match &mut self.kind {
            ElementKind::Rectangle(b)
            | ElementKind::Diamond(b)
            | ElementKind::Ellipse(b)
            | ElementKind::Frame(b) => Some(b),
            ElementKind::EmbeddedRegion(e) => Some(&mut e.area),
            _ => None,
        }
    }

    pub fn text_props(&self) -> Option<&TextProps> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_props_mut(&mut self) -> Option<&mut TextProps> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn connector_props(&self) -> Option<&ConnectorProps> {
        match &self.kind {
            ElementKind::Line(c) | ElementKind::Arrow(c) => Some(c),
            _ => None,
        }
    }

    pub fn connector_props_mut(&mut self) -> Option<&mut ConnectorProps> {
        match &mut self.kind {
            ElementKind::Line(c) | ElementKind::Arrow(c) => Some(c),
            _ => None,
        }
    }

    /// Unrotated box for box-like shapes and text.
    pub fn box_rect(&self) -> Option<Rect> {
        match &self.kind {
            ElementKind::Text(t) => Some(t.rect()),
            _ => self.box_props().map(BoxProps::rect),
        }
    }

    /// Overwrite the unrotated box of a box-like shape or text element.
    pub fn set_box_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        if let Some(b) = self.box_props_mut() {
            b.set_rect(rect);
        } else if let Some(t) = self.text_props_mut() {
            t.x = rect.x0;
            t.y = rect.y0;
            t.width = rect.width();
            t.height = rect.height();
        }
    }

    /// Move the element by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
        if let Some(b) = self.box_props_mut() {
            b.x += delta.x;
            b.y += delta.y;
        } else if let Some(t) = self.text_props_mut() {
            t.x += delta.x;
            t.y += delta.y;
        }
    }

    pub fn created_at(&self) -> Option<u64> {
        match self.kind {
            ElementKind::LaserTrace { created_at } => Some(created_at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_normalizes_rect() {
        let el = Element::rectangle(Rect::new(100.0, 50.0, 0.0, 0.0), ElementStyle::default());
        let b = el.box_props().unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Element::freehand(vec![Point::ZERO], ElementStyle::default());
        let b = Element::freehand(vec![Point::ZERO], ElementStyle::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_renderable_rules() {
        let style = ElementStyle::default();
        assert!(!Element::line(vec![Point::ZERO], ConnectorProps::default(), style.clone()).is_renderable());
        assert!(Element::line(
            vec![Point::ZERO, Point::new(10.0, 0.0)],
            ConnectorProps::default(),
            style.clone()
        )
        .is_renderable());
        assert!(!Element::freehand(Vec::new(), style.clone()).is_renderable());
        assert!(!Element::rectangle(Rect::new(0.0, 0.0, 0.0, 10.0), style.clone()).is_renderable());
        assert!(Element::ellipse(Rect::new(0.0, 0.0, 5.0, 10.0), style).is_renderable());
    }

    #[test]
    fn test_serialized_tag() {
        let el = Element::diamond(Rect::new(0.0, 0.0, 10.0, 10.0), ElementStyle::default());
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["kind"]["type"], "diamond");
        assert_eq!(json["kind"]["width"], 10.0);

        let laser = Element::laser(vec![Point::ZERO], 42, ElementStyle::default());
        let json = serde_json::to_value(&laser).unwrap();
        assert_eq!(json["kind"]["type"], "laser-trace");
        assert_eq!(json["kind"]["createdAt"], 42);

        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back.created_at(), Some(42));
    }

    #[test]
    fn test_translate_moves_points_and_box() {
        let mut el = Element::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), ElementStyle::default());
        el.translate(Vec2::new(5.0, -5.0));
        assert_eq!(el.box_rect(), Some(Rect::new(5.0, -5.0, 15.0, 5.0)));

        let mut stroke = Element::freehand(vec![Point::new(1.0, 1.0)], ElementStyle::default());
        stroke.translate(Vec2::new(1.0, 2.0));
        assert_eq!(stroke.points[0], Point::new(2.0, 3.0));
    }

    #[test]
    fn test_hex_colors() {
        let c = SerializableColor::from_hex("#ff8000").unwrap();
        assert_eq!(c, SerializableColor::new(255, 128, 0, 255));
        assert_eq!(c.to_hex(), "#ff8000");
        assert_eq!(SerializableColor::from_hex("#00000080").unwrap().a, 128);
        assert!(SerializableColor::from_hex("nope").is_none());
    }
}
