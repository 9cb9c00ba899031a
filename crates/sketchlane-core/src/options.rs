//! Read-only canvas options passed in by the host.

use serde::{Deserialize, Serialize};

use crate::elements::{
    ArrowHead, ConnectorProps, ConnectorStyle, ElementStyle, FillPattern, LineCap,
    SerializableColor, StrokeStyle, TextAlign, TextProps,
};
use crate::error::{CoreResult, OptionsError};
use crate::interaction::tools::Tool;

/// Background drawn behind the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundPattern {
    None,
    #[default]
    Dots,
    Lines,
    Grid,
}

/// Tool and style configuration. Every field has a default so a host can
/// send only what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasOptions {
    pub tool: Tool,
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub line_cap: LineCap,
    pub fill_color: Option<SerializableColor>,
    pub fill_pattern: FillPattern,
    /// 0 to 100.
    pub opacity: f64,
    pub corner_radius: f64,
    pub connector_style: ConnectorStyle,
    pub start_arrow_head: ArrowHead,
    pub end_arrow_head: ArrowHead,
    pub font_family: String,
    pub font_size: f64,
    pub text_align: TextAlign,
    pub letter_spacing: f64,
    pub line_height: f64,
    pub background: BackgroundPattern,
    /// Stroke width of the eraser; its hit radius is twice this.
    pub eraser_width: f64,
    pub read_only: bool,
    pub show_remote_cursors: bool,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            tool: Tool::Select,
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            line_cap: LineCap::Round,
            fill_color: None,
            fill_pattern: FillPattern::Solid,
            opacity: 100.0,
            corner_radius: 0.0,
            connector_style: ConnectorStyle::Sharp,
            start_arrow_head: ArrowHead::None,
            end_arrow_head: ArrowHead::Arrow,
            font_family: "Virgil".to_string(),
            font_size: TextProps::DEFAULT_FONT_SIZE,
            text_align: TextAlign::Left,
            letter_spacing: 0.0,
            line_height: TextProps::DEFAULT_LINE_HEIGHT,
            background: BackgroundPattern::Dots,
            eraser_width: 16.0,
            read_only: false,
            show_remote_cursors: true,
        }
    }
}

impl CanvasOptions {
    /// Parse an options record from JSON and validate it.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let options: CanvasOptions = serde_json::from_str(json)?;
        options.validate()
    }

    /// Reject unusable values and clamp the ones with a natural range.
    pub fn validate(mut self) -> CoreResult<Self> {
        if !(self.stroke_width.is_finite() && self.stroke_width > 0.0) {
            return Err(OptionsError::Invalid(format!(
                "strokeWidth must be positive, got {}",
                self.stroke_width
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(OptionsError::Invalid(format!(
                "fontSize must be positive, got {}",
                self.font_size
            )));
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(OptionsError::Invalid(format!(
                "lineHeight must be positive, got {}",
                self.line_height
            )));
        }
        if !(self.eraser_width.is_finite() && self.eraser_width > 0.0) {
            return Err(OptionsError::Invalid(format!(
                "eraserWidth must be positive, got {}",
                self.eraser_width
            )));
        }
        self.opacity = if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 100.0)
        } else {
            100.0
        };
        self.corner_radius = self.corner_radius.max(0.0);
        Ok(self)
    }

    /// Style applied to newly drawn elements.
    pub fn element_style(&self) -> ElementStyle {
        ElementStyle {
            stroke_color: self.stroke_color,
            stroke_width: self.stroke_width,
            stroke_style: self.stroke_style,
            line_cap: self.line_cap,
            opacity: self.opacity,
        }
    }

    /// Connector settings applied to newly drawn lines and arrows.
    pub fn connector_props(&self, is_arrow: bool) -> ConnectorProps {
        ConnectorProps {
            connector_style: self.connector_style,
            elbow_route: None,
            start_marker: if is_arrow { self.start_arrow_head } else { ArrowHead::None },
            end_marker: if is_arrow { self.end_arrow_head } else { ArrowHead::None },
        }
    }

    /// Radius of the eraser in world units.
    pub fn eraser_radius(&self) -> f64 {
        2.0 * self.eraser_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = CanvasOptions::from_json(r#"{"tool":"rectangle","strokeWidth":4}"#).unwrap();
        assert_eq!(options.tool, Tool::Rectangle);
        assert!((options.stroke_width - 4.0).abs() < f64::EPSILON);
        assert!(options.show_remote_cursors);
        assert_eq!(options.background, BackgroundPattern::Dots);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let options = CanvasOptions::from_json(r#"{"opacity":250}"#).unwrap();
        assert!((options.opacity - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CanvasOptions::from_json(r#"{"strokeWidth":0}"#),
            Err(OptionsError::Invalid(_))
        ));
        assert!(matches!(
            CanvasOptions::from_json("{not json"),
            Err(OptionsError::Parse(_))
        ));
    }

    #[test]
    fn test_default_eraser_radius() {
        assert!((CanvasOptions::default().eraser_radius() - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lines_carry_no_markers() {
        let options = CanvasOptions::default();
        assert_eq!(options.connector_props(false).end_marker, ArrowHead::None);
        assert_eq!(options.connector_props(true).end_marker, ArrowHead::Arrow);
    }
}
