//! Drawing tools.

use serde::{Deserialize, Serialize};

use crate::geometry::CursorKind;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    #[default]
    Select,
    Freehand,
    Line,
    Arrow,
    Rectangle,
    Diamond,
    Ellipse,
    Text,
    Erase,
    Laser,
    Pan,
}

impl Tool {
    pub const ALL: [Tool; 11] = [
        Tool::Select,
        Tool::Freehand,
        Tool::Line,
        Tool::Arrow,
        Tool::Rectangle,
        Tool::Diamond,
        Tool::Ellipse,
        Tool::Text,
        Tool::Erase,
        Tool::Laser,
        Tool::Pan,
    ];

    /// Rectangle, diamond and ellipse.
    pub fn draws_box(self) -> bool {
        matches!(self, Tool::Rectangle | Tool::Diamond | Tool::Ellipse)
    }

    pub fn draws_connector(self) -> bool {
        matches!(self, Tool::Line | Tool::Arrow)
    }

    /// Tools that collect a point per pointer move.
    pub fn draws_stroke(self) -> bool {
        matches!(self, Tool::Freehand | Tool::Laser)
    }

    /// Whether this tool creates a draft element on pointer-down.
    pub fn draws(self) -> bool {
        self.draws_box() || self.draws_connector() || self.draws_stroke()
    }

    /// Tools usable on a read-only canvas.
    pub fn allowed_read_only(self) -> bool {
        matches!(self, Tool::Pan)
    }

    pub fn cursor(self) -> CursorKind {
        match self {
            Tool::Select => CursorKind::Default,
            Tool::Text => CursorKind::Text,
            Tool::Pan => CursorKind::Grab,
            _ => CursorKind::Crosshair,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Freehand => "Draw",
            Tool::Line => "Line",
            Tool::Arrow => "Arrow",
            Tool::Rectangle => "Rectangle",
            Tool::Diamond => "Diamond",
            Tool::Ellipse => "Ellipse",
            Tool::Text => "Text",
            Tool::Erase => "Eraser",
            Tool::Laser => "Laser",
            Tool::Pan => "Hand",
        }
    }
}
