//! Pointer-driven interaction engine.
//!
//! [`Editor`] consumes input events and produces element store ops, presence
//! updates and transient draw state. Exactly one [`InteractionState`] is
//! active at a time.

pub mod draw;
pub mod editor;
pub mod erase;
pub mod input;
pub mod laser;
pub mod select;
pub mod text_edit;
pub mod tools;
pub mod transform;

pub use editor::Editor;

use kurbo::Point;

use crate::elements::ElementId;
use draw::DraftState;
use erase::EraseState;
use select::BoxSelect;
use text_edit::TextEditSession;
use transform::{ConnectorEditState, DragState, ResizeState, RotateState};

/// The single active interaction.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing(DraftState),
    Dragging(DragState),
    Resizing(ResizeState),
    Rotating(RotateState),
    BoxSelecting(BoxSelect),
    ConnectorEditing(ConnectorEditState),
    Erasing(EraseState),
    /// Screen position of the previous pan sample.
    Panning { last_screen: Point },
    EditingText(TextEditSession),
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Drawing(_) => "drawing",
            InteractionState::Dragging(_) => "dragging",
            InteractionState::Resizing(_) => "resizing",
            InteractionState::Rotating(_) => "rotating",
            InteractionState::BoxSelecting(_) => "box-selecting",
            InteractionState::ConnectorEditing(_) => "connector-editing",
            InteractionState::Erasing(_) => "erasing",
            InteractionState::Panning { .. } => "panning",
            InteractionState::EditingText(_) => "editing-text",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }
}

/// The local viewer's selection, in the order elements were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    /// Add `id` if absent, remove it otherwise.
    pub fn toggle(&mut self, id: &str) {
        if self.contains(id) {
            self.ids.retain(|s| s != id);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Replace the selection, dropping duplicates.
    pub fn set(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.ids.clear();
        for id in ids {
            if !self.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|s| s != id);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|s| keep(s));
    }
}
