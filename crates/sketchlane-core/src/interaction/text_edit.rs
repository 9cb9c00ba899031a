//! In-place text editing.
//!
//! The session edits a private copy of the element; the store only sees the
//! result when the session finishes. The copy is what gets published to peers
//! as the draft element while typing.

use kurbo::Point;

use crate::elements::{Element, ElementId, ElementStyle, TextProps};
use crate::geometry::TextMetrics;

/// What finishing a text edit does to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEditOutcome {
    Add(Element),
    Update { original: Element, updated: Element },
    Delete(ElementId),
    /// A new text left empty; nothing was ever stored.
    Discard,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct TextEditSession {
    original: Option<Element>,
    draft: Element,
    /// Caret position in characters.
    caret: usize,
}

impl TextEditSession {
    /// Start typing a brand-new text element at `position`.
    pub fn new_text(position: Point, template: TextProps, style: ElementStyle) -> Self {
        let mut props = template;
        props.x = position.x;
        props.y = position.y;
        props.text.clear();
        Self {
            original: None,
            draft: Element::text(props, style),
            caret: 0,
        }
    }

    /// Edit an existing element. Returns `None` if it is not text.
    pub fn existing(element: &Element) -> Option<Self> {
        let caret = element.text_props()?.text.chars().count();
        Some(Self {
            original: Some(element.clone()),
            draft: element.clone(),
            caret,
        })
    }

    pub fn id(&self) -> &str {
        &self.draft.id
    }

    pub fn draft(&self) -> &Element {
        &self.draft
    }

    pub fn original(&self) -> Option<&Element> {
        self.original.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn text(&self) -> &str {
        self.draft.text_props().map_or("", |t| t.text.as_str())
    }

    fn byte_offset(text: &str, chars: usize) -> usize {
        text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
    }

    fn edit(&mut self, metrics: &mut TextMetrics, f: impl FnOnce(&mut String, &mut usize)) {
        if let Some(props) = self.draft.text_props_mut() {
            f(&mut props.text, &mut self.caret);
            metrics.relayout(props);
        }
    }

    /// Insert typed text at the caret.
    pub fn insert(&mut self, s: &str, metrics: &mut TextMetrics) {
        let s: String = s.chars().filter(|c| *c == '\n' || !c.is_control()).collect();
        if s.is_empty() {
            return;
        }
        self.edit(metrics, |text, caret| {
            let at = Self::byte_offset(text, *caret);
            text.insert_str(at, &s);
            *caret += s.chars().count();
        });
    }

    pub fn newline(&mut self, metrics: &mut TextMetrics) {
        self.insert("\n", metrics);
    }

    pub fn backspace(&mut self, metrics: &mut TextMetrics) {
        if self.caret == 0 {
            return;
        }
        self.edit(metrics, |text, caret| {
            let at = Self::byte_offset(text, *caret - 1);
            text.remove(at);
            *caret -= 1;
        });
    }

    pub fn delete_forward(&mut self, metrics: &mut TextMetrics) {
        if self.caret >= self.text().chars().count() {
            return;
        }
        self.edit(metrics, |text, caret| {
            let at = Self::byte_offset(text, *caret);
            text.remove(at);
        });
    }

    pub fn move_left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.caret = (self.caret + 1).min(self.text().chars().count());
    }

    /// End the session.
    ///
    /// Whitespace-only content deletes a stored element and discards a new one.
    pub fn finish(self) -> TextEditOutcome {
        let blank = self.text().trim().is_empty();
        match (self.original, blank) {
            (Some(original), true) => TextEditOutcome::Delete(original.id),
            (None, true) => TextEditOutcome::Discard,
            (None, false) => TextEditOutcome::Add(self.draft),
            (Some(original), false) if original == self.draft => TextEditOutcome::Unchanged,
            (Some(original), false) => TextEditOutcome::Update {
                original,
                updated: self.draft,
            },
        }
    }
}
