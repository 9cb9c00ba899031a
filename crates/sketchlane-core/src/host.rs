//! Hooks the host registers with the editor.
//!
//! The host receives a [`ViewportSetter`] it can call from outside the event
//! loop (e.g. a "zoom to element" button). Calls are queued and applied on
//! the next [`Editor::tick`](crate::Editor::tick).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kurbo::Vec2;

use crate::elements::{Element, ElementId};

/// A viewport change requested by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportCommand {
    Set { pan: Vec2, zoom: f64 },
    FocusElement(ElementId),
}

/// Handle for driving the viewport from the host.
#[derive(Clone, Default)]
pub struct ViewportSetter {
    queue: Rc<RefCell<Vec<ViewportCommand>>>,
}

impl ViewportSetter {
    pub fn set(&self, pan: Vec2, zoom: f64) {
        self.queue.borrow_mut().push(ViewportCommand::Set { pan, zoom });
    }

    /// Center the element in view, keeping the current zoom.
    pub fn focus_element(&self, id: impl Into<ElementId>) {
        self.queue
            .borrow_mut()
            .push(ViewportCommand::FocusElement(id.into()));
    }

    pub(crate) fn drain(&self) -> Vec<ViewportCommand> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

impl fmt::Debug for ViewportSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportSetter")
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

/// Called with the selected elements whenever the selection changes.
pub type SelectionListener = Box<dyn FnMut(&[Element])>;

#[derive(Default)]
pub(crate) struct HostHooks {
    pub(crate) setter: ViewportSetter,
    listeners: Vec<SelectionListener>,
    last_notified: Vec<ElementId>,
}

impl HostHooks {
    pub(crate) fn add_selection_listener(&mut self, listener: SelectionListener) {
        self.listeners.push(listener);
    }

    /// Notify listeners if `ids` differs from the last notification.
    /// Returns whether anything was sent.
    pub(crate) fn selection_changed(&mut self, ids: &[ElementId], elements: &[Element]) -> bool {
        if self.last_notified == ids {
            return false;
        }
        self.last_notified = ids.to_vec();
        for listener in &mut self.listeners {
            listener(elements);
        }
        true
    }
}

impl fmt::Debug for HostHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHooks")
            .field("setter", &self.setter)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
