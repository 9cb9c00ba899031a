//! Element store: the ordered element collection and its mutation messages.
//!
//! [`Document`] is the editor's local copy. Every local mutation is also
//! recorded as a [`StoreOp`] for the host to forward to the shared store;
//! inbound replicated ops are applied back through [`Document::apply`].

use std::collections::HashMap;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::elements::{Element, ElementId, ElementKind, ElementStyle};
use crate::geometry::{combined_bounds, hit_test, rect_contains_rect, rotated_bounds};

/// Partial element update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
}

impl ElementPatch {
    /// Fields that differ between `old` and `new`; `None` if nothing changed.
    pub fn diff(old: &Element, new: &Element) -> Option<Self> {
        let patch = Self {
            points: (old.points != new.points).then(|| new.points.clone()),
            style: (old.style != new.style).then(|| new.style.clone()),
            rotation: (old.rotation != new.rotation).then_some(new.rotation),
            z_index: if old.z_index != new.z_index { new.z_index } else { None },
            kind: (old.kind != new.kind).then(|| new.kind.clone()),
        };
        (!patch.is_empty()).then_some(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_none()
            && self.style.is_none()
            && self.rotation.is_none()
            && self.z_index.is_none()
            && self.kind.is_none()
    }

    pub fn apply_to(&self, element: &mut Element) {
        if let Some(points) = &self.points {
            element.points = points.clone();
        }
        if let Some(style) = &self.style {
            element.style = style.clone();
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(z) = self.z_index {
            element.z_index = Some(z);
        }
        if let Some(kind) = &self.kind {
            element.kind = kind.clone();
        }
    }
}

/// One element store mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    Add { element: Element },
    Update { id: ElementId, patch: ElementPatch },
    Delete { id: ElementId },
}

impl StoreOp {
    pub fn id(&self) -> &str {
        match self {
            StoreOp::Add { element } => &element.id,
            StoreOp::Update { id, .. } | StoreOp::Delete { id } => id,
        }
    }
}

/// The element store collaborator. Calls are fire-and-forget.
pub trait ElementSink {
    fn add_element(&mut self, element: Element);
    fn update_element(&mut self, id: &str, patch: ElementPatch);
    fn delete_element(&mut self, id: &str);

    /// Replay a recorded op.
    fn apply_op(&mut self, op: StoreOp) {
        match op {
            StoreOp::Add { element } => self.add_element(element),
            StoreOp::Update { id, patch } => self.update_element(&id, patch),
            StoreOp::Delete { id } => self.delete_element(&id),
        }
    }
}

/// Records ops in order for later forwarding.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    ops: Vec<StoreOp>,
}

impl Outbox {
    pub fn take(&mut self) -> Vec<StoreOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl ElementSink for Outbox {
    fn add_element(&mut self, element: Element) {
        self.ops.push(StoreOp::Add { element });
    }

    fn update_element(&mut self, id: &str, patch: ElementPatch) {
        self.ops.push(StoreOp::Update {
            id: id.to_string(),
            patch,
        });
    }

    fn delete_element(&mut self, id: &str) {
        self.ops.push(StoreOp::Delete { id: id.to_string() });
    }
}

/// Ordered element collection.
///
/// Paint order is insertion order, overridden by `z_index` where set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Insert or replace an element.
    pub fn insert(&mut self, element: Element) {
        if !self.elements.contains_key(&element.id) {
            self.order.push(element.id.clone());
        }
        self.elements.insert(element.id.clone(), element);
    }

    /// Replace an existing element. Unknown ids are ignored.
    pub fn replace(&mut self, element: Element) -> bool {
        match self.elements.get_mut(&element.id) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Element> {
        let removed = self.elements.remove(id)?;
        self.order.retain(|e| e != id);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
    }

    /// Apply an op, inbound or local. Stale ids are skipped.
    pub fn apply(&mut self, op: &StoreOp) -> bool {
        match op {
            StoreOp::Add { element } => {
                self.insert(element.clone());
                true
            }
            StoreOp::Update { id, patch } => match self.elements.get_mut(id) {
                Some(element) => {
                    patch.apply_to(element);
                    true
                }
                None => {
                    log::warn!("Skipping update for unknown element {id}");
                    false
                }
            },
            StoreOp::Delete { id } => self.remove(id).is_some(),
        }
    }

    fn sort_key(&self, id: &str, position: usize) -> i64 {
        self.elements
            .get(id)
            .and_then(|e| e.z_index)
            .unwrap_or(position as i64)
    }

    /// Ids back to front.
    pub fn ordered_ids(&self) -> Vec<ElementId> {
        let mut keyed: Vec<(i64, usize, &ElementId)> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (self.sort_key(id, i), i, id))
            .collect();
        keyed.sort_by_key(|(key, position, _)| (*key, *position));
        keyed.into_iter().map(|(_, _, id)| id.clone()).collect()
    }

    /// Elements back to front.
    pub fn ordered(&self) -> Vec<&Element> {
        self.ordered_ids()
            .iter()
            .filter_map(|id| self.elements.get(id))
            .collect()
    }

    /// Union of every element's rotated bounds.
    pub fn bounds(&self) -> Option<Rect> {
        combined_bounds(self.elements.values())
    }

    /// Ids hit at a world point, front to back.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<ElementId> {
        self.ordered()
            .into_iter()
            .rev()
            .filter(|e| e.is_renderable() && hit_test(e, point, tolerance))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Ids whose rotated bounds lie fully inside `rect`, back to front.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.ordered()
            .into_iter()
            .filter(|e| e.is_renderable() && rect_contains_rect(rect, rotated_bounds(e)))
            .map(|e| e.id.clone())
            .collect()
    }

    fn keys(&self) -> Vec<(ElementId, i64)> {
        let positions: HashMap<&ElementId, usize> =
            self.order.iter().enumerate().map(|(i, id)| (id, i)).collect();
        self.ordered_ids()
            .into_iter()
            .map(|id| {
                let key = self.sort_key(&id, positions.get(&id).copied().unwrap_or(0));
                (id, key)
            })
            .collect()
    }

    /// New z-indices that put `ids` in front of everything else.
    pub fn bring_to_front(&self, ids: &[ElementId]) -> Vec<(ElementId, i64)> {
        let top = self.keys().iter().map(|(_, k)| *k).max().unwrap_or(0);
        self.ordered_ids()
            .into_iter()
            .filter(|id| ids.contains(id))
            .enumerate()
            .map(|(i, id)| (id, top + 1 + i as i64))
            .collect()
    }

    /// New z-indices that put `ids` behind everything else.
    pub fn send_to_back(&self, ids: &[ElementId]) -> Vec<(ElementId, i64)> {
        let bottom = self.keys().iter().map(|(_, k)| *k).min().unwrap_or(0);
        let chosen: Vec<ElementId> = self
            .ordered_ids()
            .into_iter()
            .filter(|id| ids.contains(id))
            .collect();
        let n = chosen.len() as i64;
        chosen
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, bottom - n + i as i64))
            .collect()
    }

    /// New z-indices moving `ids` one step toward the front (`forward`) or
    /// back, by swapping keys with the neighbor.
    pub fn step(&self, ids: &[ElementId], forward: bool) -> Vec<(ElementId, i64)> {
        let mut keys = self.keys();
        let original: HashMap<ElementId, i64> = keys.iter().cloned().collect();
        // Give every element a distinct key so swaps are well defined.
        for i in 1..keys.len() {
            if keys[i].1 <= keys[i - 1].1 {
                keys[i].1 = keys[i - 1].1 + 1;
            }
        }
        let indices: Vec<usize> = if forward {
            (0..keys.len()).rev().collect()
        } else {
            (0..keys.len()).collect()
        };
        for i in indices {
            if !ids.contains(&keys[i].0) {
                continue;
            }
            let j = if forward { i + 1 } else { i.wrapping_sub(1) };
            if j >= keys.len() || ids.contains(&keys[j].0) {
                continue;
            }
            let (ki, kj) = (keys[i].1, keys[j].1);
            keys[i].1 = kj;
            keys[j].1 = ki;
            keys.swap(i, j);
        }
        keys.into_iter()
            .filter(|(id, key)| original.get(id) != Some(key))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ElementSink for Document {
    fn add_element(&mut self, element: Element) {
        self.insert(element);
    }

    fn update_element(&mut self, id: &str, patch: ElementPatch) {
        self.apply(&StoreOp::Update {
            id: id.to_string(),
            patch,
        });
    }

    fn delete_element(&mut self, id: &str) {
        self.remove(id);
    }
}
