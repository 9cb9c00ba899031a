//! Eraser: marks elements along the pointer path, deletes on release.

use std::collections::HashSet;

use kurbo::Point;

use crate::elements::ElementId;
use crate::geometry::element_distance_to_path;
use crate::store::Document;

#[derive(Debug, Clone)]
pub struct EraseState {
    pub radius: f64,
    path: Vec<Point>,
    marked: Vec<ElementId>,
}

impl EraseState {
    pub fn new(start: Point, radius: f64) -> Self {
        Self {
            radius,
            path: vec![start],
            marked: Vec::new(),
        }
    }

    /// Test the newest stretch of the path. Returns how many elements were
    /// newly marked.
    pub fn extend(&mut self, doc: &Document, world: Point, locked: &HashSet<ElementId>) -> usize {
        let segment: Vec<Point> = match self.path.last() {
            Some(prev) if *prev != world => vec![*prev, world],
            _ => vec![world],
        };
        if self.path.last() != Some(&world) {
            self.path.push(world);
        }
        let before = self.marked.len();
        for el in doc.ordered() {
            if el.is_laser() || locked.contains(&el.id) || self.marked.contains(&el.id) {
                continue;
            }
            if element_distance_to_path(el, &segment) <= self.radius {
                self.marked.push(el.id.clone());
            }
        }
        self.marked.len() - before
    }

    pub fn marked(&self) -> &[ElementId] {
        &self.marked
    }

    pub fn is_marked(&self, id: &str) -> bool {
        self.marked.iter().any(|m| m == id)
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Marked ids still eligible for deletion at release.
    pub fn finish(self, doc: &Document, locked: &HashSet<ElementId>) -> Vec<ElementId> {
        self.marked
            .into_iter()
            .filter(|id| doc.contains(id) && !locked.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Element, ElementStyle};
    use kurbo::Rect;

    #[test]
    fn test_marks_within_radius() {
        let mut doc = Document::new();
        let stroke = Element::freehand(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)], ElementStyle::default());
        let far = Element::rectangle(Rect::new(0.0, 200.0, 50.0, 250.0), ElementStyle::default());
        let (sid, fid) = (stroke.id.clone(), far.id.clone());
        doc.insert(stroke);
        doc.insert(far);

        let mut e = EraseState::new(Point::new(50.0, 40.0), 32.0);
        assert_eq!(e.extend(&doc, Point::new(50.0, 40.0), &HashSet::new()), 0);
        assert_eq!(e.extend(&doc, Point::new(50.0, 31.0), &HashSet::new()), 1);
        assert!(e.is_marked(&sid));
        assert!(!e.is_marked(&fid));
        assert_eq!(e.finish(&doc, &HashSet::new()), vec![sid]);
    }

    #[test]
    fn test_fast_swipe_crosses_element() {
        let mut doc = Document::new();
        let stroke = Element::freehand(vec![Point::new(0.0, 0.0), Point::new(0.0, 10.0)], ElementStyle::default());
        let id = stroke.id.clone();
        doc.insert(stroke);
        // Both samples are far away, but the segment between them crosses the stroke.
        let mut e = EraseState::new(Point::new(-500.0, 5.0), 1.0);
        e.extend(&doc, Point::new(500.0, 5.0), &HashSet::new());
        assert!(e.is_marked(&id));
    }

    #[test]
    fn test_locked_and_lasers_are_spared() {
        let mut doc = Document::new();
        let a = Element::freehand(vec![Point::ZERO], ElementStyle::default());
        let laser = Element::laser(vec![Point::ZERO], 0, ElementStyle::default());
        let aid = a.id.clone();
        doc.insert(a);
        doc.insert(laser);
        let locked: HashSet<_> = [aid].into_iter().collect();
        let mut e = EraseState::new(Point::ZERO, 10.0);
        assert_eq!(e.extend(&doc, Point::new(1.0, 1.0), &locked), 0);
    }
}
