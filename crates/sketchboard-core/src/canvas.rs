//! Canvas element store and undo/redo history.

use crate::elements::{Element, ElementId, ElementStyle};
use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Full copy of the element list, as held on the undo and redo stacks.
pub type Snapshot = Vec<Element>;

/// Local drawing configuration. Never synchronized: each client picks its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub color: String,
    pub stroke_width: f64,
    /// Fill for closed shapes.
    #[serde(default)]
    pub fill: Option<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::default(),
            color: "#000000".to_string(),
            stroke_width: 2.0,
            fill: None,
        }
    }
}

impl ToolSettings {
    /// Style applied to newly committed elements.
    pub fn style(&self) -> ElementStyle {
        ElementStyle {
            color: self.color.clone(),
            stroke_width: self.stroke_width,
            fill: self.fill.clone(),
        }
    }
}

/// Elements plus both history stacks, captured before an operation so it can
/// be rolled back.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub elements: Snapshot,
    pub undo_stack: Vec<Snapshot>,
    pub redo_stack: Vec<Snapshot>,
}

/// In-memory authoritative state of the local client.
///
/// Element order is creation order and doubles as z-order. Every locally
/// initiated mutation must call [`CanvasState::push_undo`] exactly once
/// before changing the element list.
#[derive(Debug, Clone)]
pub struct CanvasState {
    elements: Vec<Element>,
    /// Position of each element in `elements`.
    index: HashMap<ElementId, usize>,
    /// Current tool configuration.
    pub settings: ToolSettings,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    undo_limit: usize,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasState {
    pub fn new() -> Self {
        Self::with_undo_limit(MAX_UNDO_HISTORY)
    }

    pub fn with_undo_limit(undo_limit: usize) -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
            settings: ToolSettings::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            undo_limit: undo_limit.max(1),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).and_then(|&pos| self.elements.get(pos))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn undo_stack(&self) -> &[Snapshot] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[Snapshot] {
        &self.redo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Push current elements to the undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.elements.clone());
        self.redo_stack.clear();

        if self.undo_stack.len() > self.undo_limit {
            self.undo_stack.remove(0);
        }
    }

    /// Append an element on top. Returns false if the id is already present.
    pub fn insert(&mut self, element: Element) -> bool {
        if self.index.contains_key(&element.id) {
            return false;
        }
        self.index.insert(element.id, self.elements.len());
        self.elements.push(element);
        true
    }

    /// Remove the given elements. Returns how many were present.
    pub fn remove(&mut self, ids: &[ElementId]) -> usize {
        let doomed: HashSet<ElementId> = ids
            .iter()
            .copied()
            .filter(|id| self.index.contains_key(id))
            .collect();
        if doomed.is_empty() {
            return 0;
        }
        self.elements.retain(|e| !doomed.contains(&e.id));
        self.reindex();
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, snapshot);
        self.redo_stack.push(current);
        self.reindex();
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, snapshot);
        self.undo_stack.push(current);
        self.reindex();
        true
    }

    /// Capture elements and history for a later [`CanvasState::restore`].
    pub fn history(&self) -> HistorySnapshot {
        HistorySnapshot {
            elements: self.elements.clone(),
            undo_stack: self.undo_stack.clone(),
            redo_stack: self.redo_stack.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: HistorySnapshot) {
        self.replace_all(snapshot.elements, snapshot.undo_stack, snapshot.redo_stack);
    }

    /// Replace elements and both stacks wholesale. Tool settings are kept.
    pub fn replace_all(
        &mut self,
        elements: Snapshot,
        undo_stack: Vec<Snapshot>,
        redo_stack: Vec<Snapshot>,
    ) {
        self.elements = dedup_by_id(elements);
        self.undo_stack = undo_stack;
        self.redo_stack = redo_stack;
        self.reindex();
    }

    /// Load elements fetched from the gateway. History is left untouched.
    pub fn load(&mut self, elements: Snapshot) {
        self.elements = dedup_by_id(elements);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .elements
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.id, pos))
            .collect();
    }
}

/// Keep the first occurrence of each id, preserving order.
fn dedup_by_id(elements: Snapshot) -> Snapshot {
    let mut seen = HashSet::with_capacity(elements.len());
    elements.into_iter().filter(|e| seen.insert(e.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Circle, Rectangle, Shape};

    fn rect(x: f64) -> Element {
        Element::new(
            Shape::Rectangle(Rectangle::new(x, 0.0, 10.0, 10.0)),
            ElementStyle::default(),
            "tester",
        )
    }

    fn ids(state: &CanvasState) -> Vec<ElementId> {
        state.elements().iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_insert_keeps_creation_order() {
        let mut state = CanvasState::new();
        let a = rect(0.0);
        let b = rect(20.0);
        state.insert(a.clone());
        state.insert(b.clone());
        assert_eq!(ids(&state), vec![a.id, b.id]);
        assert!(!state.insert(a.clone()));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_remove_by_id() {
        let mut state = CanvasState::new();
        let a = rect(0.0);
        let b = rect(20.0);
        let c = rect(40.0);
        for e in [&a, &b, &c] {
            state.insert(e.clone());
        }
        assert_eq!(state.remove(&[a.id, c.id, ElementId::new_v4()]), 2);
        assert_eq!(ids(&state), vec![b.id]);
        assert_eq!(state.get(b.id).map(|e| e.id), Some(b.id));
        assert!(state.get(a.id).is_none());
    }

    #[test]
    fn test_undo_redo() {
        let mut state = CanvasState::new();
        assert!(!state.can_undo());

        state.push_undo();
        state.insert(rect(0.0));
        assert!(state.can_undo());
        assert!(!state.can_redo());

        assert!(state.undo());
        assert!(state.is_empty());
        assert!(state.can_redo());

        assert!(state.redo());
        assert_eq!(state.len(), 1);
        assert!(!state.redo());
    }

    #[test]
    fn test_new_change_clears_redo() {
        let mut state = CanvasState::new();
        state.push_undo();
        state.insert(rect(0.0));
        state.undo();
        assert!(state.can_redo());

        state.push_undo();
        state.insert(rect(10.0));
        assert!(!state.can_redo());
    }

    #[test]
    fn test_undo_limit() {
        let mut state = CanvasState::with_undo_limit(3);
        for i in 0..5 {
            state.push_undo();
            state.insert(rect(i as f64 * 20.0));
        }
        assert_eq!(state.undo_stack().len(), 3);
    }

    #[test]
    fn test_history_restore() {
        let mut state = CanvasState::new();
        state.push_undo();
        state.insert(rect(0.0));
        let before = state.history();

        state.push_undo();
        state.clear();
        state.restore(before.clone());

        assert_eq!(state.history(), before);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_replace_all_drops_duplicate_ids() {
        let mut state = CanvasState::new();
        let circle = Element::new(
            Shape::Circle(Circle::new(20.0, 20.0, 10.0)),
            ElementStyle::default(),
            "peer",
        );
        state.replace_all(vec![circle.clone(), circle.clone()], Vec::new(), Vec::new());
        assert_eq!(state.len(), 1);
        assert!(state.contains(circle.id));
    }

    #[test]
    fn test_settings_style() {
        let mut settings = ToolSettings::default();
        settings.color = "#123456".to_string();
        settings.stroke_width = 5.0;
        let style = settings.style();
        assert_eq!(style.color, "#123456");
        assert!((style.stroke_width - 5.0).abs() < f64::EPSILON);
    }
}
