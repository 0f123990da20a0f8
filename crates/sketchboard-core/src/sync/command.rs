//! Reversible canvas mutations.

use crate::canvas::{CanvasState, HistorySnapshot};
use crate::elements::{Element, ElementId};

/// A locally initiated change to the element list.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Add(Element),
    Delete(Vec<ElementId>),
    Clear,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add(_) => "add",
            Operation::Delete(_) => "delete",
            Operation::Clear => "clear",
        }
    }
}

/// An operation plus the state needed to take it back.
///
/// `apply` records elements and both history stacks, pushes one undo entry,
/// then mutates. `rollback` restores exactly what `apply` saw.
#[derive(Debug, Clone)]
pub struct ReversibleCommand {
    operation: Operation,
    before: Option<HistorySnapshot>,
}

impl ReversibleCommand {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            before: None,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn is_applied(&self) -> bool {
        self.before.is_some()
    }

    pub fn apply(&mut self, state: &mut CanvasState) {
        self.before = Some(state.history());
        state.push_undo();
        match &self.operation {
            Operation::Add(element) => {
                if !state.insert(element.clone()) {
                    log::warn!("Element {} already present, not added twice", element.id);
                }
            }
            Operation::Delete(ids) => {
                state.remove(ids);
            }
            Operation::Clear => state.clear(),
        }
    }

    /// Restore the pre-apply state. Returns false if never applied.
    pub fn rollback(&mut self, state: &mut CanvasState) -> bool {
        match self.before.take() {
            Some(before) => {
                state.restore(before);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Circle, ElementStyle, Shape};

    fn circle() -> Element {
        Element::new(
            Shape::Circle(Circle::new(0.0, 0.0, 5.0)),
            ElementStyle::default(),
            "tester",
        )
    }

    #[test]
    fn test_apply_pushes_one_undo_entry() {
        let mut state = CanvasState::new();
        let mut command = ReversibleCommand::new(Operation::Add(circle()));
        command.apply(&mut state);
        assert_eq!(state.len(), 1);
        assert_eq!(state.undo_stack().len(), 1);
        assert!(command.is_applied());
    }

    #[test]
    fn test_rollback_restores_everything() {
        let mut state = CanvasState::new();
        state.push_undo();
        state.insert(circle());
        state.undo();
        let before = state.history();

        let mut command = ReversibleCommand::new(Operation::Clear);
        command.apply(&mut state);
        assert!(!state.can_redo());

        assert!(command.rollback(&mut state));
        assert_eq!(state.history(), before);
        assert!(!command.rollback(&mut state));
    }
}
