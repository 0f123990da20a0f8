//! How local state is shipped to peers and how peer state is merged.

use crate::canvas::CanvasState;
use crate::fabric::StateReplace;

/// Replication policy between the local canvas and the fabric.
pub trait ReplicationStrategy {
    /// Payload describing the local state after a confirmed change.
    fn outgoing(&self, state: &CanvasState, source_id: &str) -> StateReplace;

    /// Merge a peer's payload into the local state.
    fn incoming(&self, state: &mut CanvasState, payload: StateReplace);
}

/// Ship the whole element list and both stacks; the last payload received
/// wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullStateReplication;

impl ReplicationStrategy for FullStateReplication {
    fn outgoing(&self, state: &CanvasState, source_id: &str) -> StateReplace {
        StateReplace {
            elements: state.elements().to_vec(),
            undo_stack: state.undo_stack().to_vec(),
            redo_stack: state.redo_stack().to_vec(),
            source_id: source_id.to_string(),
        }
    }

    fn incoming(&self, state: &mut CanvasState, payload: StateReplace) {
        state.replace_all(payload.elements, payload.undo_stack, payload.redo_stack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Element, ElementStyle, Rectangle, Shape};

    #[test]
    fn test_incoming_is_idempotent() {
        let mut source = CanvasState::new();
        source.push_undo();
        source.insert(Element::new(
            Shape::Rectangle(Rectangle::new(0.0, 0.0, 4.0, 4.0)),
            ElementStyle::default(),
            "a",
        ));
        let payload = FullStateReplication.outgoing(&source, "client-a");

        let mut once = CanvasState::new();
        FullStateReplication.incoming(&mut once, payload.clone());
        let mut twice = once.clone();
        FullStateReplication.incoming(&mut twice, payload);

        assert_eq!(once.history(), twice.history());
        assert_eq!(once.history(), source.history());
    }
}
