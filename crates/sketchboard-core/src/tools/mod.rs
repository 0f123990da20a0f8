//! Interaction router: turns pointer gestures into drawing actions.
//!
//! Each tool is a small idle → active → idle machine implementing
//! [`ToolHandler`]. The router keeps a dispatch table keyed by [`ToolKind`]
//! and forwards every pointer event, converted to canvas space, to the
//! handler of the tool that started the current gesture.

mod eraser;
mod pen;
mod shape;
mod text;

pub use eraser::EraserTool;
pub use pen::PenTool;
pub use shape::ShapeTool;
pub use text::{TextPrompt, TextTool};

use crate::draw::{self, Surface};
use crate::elements::{Circle, Element, ElementId, ElementStyle, Line, Rectangle, Shape};
use crate::input::{PointerEvent, ViewportTransform};
use crate::presence::RemoteCursor;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
    Rectangle,
    Circle,
    Line,
    Text,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Pen,
        ToolKind::Eraser,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Line,
        ToolKind::Text,
    ];

    /// Tools that preview a shape between the press point and the pointer.
    pub fn has_drag_shape(self) -> bool {
        matches!(self, ToolKind::Rectangle | ToolKind::Circle | ToolKind::Line)
    }
}

/// Candidate shape for a drag from `anchor` to `current`.
pub fn drag_shape(tool: ToolKind, anchor: Point, current: Point) -> Option<Shape> {
    match tool {
        ToolKind::Rectangle => Some(Shape::Rectangle(Rectangle::from_corners(anchor, current))),
        ToolKind::Circle => Some(Shape::Circle(Circle::from_drag(anchor, current))),
        ToolKind::Line => Some(Shape::Line(Line::new(anchor, current))),
        ToolKind::Pen | ToolKind::Eraser | ToolKind::Text => None,
    }
}

/// What a completed gesture asks the synchronization layer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitRequest {
    /// Create one element with the current tool settings.
    Save(Shape),
    /// Delete a batch of elements in one operation.
    Delete(Vec<ElementId>),
}

/// Everything a tool handler may read or draw on while handling an event.
pub struct ToolContext<'a> {
    /// Committed elements, in z-order.
    pub elements: &'a [Element],
    /// Style new elements would be committed with.
    pub style: &'a ElementStyle,
    pub surface: &'a mut dyn Surface,
    pub prompt: &'a mut dyn TextPrompt,
    /// Lower bound for eraser hit thresholds.
    pub min_hit_threshold: f64,
    /// Other users' cursors, kept on screen across full redraws.
    pub cursors: &'a [RemoteCursor],
    /// Canvas resolution the cursors are placed against.
    pub resolution: Size,
}

impl ToolContext<'_> {
    /// Clear and redraw committed elements, then the remote cursors.
    pub fn redraw(&mut self, highlight: &HashSet<ElementId>) {
        draw::redraw_all(self.surface, self.elements, highlight);
        draw::draw_cursors(self.surface, self.cursors, self.resolution);
    }
}

/// Per-tool gesture handler.
pub trait ToolHandler {
    /// Pointer pressed.
    fn on_start(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest>;

    /// Pointer moved while pressed.
    fn on_move(&mut self, ctx: &mut ToolContext<'_>, point: Point);

    /// Pointer released.
    fn on_end(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest>;

    /// Drop any in-progress gesture without committing.
    fn reset(&mut self);

    fn is_active(&self) -> bool;
}

/// Routes pointer events to the handler of the active tool.
pub struct InteractionRouter {
    handlers: HashMap<ToolKind, Box<dyn ToolHandler>>,
    /// Tool that received the last press, while the pointer is down.
    gesture_tool: Option<ToolKind>,
    transform: ViewportTransform,
}

impl Default for InteractionRouter {
    fn default() -> Self {
        Self::new(ViewportTransform::default())
    }
}

impl InteractionRouter {
    /// Create a router with the built-in handler for every tool.
    pub fn new(transform: ViewportTransform) -> Self {
        let mut router = Self {
            handlers: HashMap::new(),
            gesture_tool: None,
            transform,
        };
        router.register(ToolKind::Pen, Box::new(PenTool::new()));
        router.register(ToolKind::Eraser, Box::new(EraserTool::new()));
        for kind in [ToolKind::Rectangle, ToolKind::Circle, ToolKind::Line] {
            router.register(kind, Box::new(ShapeTool::new(kind)));
        }
        router.register(ToolKind::Text, Box::new(TextTool::new()));
        router
    }

    /// Install or replace the handler for a tool.
    pub fn register(&mut self, kind: ToolKind, handler: Box<dyn ToolHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: ViewportTransform) {
        self.transform = transform;
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.gesture_tool
            .and_then(|kind| self.handlers.get(&kind))
            .is_some_and(|h| h.is_active())
    }

    /// Handle a pointer event given in display coordinates.
    pub fn handle(
        &mut self,
        tool: ToolKind,
        event: PointerEvent,
        ctx: &mut ToolContext<'_>,
    ) -> Option<CommitRequest> {
        let point = self.transform.to_canvas(event.position());
        match event {
            PointerEvent::Down { .. } => {
                self.cancel();
                let handler = self.handlers.get_mut(&tool)?;
                let commit = handler.on_start(ctx, point);
                if handler.is_active() {
                    self.gesture_tool = Some(tool);
                }
                commit
            }
            PointerEvent::Move { .. } => {
                let kind = self.gesture_tool?;
                if let Some(handler) = self.handlers.get_mut(&kind) {
                    handler.on_move(ctx, point);
                }
                None
            }
            PointerEvent::Up { .. } => {
                let kind = self.gesture_tool.take()?;
                self.handlers.get_mut(&kind)?.on_end(ctx, point)
            }
        }
    }

    /// Abandon the current gesture, if any. Returns whether one was active,
    /// in which case the caller should redraw to wipe its feedback.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        if let Some(kind) = self.gesture_tool.take() {
            if let Some(handler) = self.handlers.get_mut(&kind) {
                handler.reset();
            }
        }
        was_active
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Harness;
    use super::*;
    use kurbo::Size;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y) }
    }
    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }
    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up { position: Point::new(x, y) }
    }

    #[test]
    fn test_rectangle_gesture() {
        let mut router = InteractionRouter::default();
        let mut harness = Harness::new(Vec::new());

        let commit = harness.run(|ctx| router.handle(ToolKind::Rectangle, down(0.0, 0.0), ctx));
        assert!(commit.is_none());
        assert!(router.is_active());
        harness.run(|ctx| router.handle(ToolKind::Rectangle, moved(20.0, 20.0), ctx));
        let commit = harness.run(|ctx| router.handle(ToolKind::Rectangle, up(50.0, 50.0), ctx));

        assert!(!router.is_active());
        match commit {
            Some(CommitRequest::Save(Shape::Rectangle(r))) => {
                assert!((r.width - 50.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected commit {:?}", other),
        }
    }

    #[test]
    fn test_coordinates_are_scaled() {
        let transform = ViewportTransform::new(Size::new(200.0, 200.0), Size::new(100.0, 100.0));
        let mut router = InteractionRouter::new(transform);
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| router.handle(ToolKind::Line, down(10.0, 10.0), ctx));
        let commit = harness.run(|ctx| router.handle(ToolKind::Line, up(20.0, 10.0), ctx));

        match commit {
            Some(CommitRequest::Save(Shape::Line(line))) => {
                assert!((line.x1 - 20.0).abs() < f64::EPSILON);
                assert!((line.x2 - 40.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected commit {:?}", other),
        }
    }

    #[test]
    fn test_gesture_stays_with_starting_tool() {
        let mut router = InteractionRouter::default();
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| router.handle(ToolKind::Circle, down(10.0, 10.0), ctx));
        // Release reported with a different active tool still finishes the circle.
        let commit = harness.run(|ctx| router.handle(ToolKind::Pen, up(20.0, 10.0), ctx));
        assert!(matches!(commit, Some(CommitRequest::Save(Shape::Circle(_)))));
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut router = InteractionRouter::default();
        let mut harness = Harness::new(Vec::new());
        harness.run(|ctx| router.handle(ToolKind::Pen, moved(5.0, 5.0), ctx));
        assert!(harness.surface.ops().is_empty());
        assert!(harness.run(|ctx| router.handle(ToolKind::Pen, up(5.0, 5.0), ctx)).is_none());
    }

    #[test]
    fn test_cancel_abandons_gesture() {
        let mut router = InteractionRouter::default();
        let mut harness = Harness::new(Vec::new());
        harness.run(|ctx| router.handle(ToolKind::Pen, down(0.0, 0.0), ctx));
        assert!(router.is_active());
        assert!(router.cancel());
        assert!(!router.cancel());
        assert!(!router.is_active());
        assert!(harness.run(|ctx| router.handle(ToolKind::Pen, up(50.0, 50.0), ctx)).is_none());
    }

    #[test]
    fn test_drag_shape_only_for_shape_tools() {
        for kind in ToolKind::ALL {
            assert_eq!(
                drag_shape(kind, Point::ZERO, Point::new(1.0, 1.0)).is_some(),
                kind.has_drag_shape()
            );
        }
    }
}
