//! Drag tools for rectangles, circles and lines.

use super::{drag_shape, CommitRequest, ToolContext, ToolHandler, ToolKind};
use crate::draw;
use kurbo::Point;
use std::collections::HashSet;

/// Records an anchor on press and previews the candidate shape while
/// dragging.
#[derive(Debug)]
pub struct ShapeTool {
    kind: ToolKind,
    anchor: Option<Point>,
}

impl ShapeTool {
    pub fn new(kind: ToolKind) -> Self {
        debug_assert!(kind.has_drag_shape(), "{:?} has no drag shape", kind);
        Self { kind, anchor: None }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }
}

impl ToolHandler for ShapeTool {
    fn on_start(&mut self, _ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        self.anchor = Some(point);
        None
    }

    fn on_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        let Some(anchor) = self.anchor else {
            return;
        };
        ctx.redraw(&HashSet::new());
        draw::draw_preview(ctx.surface, anchor, point, self.kind, ctx.style);
    }

    fn on_end(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        let anchor = self.anchor.take()?;
        match drag_shape(self.kind, anchor, point) {
            Some(shape) if shape.has_extent() => Some(CommitRequest::Save(shape)),
            _ => {
                // Nothing to commit: wipe the preview.
                ctx.redraw(&HashSet::new());
                None
            }
        }
    }

    fn reset(&mut self) {
        self.anchor = None;
    }

    fn is_active(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Shape;
    use crate::input::CANVAS_RESOLUTION;
    use crate::presence::{PresencePayload, Profile, RemoteCursor};
    use crate::tools::test_support::Harness;

    #[test]
    fn test_move_redraws_then_previews() {
        let mut tool = ShapeTool::new(ToolKind::Circle);
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| tool.on_start(ctx, Point::new(10.0, 10.0)));
        harness.run(|ctx| tool.on_move(ctx, Point::new(20.0, 10.0)));

        assert_eq!(harness.surface.ops()[0], draw::DrawOp::Clear);
        assert!(harness.surface.has_dashed_stroke());
    }

    #[test]
    fn test_zero_extent_discarded_and_preview_wiped() {
        let mut tool = ShapeTool::new(ToolKind::Rectangle);
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| tool.on_start(ctx, Point::new(10.0, 10.0)));
        harness.run(|ctx| tool.on_move(ctx, Point::new(30.0, 30.0)));
        let commit = harness.run(|ctx| tool.on_end(ctx, Point::new(10.0, 40.0)));

        assert!(commit.is_none());
        assert!(!harness.surface.has_dashed_stroke());
        assert!(!tool.is_active());
    }

    #[test]
    fn test_preview_keeps_remote_cursors() {
        let mut tool = ShapeTool::new(ToolKind::Rectangle);
        let mut harness = Harness::new(Vec::new());
        harness.cursors.push(RemoteCursor::from_payload(
            &PresencePayload {
                user_id: "bob".to_string(),
                x: 960.0,
                y: 540.0,
                profile: Profile::new("Bob", "#ff0000"),
            },
            CANVAS_RESOLUTION,
        ));

        harness.run(|ctx| tool.on_start(ctx, Point::new(10.0, 10.0)));
        harness.run(|ctx| tool.on_move(ctx, Point::new(40.0, 40.0)));

        let ops = harness.surface.ops();
        assert_eq!(ops[0], draw::DrawOp::Clear);
        assert!(ops
            .iter()
            .any(|op| matches!(op, draw::DrawOp::Text { text, .. } if text == "Bob")));
        assert!(harness.surface.has_dashed_stroke());
    }

    #[test]
    fn test_line_commit() {
        let mut tool = ShapeTool::new(ToolKind::Line);
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| tool.on_start(ctx, Point::new(0.0, 0.0)));
        let commit = harness.run(|ctx| tool.on_end(ctx, Point::new(30.0, 40.0)));
        match commit {
            Some(CommitRequest::Save(Shape::Line(line))) => {
                assert!((line.length() - 50.0).abs() < 1e-9);
            }
            other => panic!("unexpected commit {:?}", other),
        }
    }
}
