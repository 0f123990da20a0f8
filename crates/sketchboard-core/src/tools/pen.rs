//! Pen tool: freehand paths with incremental live feedback.

use super::{CommitRequest, ToolContext, ToolHandler};
use crate::draw;
use crate::elements::{Path, Shape};
use kurbo::Point;

/// Accumulates points while the pointer is down.
///
/// Moves only draw the newest segment; the full path joins the element list
/// (and therefore later full redraws) when it is committed.
#[derive(Debug, Default)]
pub struct PenTool {
    points: Vec<Point>,
    active: bool,
}

impl PenTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points accumulated so far in the current stroke.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl ToolHandler for PenTool {
    fn on_start(&mut self, _ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        self.points.clear();
        self.points.push(point);
        self.active = true;
        None
    }

    fn on_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        if !self.active {
            return;
        }
        if let Some(&last) = self.points.last() {
            draw::draw_segment(ctx.surface, last, point, ctx.style);
        }
        self.points.push(point);
    }

    fn on_end(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        if !self.active {
            return None;
        }
        if self.points.last() != Some(&point) {
            self.on_move(ctx, point);
        }
        self.active = false;
        let points = std::mem::take(&mut self.points);
        if points.len() >= 2 {
            Some(CommitRequest::Save(Shape::Path(Path::new(points))))
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.points.clear();
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::Harness;

    #[test]
    fn test_stroke_commits_path() {
        let mut pen = PenTool::new();
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| pen.on_start(ctx, Point::new(10.0, 10.0)));
        harness.run(|ctx| pen.on_move(ctx, Point::new(50.0, 50.0)));
        let commit = harness.run(|ctx| pen.on_end(ctx, Point::new(100.0, 100.0)));

        match commit {
            Some(CommitRequest::Save(Shape::Path(path))) => {
                assert_eq!(path.points.first(), Some(&Point::new(10.0, 10.0)));
                assert_eq!(path.points.last(), Some(&Point::new(100.0, 100.0)));
                assert_eq!(path.len(), 3);
            }
            other => panic!("unexpected commit {:?}", other),
        }
        assert!(pen.points().is_empty());
    }

    #[test]
    fn test_moves_draw_segments_without_clearing() {
        let mut pen = PenTool::new();
        let mut harness = Harness::new(Vec::new());

        harness.run(|ctx| pen.on_start(ctx, Point::new(0.0, 0.0)));
        harness.run(|ctx| pen.on_move(ctx, Point::new(1.0, 1.0)));
        harness.run(|ctx| pen.on_move(ctx, Point::new(2.0, 2.0)));

        assert_eq!(harness.surface.stroke_count(), 2);
        assert!(!harness.surface.ops().contains(&crate::draw::DrawOp::Clear));
    }

    #[test]
    fn test_click_without_drag_discards() {
        let mut pen = PenTool::new();
        let mut harness = Harness::new(Vec::new());
        harness.run(|ctx| pen.on_start(ctx, Point::new(5.0, 5.0)));
        assert!(harness.run(|ctx| pen.on_end(ctx, Point::new(5.0, 5.0))).is_none());
        assert!(!pen.is_active());
    }
}
