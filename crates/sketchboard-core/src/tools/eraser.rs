//! Eraser tool: batch deletion of everything the pointer passes over.

use super::{CommitRequest, ToolContext, ToolHandler};
use crate::elements::ElementId;
use crate::hit;
use kurbo::Point;
use std::collections::HashSet;

/// Accumulates hit elements while dragging and deletes them in one batch on
/// release. Elements are never removed from the pending set mid-gesture.
#[derive(Debug, Default)]
pub struct EraserTool {
    /// Pending ids in the order they were hit.
    pending: Vec<ElementId>,
    pending_set: HashSet<ElementId>,
    active: bool,
}

impl EraserTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements marked for deletion in the current gesture.
    pub fn pending(&self) -> &[ElementId] {
        &self.pending
    }

    /// Hit-test and, if something new is under the point, highlight it.
    fn sweep(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        let Some(element) = hit::find_element_at_point(ctx.elements, point, ctx.min_hit_threshold)
        else {
            return;
        };
        if self.pending_set.insert(element.id) {
            self.pending.push(element.id);
            ctx.redraw(&self.pending_set);
        }
    }
}

impl ToolHandler for EraserTool {
    fn on_start(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        self.reset();
        self.active = true;
        self.sweep(ctx, point);
        None
    }

    fn on_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        if self.active {
            self.sweep(ctx, point);
        }
    }

    fn on_end(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        if !self.active {
            return None;
        }
        self.sweep(ctx, point);
        self.active = false;
        self.pending_set.clear();
        let ids = std::mem::take(&mut self.pending);
        if ids.is_empty() {
            None
        } else {
            Some(CommitRequest::Delete(ids))
        }
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.pending_set.clear();
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw;
    use crate::elements::{Circle, Element, ElementStyle, Path, Rectangle, Shape};
    use crate::tools::test_support::Harness;

    fn element(shape: Shape) -> Element {
        Element::new(shape, ElementStyle::default(), "tester")
    }

    #[test]
    fn test_drag_collects_exactly_what_it_crosses() {
        let p1 = element(Shape::Path(Path::new(vec![
            Point::new(10.0, 0.0),
            Point::new(10.0, 100.0),
        ])));
        let r1 = element(Shape::Rectangle(Rectangle::new(40.0, 20.0, 20.0, 60.0)));
        let c1 = element(Shape::Circle(Circle::new(100.0, 50.0, 10.0)));
        let other = element(Shape::Circle(Circle::new(500.0, 500.0, 10.0)));
        let mut harness = Harness::new(vec![p1.clone(), r1.clone(), c1.clone(), other]);
        let mut eraser = EraserTool::new();

        harness.run(|ctx| eraser.on_start(ctx, Point::new(0.0, 50.0)));
        for x in (0..=120).step_by(2) {
            harness.run(|ctx| eraser.on_move(ctx, Point::new(x as f64, 50.0)));
        }
        let commit = harness.run(|ctx| eraser.on_end(ctx, Point::new(120.0, 50.0)));

        match commit {
            Some(CommitRequest::Delete(ids)) => {
                let got: HashSet<_> = ids.into_iter().collect();
                let want: HashSet<_> = [p1.id, r1.id, c1.id].into_iter().collect();
                assert_eq!(got, want);
            }
            other => panic!("unexpected commit {:?}", other),
        }
        assert!(eraser.pending().is_empty());
    }

    #[test]
    fn test_hits_are_highlighted() {
        let target = element(Shape::Rectangle(Rectangle::new(0.0, 0.0, 50.0, 50.0)));
        let mut harness = Harness::new(vec![target]);
        let mut eraser = EraserTool::new();

        harness.run(|ctx| eraser.on_start(ctx, Point::new(0.0, 25.0)));
        let highlight = draw::highlight_color();
        let highlighted = harness
            .surface
            .ops()
            .iter()
            .any(|op| matches!(op, draw::DrawOp::Stroke { color, .. } if *color == highlight));
        assert!(highlighted);
        assert_eq!(eraser.pending().len(), 1);
    }

    #[test]
    fn test_same_element_counted_once() {
        let target = element(Shape::Rectangle(Rectangle::new(0.0, 0.0, 50.0, 50.0)));
        let mut harness = Harness::new(vec![target]);
        let mut eraser = EraserTool::new();

        harness.run(|ctx| eraser.on_start(ctx, Point::new(0.0, 10.0)));
        harness.run(|ctx| eraser.on_move(ctx, Point::new(0.0, 20.0)));
        harness.run(|ctx| eraser.on_move(ctx, Point::new(0.0, 30.0)));
        match harness.run(|ctx| eraser.on_end(ctx, Point::new(0.0, 40.0))) {
            Some(CommitRequest::Delete(ids)) => assert_eq!(ids.len(), 1),
            other => panic!("unexpected commit {:?}", other),
        }
    }

    #[test]
    fn test_miss_commits_nothing() {
        let mut harness = Harness::new(Vec::new());
        let mut eraser = EraserTool::new();
        harness.run(|ctx| eraser.on_start(ctx, Point::new(5.0, 5.0)));
        assert!(harness.run(|ctx| eraser.on_end(ctx, Point::new(6.0, 6.0))).is_none());
    }
}
