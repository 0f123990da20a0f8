//! Text tool: place a label where the pointer is pressed.

use super::{CommitRequest, ToolContext, ToolHandler};
use crate::elements::{Shape, ShapeTrait, Text};
use kurbo::Point;

/// Synchronous text capture, e.g. a modal input box.
pub trait TextPrompt {
    /// Ask for text to place at `at`. `None` means the user cancelled.
    fn request_text(&mut self, at: Point) -> Option<String>;
}

impl<F> TextPrompt for F
where
    F: FnMut(Point) -> Option<String>,
{
    fn request_text(&mut self, at: Point) -> Option<String> {
        self(at)
    }
}

/// Commits immediately on press; there is no drag phase.
#[derive(Debug, Default)]
pub struct TextTool;

impl TextTool {
    pub fn new() -> Self {
        Self
    }
}

impl ToolHandler for TextTool {
    fn on_start(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> Option<CommitRequest> {
        let content = ctx.prompt.request_text(point)?;
        let text = Text::new(content, point);
        text.has_extent().then(|| CommitRequest::Save(Shape::Text(text)))
    }

    fn on_move(&mut self, _ctx: &mut ToolContext<'_>, _point: Point) {}

    fn on_end(&mut self, _ctx: &mut ToolContext<'_>, _point: Point) -> Option<CommitRequest> {
        None
    }

    fn reset(&mut self) {}

    fn is_active(&self) -> bool {
        false
    }
}
