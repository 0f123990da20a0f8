//! Drawing engine.
//!
//! Stateless rendering of the element list, drag previews and live pen
//! segments onto a [`Surface`]. Nothing here mutates canvas state; the
//! surface is the only thing written to.

use crate::elements::{Element, ElementId, ElementStyle, Shape, TEXT_FONT_SIZE};
use crate::presence::RemoteCursor;
use crate::tools::{self, ToolKind};
use kurbo::{BezPath, Cap, Join, Point, Size, Stroke};
use peniko::Color;
use std::collections::HashSet;

/// Opacity of elements pending deletion.
pub const HIGHLIGHT_ALPHA: f32 = 0.4;

/// Dash pattern for drag previews.
const PREVIEW_DASHES: [f64; 2] = [6.0, 4.0];

/// A raster target the drawing engine can paint on.
///
/// Coordinates are in canvas space (the fixed internal resolution).
pub trait Surface {
    /// Erase everything.
    fn clear(&mut self);

    /// Stroke a path.
    fn stroke(&mut self, path: &BezPath, stroke: &Stroke, color: Color);

    /// Fill a closed path.
    fn fill(&mut self, path: &BezPath, color: Color);

    /// Draw a single line of text with its baseline at `origin`.
    fn text(&mut self, text: &str, origin: Point, font_size: f64, color: Color);
}

/// Color used for elements pending deletion.
pub fn highlight_color() -> Color {
    Color::from_rgba8(255, 0, 0, 255).multiply_alpha(HIGHLIGHT_ALPHA)
}

fn pen(width: f64) -> Stroke {
    Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
}

/// Clear the surface and draw every element in creation order.
///
/// Elements whose id is in `highlight` are drawn in the highlight color at
/// reduced opacity. Ids in `highlight` that no longer exist are ignored.
pub fn redraw_all(surface: &mut dyn Surface, elements: &[Element], highlight: &HashSet<ElementId>) {
    surface.clear();
    for element in elements {
        draw_element(surface, element, highlight.contains(&element.id));
    }
}

/// Draw one committed element.
pub fn draw_element(surface: &mut dyn Surface, element: &Element, highlighted: bool) {
    let style = &element.style;
    let stroke_color = if highlighted {
        highlight_color()
    } else {
        style.stroke()
    };

    match &element.shape {
        Shape::Text(text) => {
            surface.text(&text.text, text.origin(), TEXT_FONT_SIZE, stroke_color);
        }
        Shape::Path(path) => draw_path(surface, &path.points, style, stroke_color),
        shape => {
            let Some(outline) = shape.to_path() else {
                return;
            };
            if let Some(fill) = style.fill() {
                let fill = if highlighted {
                    fill.multiply_alpha(HIGHLIGHT_ALPHA)
                } else {
                    fill
                };
                surface.fill(&outline, fill);
            }
            surface.stroke(&outline, &pen(style.stroke_width), stroke_color);
        }
    }
}

/// Stroke a committed or in-progress pen path.
pub fn draw_path(surface: &mut dyn Surface, points: &[Point], style: &ElementStyle, color: Color) {
    if points.len() < 2 {
        return;
    }
    let mut path = BezPath::new();
    path.move_to(points[0]);
    for point in &points[1..] {
        path.line_to(*point);
    }
    surface.stroke(&path, &pen(style.stroke_width), color);
}

/// Draw only the newest pen segment, on top of whatever is already there.
pub fn draw_segment(surface: &mut dyn Surface, from: Point, to: Point, style: &ElementStyle) {
    let mut path = BezPath::new();
    path.move_to(from);
    path.line_to(to);
    surface.stroke(&path, &pen(style.stroke_width), style.stroke());
}

/// Draw a dashed, uncommitted shape for a drag between `anchor` and `current`.
///
/// Tools without a drag shape draw nothing.
pub fn draw_preview(
    surface: &mut dyn Surface,
    anchor: Point,
    current: Point,
    tool: ToolKind,
    style: &ElementStyle,
) {
    let Some(outline) = tools::drag_shape(tool, anchor, current).and_then(|s| s.to_path()) else {
        return;
    };
    let stroke = pen(style.stroke_width).with_dashes(0.0, PREVIEW_DASHES);
    surface.stroke(&outline, &stroke, style.stroke());
}

/// Draw remote users' cursors as small pointer arrows with a name label.
pub fn draw_cursors(surface: &mut dyn Surface, cursors: &[RemoteCursor], resolution: Size) {
    for cursor in cursors {
        let tip = cursor.position_in(resolution);
        let color = cursor.color();

        let mut arrow = BezPath::new();
        arrow.move_to(tip);
        arrow.line_to(Point::new(tip.x, tip.y + 18.0));
        arrow.line_to(Point::new(tip.x + 14.0, tip.y + 14.0));
        arrow.close_path();

        surface.fill(&arrow, color);
        // White outline for visibility against any background
        surface.stroke(&arrow, &Stroke::new(1.5), Color::WHITE);
        surface.text(
            &cursor.display_name,
            Point::new(tip.x + 16.0, tip.y + 30.0),
            12.0,
            color,
        );
    }
}

/// A single recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Stroke {
        path: BezPath,
        width: f64,
        dashes: Vec<f64>,
        color: Color,
    },
    Fill {
        path: BezPath,
        color: Color,
    },
    Text {
        text: String,
        origin: Point,
        font_size: f64,
        color: Color,
    },
}

/// Surface that records a display list instead of rasterizing.
///
/// Useful headless and for comparing what two clients would render.
/// `clear` drops everything recorded so far.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of strokes currently on the surface.
    pub fn stroke_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Stroke { .. }))
            .count()
    }

    /// Whether any dashed stroke is on the surface.
    pub fn has_dashed_stroke(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, DrawOp::Stroke { dashes, .. } if !dashes.is_empty()))
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn stroke(&mut self, path: &BezPath, stroke: &Stroke, color: Color) {
        self.ops.push(DrawOp::Stroke {
            path: path.clone(),
            width: stroke.width,
            dashes: stroke.dash_pattern.iter().copied().collect(),
            color,
        });
    }

    fn fill(&mut self, path: &BezPath, color: Color) {
        self.ops.push(DrawOp::Fill {
            path: path.clone(),
            color,
        });
    }

    fn text(&mut self, text: &str, origin: Point, font_size: f64, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            font_size,
            color,
        });
    }
}
