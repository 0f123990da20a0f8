//! Vello-backed drawing surface.

use kurbo::{Affine, BezPath, Point, Rect, Size, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Blob, Brush, Color, Fill};
use sketchboard_core::draw::Surface;
use std::sync::Arc;
use vello::Scene;

/// Family used when no font has been selected explicitly.
const DEFAULT_FONT_STACK: &str = "sans-serif";

/// Records drawing calls into a Vello [`Scene`].
///
/// Coordinates are canvas coordinates; `transform` maps them to the output
/// (typically the canvas-to-display scale).
pub struct SceneSurface {
    scene: Scene,
    font_cx: FontContext,
    layout_cx: LayoutContext<Brush>,
    font_family: Option<String>,
    transform: Affine,
    resolution: Size,
    background: Color,
}

impl SceneSurface {
    /// Create a surface for a canvas of the given resolution.
    pub fn new(resolution: Size) -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            font_family: None,
            transform: Affine::IDENTITY,
            resolution,
            background: Color::WHITE,
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// The scene built so far.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Applies to everything drawn after the call.
    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn resolution(&self) -> Size {
        self.resolution
    }

    /// Register font data (TTF/OTF bytes) with the text shaper.
    pub fn register_font(&mut self, data: Vec<u8>) {
        let families = self
            .font_cx
            .collection
            .register_fonts(Blob::new(Arc::new(data)), None);
        if families.is_empty() {
            log::warn!("Font data contained no usable faces");
        }
    }

    /// Use a named family for text instead of the system sans-serif.
    pub fn set_font_family(&mut self, name: impl Into<String>) {
        self.font_family = Some(name.into());
    }

    fn font_stack(&self) -> parley::FontStack<'static> {
        match &self.font_family {
            Some(name) => parley::FontStack::Single(parley::FontFamily::Named(name.clone().into())),
            None => parley::FontStack::Source(DEFAULT_FONT_STACK.into()),
        }
    }
}

impl Surface for SceneSurface {
    fn clear(&mut self) {
        self.scene.reset();
        let bounds = Rect::from_origin_size(Point::ZERO, self.resolution);
        self.scene
            .fill(Fill::NonZero, self.transform, self.background, None, &bounds);
    }

    fn stroke(&mut self, path: &BezPath, stroke: &Stroke, color: Color) {
        self.scene.stroke(stroke, self.transform, color, None, path);
    }

    fn fill(&mut self, path: &BezPath, color: Color) {
        self.scene
            .fill(Fill::NonZero, self.transform, color, None, path);
    }

    fn text(&mut self, text: &str, origin: Point, font_size: f64, color: Color) {
        if text.is_empty() {
            return;
        }
        let brush = Brush::Solid(color);
        let stack = self.font_stack();

        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size as f32));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(stack));
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        // Layout y=0 is the top of the first line; shift so its baseline lands on origin.
        let first_baseline = layout
            .lines()
            .next()
            .map(|line| line.metrics().baseline as f64)
            .unwrap_or(0.0);
        let text_transform =
            self.transform * Affine::translate((origin.x, origin.y - first_baseline));

        let mut glyph_count = 0;
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let glyph_xform = run
                    .synthesis()
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph { id: glyph.id, x: gx, y: gy }
                    })
                    .collect();
                glyph_count += glyphs.len();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(run.font())
                        .brush(&brush)
                        .hint(true)
                        .transform(text_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run.font_size())
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        // No font available: approximate the text box so the element stays visible.
        if glyph_count == 0 {
            log::debug!("No glyphs shaped for {:?}, drawing placeholder box", text);
            let width = text.chars().count() as f64 * font_size * 0.6;
            let height = font_size * 1.2;
            let rect = Rect::new(
                origin.x,
                origin.y - font_size,
                origin.x + width.max(20.0),
                origin.y - font_size + height,
            );
            self.scene.fill(
                Fill::NonZero,
                self.transform,
                color.multiply_alpha(0.4),
                None,
                &rect,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchboard_core::draw::{draw_cursors, redraw_all};
    use sketchboard_core::elements::{Element, ElementStyle, Rectangle, Shape, Text};
    use sketchboard_core::input::CANVAS_RESOLUTION;
    use std::collections::HashSet;

    #[test]
    fn test_surface_creation() {
        let surface = SceneSurface::new(CANVAS_RESOLUTION);
        assert!(surface.scene().encoding().is_empty());
    }

    #[test]
    fn test_clear_paints_background() {
        let mut surface = SceneSurface::new(CANVAS_RESOLUTION);
        surface.clear();
        assert!(!surface.scene().encoding().is_empty());
    }

    #[test]
    fn test_redraw_elements() {
        let mut surface = SceneSurface::new(CANVAS_RESOLUTION);
        let elements = vec![
            Element::new(
                Shape::Rectangle(Rectangle::new(10.0, 10.0, 50.0, 40.0)),
                ElementStyle::default(),
                "u1",
            ),
            Element::new(
                Shape::Text(Text::new("hello", Point::new(100.0, 100.0))),
                ElementStyle::default(),
                "u1",
            ),
        ];
        redraw_all(&mut surface, &elements, &HashSet::new());
        draw_cursors(&mut surface, &[], CANVAS_RESOLUTION);

        let scene = surface.take_scene();
        assert!(!scene.encoding().is_empty());
        assert!(surface.scene().encoding().is_empty());
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut surface = SceneSurface::new(CANVAS_RESOLUTION);
        surface.text("", Point::new(5.0, 5.0), 20.0, Color::BLACK);
        assert!(surface.scene().encoding().is_empty());
    }
}
