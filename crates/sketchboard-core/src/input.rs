//! Pointer input and the screen-to-canvas coordinate transform.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Default internal canvas resolution.
pub const CANVAS_RESOLUTION: Size = Size::new(1920.0, 1080.0);

/// Pointer event in display coordinates, relative to the canvas's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position } => position,
        }
    }

    /// Same event with its position mapped through `f`.
    pub fn map(self, f: impl FnOnce(Point) -> Point) -> Self {
        match self {
            PointerEvent::Down { position } => PointerEvent::Down { position: f(position) },
            PointerEvent::Move { position } => PointerEvent::Move { position: f(position) },
            PointerEvent::Up { position } => PointerEvent::Up { position: f(position) },
        }
    }
}

/// Maps between the displayed (CSS) size of the canvas and its fixed
/// internal resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    /// Internal raster resolution.
    pub resolution: Size,
    /// Size the canvas is displayed at.
    pub display: Size,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::new(CANVAS_RESOLUTION, CANVAS_RESOLUTION)
    }
}

impl ViewportTransform {
    pub fn new(resolution: Size, display: Size) -> Self {
        Self { resolution, display }
    }

    /// Update the displayed size (e.g. after a window resize).
    pub fn set_display_size(&mut self, display: Size) {
        self.display = display;
    }

    /// Per-axis ratio of resolution to display size. Degenerate display
    /// sizes map 1:1.
    pub fn scale(&self) -> (f64, f64) {
        let ratio = |res: f64, disp: f64| if disp > 0.0 { res / disp } else { 1.0 };
        (
            ratio(self.resolution.width, self.display.width),
            ratio(self.resolution.height, self.display.height),
        )
    }

    /// Convert a display-space point into canvas space.
    pub fn to_canvas(&self, point: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(point.x * sx, point.y * sy)
    }

    /// Convert a canvas-space point into display space.
    pub fn to_display(&self, point: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(point.x / sx, point.y / sy)
    }

    /// Canvas-space point as a fraction of the resolution.
    pub fn normalize(&self, point: Point) -> Point {
        if self.resolution.width <= 0.0 || self.resolution.height <= 0.0 {
            return Point::ZERO;
        }
        Point::new(
            point.x / self.resolution.width,
            point.y / self.resolution.height,
        )
    }
}
