//! Text label element.

use super::{ElementType, ShapeTrait};
use crate::hit;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Font size every client renders text at.
pub const TEXT_FONT_SIZE: f64 = 20.0;

/// A single line of text with its baseline origin at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl Text {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            x: position.x,
            y: position.y,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl ShapeTrait for Text {
    fn kind(&self) -> ElementType {
        ElementType::Text
    }

    fn bounds(&self) -> Rect {
        hit::text_bounds(self.origin(), &self.text, TEXT_FONT_SIZE)
    }

    fn hit_test(&self, point: Point, threshold: f64) -> bool {
        hit::near_text(point, self.origin(), &self.text, TEXT_FONT_SIZE, threshold)
    }

    fn has_extent(&self) -> bool {
        !self.text.is_empty()
    }
}
