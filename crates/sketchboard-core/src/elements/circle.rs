//! Circle element.

use super::{ElementType, ShapeTrait};
use crate::hit;
use kurbo::{BezPath, Circle as KurboCircle, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// A circle given by center and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(cx: f64, cy: f64, radius: f64) -> Self {
        Self { cx, cy, radius }
    }

    /// Circle centered on `anchor` passing through `edge`.
    pub fn from_drag(anchor: Point, edge: Point) -> Self {
        Self::new(anchor.x, anchor.y, anchor.distance(edge))
    }

    pub fn center(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    pub fn as_kurbo(&self) -> KurboCircle {
        KurboCircle::new(self.center(), self.radius.abs())
    }

    pub fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }
}

impl ShapeTrait for Circle {
    fn kind(&self) -> ElementType {
        ElementType::Circle
    }

    fn bounds(&self) -> Rect {
        self.as_kurbo().bounding_box()
    }

    fn hit_test(&self, point: Point, threshold: f64) -> bool {
        hit::near_circle(point, self.center(), self.radius, threshold)
    }

    fn has_extent(&self) -> bool {
        self.radius != 0.0
    }
}
