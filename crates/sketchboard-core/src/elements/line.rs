//! Straight line element.

use super::{ElementType, ShapeTrait};
use crate::hit;
use kurbo::{BezPath, Line as KurboLine, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// A single line segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }

    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start(), self.end())
    }

    pub fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }
}

impl ShapeTrait for Line {
    fn kind(&self) -> ElementType {
        ElementType::Line
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    fn hit_test(&self, point: Point, threshold: f64) -> bool {
        hit::near_segment(point, self.start(), self.end(), threshold)
    }

    fn has_extent(&self) -> bool {
        self.length() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert!(line.hit_test(Point::new(50.0, 52.0), 5.0));
        assert!(!line.hit_test(Point::new(50.0, 80.0), 5.0));
    }

    #[test]
    fn test_wire_fields() {
        let line = Line::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["x1"], 1.0);
        assert_eq!(json["y2"], 4.0);
    }
}
