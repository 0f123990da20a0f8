//! Freehand pen path.

use super::{ElementType, ShapeTrait};
use crate::hit;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// An ordered sequence of points drawn with the pen tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Points in drawing order.
    #[serde(rename = "path")]
    pub points: Vec<Point>,
}

impl Path {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline through all points.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.points.iter();
        if let Some(first) = points.next() {
            path.move_to(*first);
            for point in points {
                path.line_to(*point);
            }
        }
        path
    }
}

impl ShapeTrait for Path {
    fn kind(&self) -> ElementType {
        ElementType::Path
    }

    fn bounds(&self) -> Rect {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(*first, *first), |acc, p| {
            acc.union_pt(*p)
        })
    }

    fn hit_test(&self, point: Point, threshold: f64) -> bool {
        hit::near_polyline(point, &self.points, threshold)
    }

    fn has_extent(&self) -> bool {
        self.points.len() >= 2
    }
}
