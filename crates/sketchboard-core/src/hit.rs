//! Hit detection for the eraser.
//!
//! All predicates are pure: they take a query point and a distance threshold
//! and never look at canvas state. Outline shapes only register hits near
//! their stroke, matching how they are rendered.

use crate::elements::Element;
use kurbo::{Point, Rect, Vec2};

/// Smallest threshold used regardless of stroke width.
pub const MIN_HIT_THRESHOLD: f64 = 6.0;

/// Threshold for an element drawn with the given stroke width.
pub fn threshold_for(stroke_width: f64, min_threshold: f64) -> f64 {
    (stroke_width * 2.0).max(min_threshold)
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
///
/// A single-point polyline degenerates to the distance to that point; an
/// empty one is infinitely far away.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

pub fn near_segment(point: Point, a: Point, b: Point, threshold: f64) -> bool {
    point_to_segment_dist(point, a, b) <= threshold
}

pub fn near_polyline(point: Point, points: &[Point], threshold: f64) -> bool {
    point_to_polyline_dist(point, points) <= threshold
}

/// True when the point lies in the band of width `2 * threshold` around the
/// rectangle's boundary. The interior of a large rectangle does not count.
pub fn near_rectangle(point: Point, rect: Rect, threshold: f64) -> bool {
    let rect = rect.abs();
    let outer = rect.inflate(threshold, threshold);
    if !contains_inclusive(outer, point) {
        return false;
    }
    let inner = rect.inflate(-threshold, -threshold);
    // A rectangle thinner than the band has no interior to exclude.
    if inner.width() <= 0.0 || inner.height() <= 0.0 {
        return true;
    }
    !contains_inclusive(inner, point)
}

/// True when the point is within `threshold` of the circle's circumference.
pub fn near_circle(point: Point, center: Point, radius: f64, threshold: f64) -> bool {
    (point.distance(center) - radius.abs()).abs() <= threshold
}

/// Coarse bounding box for a run of text drawn with its baseline at `origin`.
pub fn text_bounds(origin: Point, text: &str, font_size: f64) -> Rect {
    let width = text.chars().count() as f64 * font_size * 0.6;
    let height = font_size * 1.2;
    Rect::new(
        origin.x,
        origin.y - font_size,
        origin.x + width,
        origin.y - font_size + height,
    )
}

pub fn near_text(point: Point, origin: Point, text: &str, font_size: f64, threshold: f64) -> bool {
    let bounds = text_bounds(origin, text, font_size);
    contains_inclusive(bounds.inflate(threshold * 0.5, threshold * 0.5), point)
}

/// Topmost element under the point.
///
/// Elements are scanned in reverse creation order because later elements are
/// drawn on top.
pub fn find_element_at_point(
    elements: &[Element],
    point: Point,
    min_threshold: f64,
) -> Option<&Element> {
    elements
        .iter()
        .rev()
        .find(|element| element.hit_test(point, min_threshold))
}

fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}
