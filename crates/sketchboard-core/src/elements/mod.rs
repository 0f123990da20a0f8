//! Element definitions for the shared canvas.
//!
//! An [`Element`] is a committed drawing primitive. Elements are immutable once
//! committed: edits happen by adding, deleting, or clearing, never by mutating
//! an element in place.

mod circle;
mod line;
mod path;
mod rectangle;
mod text;

pub use circle::Circle;
pub use line::Line;
pub use path::Path;
pub use rectangle::Rectangle;
pub use text::{TEXT_FONT_SIZE, Text};

use crate::hit;
use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Wire discriminator for [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Path,
    Rectangle,
    Circle,
    Line,
    Text,
}

impl ElementType {
    /// Closed shapes are the only ones that may carry a fill.
    pub fn is_closed(self) -> bool {
        matches!(self, ElementType::Rectangle | ElementType::Circle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Path => "path",
            ElementType::Rectangle => "rectangle",
            ElementType::Circle => "circle",
            ElementType::Line => "line",
            ElementType::Text => "text",
        }
    }
}

/// Style properties for elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    /// Stroke (and text) color as a CSS hex string.
    pub color: String,
    /// Stroke width in canvas pixels.
    pub stroke_width: f64,
    /// Fill color for closed shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            stroke_width: 2.0,
            fill: None,
        }
    }
}

impl ElementStyle {
    pub fn new(color: impl Into<String>, stroke_width: f64) -> Self {
        Self {
            color: color.into(),
            stroke_width,
            fill: None,
        }
    }

    /// Stroke color, falling back to black for unparseable strings.
    pub fn stroke(&self) -> Color {
        parse_color(&self.color).unwrap_or(Color::BLACK)
    }

    /// Fill color, if any and parseable.
    pub fn fill(&self) -> Option<Color> {
        self.fill.as_deref().and_then(parse_color)
    }
}

/// Parse a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
pub fn parse_color(color: &str) -> Option<Color> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            Some(Color::from_rgba8(r * 17, g * 17, b * 17, 255))
        }
        6 => Some(Color::from_rgba8(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        )),
        8 => Some(Color::from_rgba8(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        )),
        _ => None,
    }
}

/// Common behavior of all element geometries.
pub trait ShapeTrait {
    /// Wire discriminator.
    fn kind(&self) -> ElementType;

    /// Bounding box in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point is within `threshold` of the rendered shape.
    fn hit_test(&self, point: Point, threshold: f64) -> bool;

    /// Whether the geometry covers any area or length at all.
    fn has_extent(&self) -> bool;
}

/// Type-specific geometry of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Path(Path),
    Rectangle(Rectangle),
    Circle(Circle),
    Line(Line),
    Text(Text),
}

impl Shape {
    pub fn kind(&self) -> ElementType {
        match self {
            Shape::Path(s) => s.kind(),
            Shape::Rectangle(s) => s.kind(),
            Shape::Circle(s) => s.kind(),
            Shape::Line(s) => s.kind(),
            Shape::Text(s) => s.kind(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Path(s) => s.bounds(),
            Shape::Rectangle(s) => s.bounds(),
            Shape::Circle(s) => s.bounds(),
            Shape::Line(s) => s.bounds(),
            Shape::Text(s) => s.bounds(),
        }
    }

    pub fn hit_test(&self, point: Point, threshold: f64) -> bool {
        match self {
            Shape::Path(s) => s.hit_test(point, threshold),
            Shape::Rectangle(s) => s.hit_test(point, threshold),
            Shape::Circle(s) => s.hit_test(point, threshold),
            Shape::Line(s) => s.hit_test(point, threshold),
            Shape::Text(s) => s.hit_test(point, threshold),
        }
    }

    pub fn has_extent(&self) -> bool {
        match self {
            Shape::Path(s) => s.has_extent(),
            Shape::Rectangle(s) => s.has_extent(),
            Shape::Circle(s) => s.has_extent(),
            Shape::Line(s) => s.has_extent(),
            Shape::Text(s) => s.has_extent(),
        }
    }

    /// Stroke outline for geometric shapes. Text has none.
    pub fn to_path(&self) -> Option<BezPath> {
        match self {
            Shape::Path(s) => Some(s.to_path()),
            Shape::Rectangle(s) => Some(s.to_path()),
            Shape::Circle(s) => Some(s.to_path()),
            Shape::Line(s) => Some(s.to_path()),
            Shape::Text(_) => None,
        }
    }

    /// Serialize the geometry alone, as it appears under `data` on the wire.
    fn serialize_data<S: SerializeStruct>(&self, state: &mut S) -> Result<(), S::Error> {
        match self {
            Shape::Path(s) => state.serialize_field("data", s),
            Shape::Rectangle(s) => state.serialize_field("data", s),
            Shape::Circle(s) => state.serialize_field("data", s),
            Shape::Line(s) => state.serialize_field("data", s),
            Shape::Text(s) => state.serialize_field("data", s),
        }
    }

    fn from_data(kind: ElementType, data: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ElementType::Path => Shape::Path(serde_json::from_value(data)?),
            ElementType::Rectangle => Shape::Rectangle(serde_json::from_value(data)?),
            ElementType::Circle => Shape::Circle(serde_json::from_value(data)?),
            ElementType::Line => Shape::Line(serde_json::from_value(data)?),
            ElementType::Text => Shape::Text(serde_json::from_value(data)?),
        })
    }
}

/// A committed drawing primitive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawElement")]
pub struct Element {
    pub id: ElementId,
    pub shape: Shape,
    pub style: ElementStyle,
    /// Authoring user.
    pub created_by: String,
    /// Set by the persistence gateway; opaque to the core.
    pub created_at: Option<String>,
}

impl Element {
    /// Create a new element with a fresh id.
    ///
    /// Fill is dropped for shapes that are not closed.
    pub fn new(shape: Shape, mut style: ElementStyle, created_by: impl Into<String>) -> Self {
        if !shape.kind().is_closed() {
            style.fill = None;
        }
        Self {
            id: Uuid::new_v4(),
            shape,
            style,
            created_by: created_by.into(),
            created_at: None,
        }
    }

    pub fn kind(&self) -> ElementType {
        self.shape.kind()
    }

    /// Hit test with a threshold scaled from this element's stroke width.
    pub fn hit_test(&self, point: Point, min_threshold: f64) -> bool {
        let threshold = hit::threshold_for(self.style.stroke_width, min_threshold);
        self.shape.hit_test(point, threshold)
    }

    pub fn bounds(&self) -> Rect {
        self.shape.bounds()
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.created_at.is_some() { 6 } else { 5 };
        let mut state = serializer.serialize_struct("Element", fields)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.kind())?;
        self.shape.serialize_data(&mut state)?;
        state.serialize_field("style", &self.style)?;
        state.serialize_field("createdBy", &self.created_by)?;
        if let Some(created_at) = &self.created_at {
            state.serialize_field("createdAt", created_at)?;
        } else {
            state.skip_field("createdAt")?;
        }
        state.end()
    }
}

/// Element as it arrives on the wire, before `data` is matched to `type`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    id: ElementId,
    #[serde(rename = "type")]
    kind: ElementType,
    data: serde_json::Value,
    style: ElementStyle,
    created_by: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl TryFrom<RawElement> for Element {
    type Error = String;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let shape = Shape::from_data(raw.kind, raw.data)
            .map_err(|e| format!("invalid {} data: {}", raw.kind.as_str(), e))?;
        Ok(Self {
            id: raw.id,
            shape,
            style: raw.style,
            created_by: raw.created_by,
            created_at: raw.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let element = Element::new(
            Shape::Rectangle(Rectangle::new(0.0, 0.0, 50.0, 50.0)),
            ElementStyle::new("#ff0000", 3.0),
            "alice",
        );
        let json = serde_json::to_value(&element).unwrap();

        assert_eq!(json["type"], "rectangle");
        assert_eq!(json["data"]["width"], 50.0);
        assert_eq!(json["style"]["strokeWidth"], 3.0);
        assert_eq!(json["createdBy"], "alice");
        assert!(json.get("createdAt").is_none());
        assert!(json["style"].get("fill").is_none());
    }

    #[test]
    fn test_parse_wire_element() {
        let json = r##"{
            "id": "6f1c1b1e-8a49-4c64-9d58-1f0f4b7d8a11",
            "type": "path",
            "data": {"path": [{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}]},
            "style": {"color": "#000000", "strokeWidth": 2},
            "createdBy": "bob",
            "createdAt": "2024-01-01T00:00:00Z"
        }"##;
        let element: Element = serde_json::from_str(json).unwrap();

        assert_eq!(element.kind(), ElementType::Path);
        assert_eq!(element.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        match &element.shape {
            Shape::Path(p) => assert_eq!(p.points.len(), 2),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_data_is_rejected() {
        let json = r##"{
            "id": "6f1c1b1e-8a49-4c64-9d58-1f0f4b7d8a11",
            "type": "circle",
            "data": {"x": 0, "y": 0, "width": 1, "height": 1},
            "style": {"color": "#000000", "strokeWidth": 2},
            "createdBy": "bob"
        }"##;
        assert!(serde_json::from_str::<Element>(json).is_err());
    }

    #[test]
    fn test_fill_only_for_closed_shapes() {
        let mut style = ElementStyle::default();
        style.fill = Some("#00ff00".to_string());

        let line = Element::new(
            Shape::Line(Line::new(Point::ZERO, Point::new(10.0, 10.0))),
            style.clone(),
            "u",
        );
        assert!(line.style.fill.is_none());

        let circle = Element::new(Shape::Circle(Circle::new(0.0, 0.0, 5.0)), style, "u");
        assert_eq!(circle.style.fill.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000"), Some(Color::from_rgba8(255, 0, 0, 255)));
        assert_eq!(parse_color("#fff"), Some(Color::from_rgba8(255, 255, 255, 255)));
        assert_eq!(parse_color("#00000080"), Some(Color::from_rgba8(0, 0, 0, 128)));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#12345"), None);
    }
}
