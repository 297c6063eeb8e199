//! Geometry and point values attached to cells.
//!
//! Numeric attributes are stored as their source text and parsed on access, so
//! values calibration does not touch are written back byte-for-byte.

use crate::{attributes::Attributes, element::Element, xml::XmlWriter};

/// The `as` value marking a geometry's waypoint list.
pub const WAYPOINTS_AS: &str = "points";

/// What a point is used for, derived from its `as` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointRole {
    /// `as="sourcePoint"`
    Source,
    /// `as="targetPoint"`
    Target,
    /// `as="offset"`; the only role allowed to omit coordinates.
    Offset,
    /// No `as` attribute, as used by waypoints inside an `Array`.
    Unlabeled,
    /// Any other `as` value.
    Other(String),
}

impl PointRole {
    pub fn from_as(value: Option<&str>) -> Self {
        match value {
            Some("sourcePoint") => Self::Source,
            Some("targetPoint") => Self::Target,
            Some("offset") => Self::Offset,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Unlabeled,
        }
    }
}

/// A coordinate pair inside a geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    attrs: Attributes,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            attrs: Attributes::new()
                .with("x", format_number(x))
                .with("y", format_number(y)),
        }
    }

    pub fn from_attrs(attrs: Attributes) -> Self {
        Self { attrs }
    }

    /// Sets the `as` attribute, e.g. `sourcePoint`.
    pub fn with_as(mut self, role: &str) -> Self {
        self.attrs.set("as", role);
        self
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn role(&self) -> PointRole {
        PointRole::from_as(self.attrs.get("as"))
    }

    pub fn x(&self) -> Option<f64> {
        parse_number(self.attrs.get("x")?)
    }

    pub fn y(&self) -> Option<f64> {
        parse_number(self.attrs.get("y")?)
    }

    pub fn write(&self, writer: &mut XmlWriter) {
        writer.empty("mxPoint", &self.attrs);
    }
}

/// The `mxGeometry` child of a cell.
///
/// Vertices use the absolute `x`/`y`/`width`/`height` attributes. Edges carry
/// a relative geometry whose content is a set of labelled points and an
/// optional waypoint list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    attrs: Attributes,
    points: Vec<Point>,
    waypoints: Option<Vec<Point>>,
    children: Vec<Element>,
}

impl Geometry {
    pub fn new(attrs: Attributes) -> Self {
        Self {
            attrs,
            ..Self::default()
        }
    }

    /// Creates an absolute geometry with the given bounds.
    pub fn absolute(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(
            Attributes::new()
                .with("x", format_number(x))
                .with("y", format_number(y))
                .with("width", format_number(width))
                .with("height", format_number(height))
                .with("as", "geometry"),
        )
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Point>) -> Self {
        self.waypoints = Some(waypoints);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn x(&self) -> Option<f64> {
        parse_number(self.attrs.get("x")?)
    }

    pub fn y(&self) -> Option<f64> {
        parse_number(self.attrs.get("y")?)
    }

    pub fn width(&self) -> Option<f64> {
        parse_number(self.attrs.get("width")?)
    }

    pub fn height(&self) -> Option<f64> {
        parse_number(self.attrs.get("height")?)
    }

    pub fn set_x(&mut self, x: f64) {
        self.attrs.set("x", format_number(x));
    }

    pub fn set_y(&mut self, y: f64) {
        self.attrs.set("y", format_number(y));
    }

    /// Returns `true` for `relative="1"` geometries (edges and edge labels).
    pub fn is_relative(&self) -> bool {
        self.attrs.get("relative") == Some("1")
    }

    /// Labelled points that are direct children of the geometry.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Finds the first direct point with the given role.
    pub fn point(&self, role: &PointRole) -> Option<&Point> {
        self.points.iter().find(|point| point.role() == *role)
    }

    /// The ordered waypoint list, if the geometry has one.
    pub fn waypoints(&self) -> Option<&[Point]> {
        self.waypoints.as_deref()
    }

    /// Removes the waypoint list and returns it.
    pub fn take_waypoints(&mut self) -> Option<Vec<Point>> {
        self.waypoints.take()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn write(&self, writer: &mut XmlWriter) {
        if self.points.is_empty() && self.waypoints.is_none() && self.children.is_empty() {
            writer.empty("mxGeometry", &self.attrs);
            return;
        }

        writer.open("mxGeometry", &self.attrs);
        for point in &self.points {
            point.write(writer);
        }
        if let Some(waypoints) = &self.waypoints {
            let array_attrs = Attributes::new().with("as", WAYPOINTS_AS);
            if waypoints.is_empty() {
                writer.empty("Array", &array_attrs);
            } else {
                writer.open("Array", &array_attrs);
                for point in waypoints {
                    point.write(writer);
                }
                writer.close("Array");
            }
        }
        for child in &self.children {
            child.write(writer);
        }
        writer.close("mxGeometry");
    }
}

/// Parses a plain numeric attribute value.
///
/// Accepts the literal forms the host writes (`12`, `-4.5`, `.5`, `1e3`) and
/// rejects units, blanks and non-finite spellings such as `NaN`.
pub fn parse_number(text: &str) -> Option<f64> {
    if !is_numeric_literal(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Returns `true` if `text` is a plain decimal literal with an optional
/// sign, fraction and exponent.
pub fn is_numeric_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Formats a coordinate the way the host writes them: integers without a
/// fractional part, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // Also normalizes negative zero.
        return format!("{}", value as i64);
    }
    format!("{value}")
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn coordinate_strategy() -> impl Strategy<Value = f64> {
        -100_000.0f64..100_000.0
    }

    /// Formatting then parsing a finite value yields the same value.
    fn check_format_parse_roundtrip(value: f64) -> Result<(), TestCaseError> {
        let text = format_number(value);
        let parsed = parse_number(&text);

        prop_assert!(parsed.is_some(), "{text} did not parse");
        prop_assert!(approx_eq!(f64, parsed.unwrap_or_default(), value, ulps = 2));
        Ok(())
    }

    proptest! {
        #[test]
        fn format_parse_roundtrip(value in coordinate_strategy()) {
            check_format_parse_roundtrip(value)?;
        }
    }
}
