//! Cells, the atomic unit of a document.

use crate::{
    attributes::Attributes, element::Element, geometry::Geometry, style::Style, xml::XmlWriter,
};

/// The discriminated view of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind<'a> {
    /// A shape with absolute geometry (`vertex="1"`).
    Vertex,
    /// A connector between two cells (`edge="1"`).
    Edge {
        source: Option<&'a str>,
        target: Option<&'a str>,
    },
    /// Structural cells: the reserved root, layers and plain groups.
    Container,
}

/// A `UserObject`/`object` element that carries the id and label of the
/// `mxCell` nested inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapper {
    name: String,
    attrs: Attributes,
}

impl Wrapper {
    pub fn new(name: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }
}

/// One `mxCell`, with its geometry and any other children.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    attrs: Attributes,
    wrapper: Option<Wrapper>,
    geometry: Option<Geometry>,
    children: Vec<Element>,
}

impl Cell {
    pub fn new(attrs: Attributes) -> Self {
        Self {
            attrs,
            wrapper: None,
            geometry: None,
            children: Vec::new(),
        }
    }

    /// Creates a vertex cell under `parent`.
    pub fn vertex(id: &str, parent: &str, geometry: Geometry) -> Self {
        Self::new(
            Attributes::new()
                .with("id", id)
                .with("vertex", "1")
                .with("parent", parent),
        )
        .with_geometry(geometry)
    }

    /// Creates an edge cell under `parent` with an empty relative geometry.
    pub fn edge(id: &str, parent: &str, source: &str, target: &str) -> Self {
        Self::new(
            Attributes::new()
                .with("id", id)
                .with("edge", "1")
                .with("parent", parent)
                .with("source", source)
                .with("target", target),
        )
        .with_geometry(Geometry::new(
            Attributes::new().with("relative", "1").with("as", "geometry"),
        ))
    }

    pub fn with_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_style(mut self, style: &Style) -> Self {
        self.set_style(style);
        self
    }

    /// The cell id, taken from the wrapper when the `mxCell` has none.
    pub fn id(&self) -> Option<&str> {
        self.attrs
            .get("id")
            .or_else(|| self.wrapper.as_ref().and_then(|w| w.attrs.get("id")))
    }

    pub fn parent(&self) -> Option<&str> {
        self.attrs.get("parent")
    }

    pub fn is_vertex(&self) -> bool {
        self.attrs.get("vertex") == Some("1")
    }

    pub fn is_edge(&self) -> bool {
        self.attrs.get("edge") == Some("1")
    }

    pub fn kind(&self) -> CellKind<'_> {
        if self.is_edge() {
            CellKind::Edge {
                source: self.attrs.get("source"),
                target: self.attrs.get("target"),
            }
        } else if self.is_vertex() {
            CellKind::Vertex
        } else {
            CellKind::Container
        }
    }

    /// The raw style attribute.
    pub fn style_text(&self) -> Option<&str> {
        self.attrs.get("style")
    }

    /// The parsed style map; empty when the cell has no style.
    pub fn style(&self) -> Style {
        self.style_text().map(Style::parse).unwrap_or_default()
    }

    pub fn set_style(&mut self, style: &Style) {
        self.attrs.set("style", style.to_string());
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn wrapper(&self) -> Option<&Wrapper> {
        self.wrapper.as_ref()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn geometry_mut(&mut self) -> Option<&mut Geometry> {
        self.geometry.as_mut()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn write(&self, writer: &mut XmlWriter) {
        if let Some(wrapper) = &self.wrapper {
            writer.open(&wrapper.name, &wrapper.attrs);
        }

        if self.geometry.is_none() && self.children.is_empty() {
            writer.empty("mxCell", &self.attrs);
        } else {
            writer.open("mxCell", &self.attrs);
            if let Some(geometry) = &self.geometry {
                geometry.write(writer);
            }
            for child in &self.children {
                child.write(writer);
            }
            writer.close("mxCell");
        }

        if let Some(wrapper) = &self.wrapper {
            writer.close(&wrapper.name);
        }
    }
}
