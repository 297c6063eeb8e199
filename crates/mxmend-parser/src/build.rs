//! Construction of the owned [`Document`] arena from normalized markup.
//!
//! Attribute order and children the model does not interpret are carried
//! over, so writing the document back changes only what callers edit.

use log::{debug, trace};
use roxmltree::Node;

use mxmend_core::{
    attributes::Attributes,
    cell::{Cell, Wrapper},
    document::Document,
    element::{Element, Node as ElementNode},
    geometry::{Geometry, Point, WAYPOINTS_AS},
};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::Location,
    validate::WRAPPER_TAGS,
};

/// Builds a document from markup that is already well-formed.
///
/// Callers normally go through [`crate::parse_document`], which validates
/// first. Building does not re-check the id and point invariants.
///
/// # Errors
///
/// Returns a `parser-error` when the markup does not parse, and a
/// `missing-mxgraphmodel` error when no model element exists.
pub fn build_document(text: &str) -> Result<Document, ParseError> {
    let tree = roxmltree::Document::parse(text).map_err(|err| {
        let pos = err.pos();
        Diagnostic::error(err.to_string())
            .with_code(ErrorCode::ParserError)
            .with_location(Location::new(pos.row as usize, pos.col as usize))
    })?;

    let model = tree
        .descendants()
        .find(|node| node.has_tag_name("mxGraphModel"))
        .ok_or_else(|| {
            Diagnostic::error("no `mxGraphModel` element found")
                .with_code(ErrorCode::MissingMxGraphModel)
        })?;

    let root = model.children().find(|node| node.has_tag_name("root"));
    let mut cells = Vec::new();
    if let Some(root) = root {
        for node in root.children().filter(Node::is_element) {
            match build_cell_node(node) {
                Some(cell) => cells.push(cell),
                None => trace!(tag = node.tag_name().name(); "Skipping non-cell element in root"),
            }
        }
    }

    debug!(cells = cells.len(); "Built document");
    Ok(Document::from_parts(
        attributes(model),
        root.is_some(),
        cells,
    ))
}

fn build_cell_node(node: Node<'_, '_>) -> Option<Cell> {
    let name = node.tag_name().name();
    if name == "mxCell" {
        return Some(build_cell(node));
    }

    if WRAPPER_TAGS.contains(&name) {
        let wrapper = Wrapper::new(name, attributes(node));
        let cell = node
            .children()
            .find(|child| child.has_tag_name("mxCell"))
            .map(build_cell)
            .unwrap_or_else(|| Cell::new(Attributes::new()));
        return Some(cell.with_wrapper(wrapper));
    }

    None
}

fn build_cell(node: Node<'_, '_>) -> Cell {
    let mut cell = Cell::new(attributes(node));
    let mut has_geometry = false;

    for child in node.children().filter(Node::is_element) {
        if !has_geometry && child.has_tag_name("mxGeometry") {
            cell = cell.with_geometry(build_geometry(child));
            has_geometry = true;
        } else {
            cell = cell.with_child(build_element(child));
        }
    }

    cell
}

fn build_geometry(node: Node<'_, '_>) -> Geometry {
    let mut geometry = Geometry::new(attributes(node));
    let mut has_waypoints = false;

    for child in node.children().filter(Node::is_element) {
        if child.has_tag_name("mxPoint") {
            geometry = geometry.with_point(Point::from_attrs(attributes(child)));
        } else if !has_waypoints
            && child.has_tag_name("Array")
            && child.attribute("as") == Some(WAYPOINTS_AS)
            && child
                .children()
                .filter(Node::is_element)
                .all(|point| point.has_tag_name("mxPoint"))
        {
            let waypoints = child
                .children()
                .filter(Node::is_element)
                .map(|point| Point::from_attrs(attributes(point)))
                .collect();
            geometry = geometry.with_waypoints(waypoints);
            has_waypoints = true;
        } else {
            geometry = geometry.with_child(build_element(child));
        }
    }

    geometry
}

fn build_element(node: Node<'_, '_>) -> Element {
    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(ElementNode::Element(build_element(child)))
            } else {
                child
                    .text()
                    .filter(|text| !text.trim().is_empty())
                    .map(|text| ElementNode::Text(text.to_string()))
            }
        })
        .collect();
    Element::new(node.tag_name().name(), attributes(node)).with_children(children)
}

fn attributes(node: Node<'_, '_>) -> Attributes {
    node.attributes()
        .map(|attr| (attr.name(), attr.value()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxmend_core::{cell::CellKind, geometry::PointRole};

    #[test]
    fn test_build_vertices_and_edges() {
        let document = build_document(
            r#"<mxGraphModel grid="1"><root>
                <mxCell id="0"/><mxCell id="1" parent="0"/>
                <mxCell id="a" vertex="1" parent="1" style="rounded=1;">
                  <mxGeometry x="10" y="20" width="30" height="40" as="geometry"/>
                </mxCell>
                <mxCell id="e" edge="1" parent="1" source="a" target="a">
                  <mxGeometry relative="1" as="geometry">
                    <mxPoint x="1" y="2" as="sourcePoint"/>
                    <Array as="points"><mxPoint x="5" y="6"/></Array>
                  </mxGeometry>
                </mxCell>
            </root></mxGraphModel>"#,
        )
        .unwrap();

        assert_eq!(document.model_attrs().get("grid"), Some("1"));
        assert_eq!(document.len(), 4);

        let vertex = document.get("a").unwrap();
        assert_eq!(vertex.kind(), CellKind::Vertex);
        assert_eq!(vertex.geometry().unwrap().width(), Some(30.0));

        let edge_geometry = document.get("e").unwrap().geometry().unwrap();
        assert!(edge_geometry.point(&PointRole::Source).is_some());
        assert_eq!(edge_geometry.waypoints().unwrap().len(), 1);
    }

    #[test]
    fn test_build_wrapped_cell() {
        let document = build_document(
            r#"<mxGraphModel><root><UserObject id="u" label="L"><mxCell vertex="1" parent="1"/></UserObject></root></mxGraphModel>"#,
        )
        .unwrap();

        let cell = document.get("u").unwrap();
        assert_eq!(cell.wrapper().unwrap().name(), "UserObject");
        assert!(cell.is_vertex());
    }

    #[test]
    fn test_roundtrip_preserves_unknown_children() {
        let input = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="g" vertex="1" parent="0"><mxGeometry x="1" y="2" width="3" height="4" as="geometry"><mxRectangle width="50" height="20" as="alternateBounds"/></mxGeometry><extra>note</extra></mxCell></root></mxGraphModel>"#;

        assert_eq!(build_document(input).unwrap().to_xml(), input);
    }

    #[test]
    fn test_build_without_root() {
        let document = build_document("<mxGraphModel/>").unwrap();

        assert!(!document.has_root());
        assert!(document.is_empty());
        assert_eq!(document.to_xml(), "<mxGraphModel></mxGraphModel>");
    }

    #[test]
    fn test_build_reports_parse_error() {
        let err = build_document("<mxGraphModel>").unwrap_err();

        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::ParserError));
    }
}
