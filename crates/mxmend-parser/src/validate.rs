//! Validation of normalized markup against the invariants the rendering host
//! assumes.
//!
//! Validation runs in passes over a parsed tree and collects every finding
//! instead of stopping at the first:
//!
//! 1. Parse check: markup that is not well-formed gets one `parser-error`
//!    and nothing else, since no other check is meaningful on it.
//! 2. Structure: `mxGraphModel` and its `root` must exist.
//! 3. Ids: every cell needs a non-blank id, unique apart from the reserved
//!    `0` and `1`.
//! 4. Points: placement inside a geometry and numeric coordinates.
//! 5. Geometry and references: vertex bounds, plus warnings for vertices
//!    without geometry and edges naming unknown cells.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info};
use roxmltree::Node;

use mxmend_core::{
    document::is_reserved_id,
    geometry::{WAYPOINTS_AS, is_numeric_literal},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    normalize::normalize,
    span::{Location, Span},
};

const MODEL_TAG: &str = "mxGraphModel";
const ROOT_TAG: &str = "root";
const CELL_TAG: &str = "mxCell";
const GEOMETRY_TAG: &str = "mxGeometry";
const POINT_TAG: &str = "mxPoint";
const ARRAY_TAG: &str = "Array";

/// Element names that wrap an `mxCell` and carry its id.
pub const WRAPPER_TAGS: [&str; 2] = ["UserObject", "object"];

/// The outcome of validating one piece of markup.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    normalized_xml: String,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Returns `true` when the rendering host can load the markup.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The normalized markup, usable even when validation failed.
    pub fn normalized_xml(&self) -> &str {
        &self.normalized_xml
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Checks whether any error carries `code`.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|error| error.code() == Some(code))
    }

    /// Renders the errors one per line, for feeding back into a repair
    /// request.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_parts(self) -> (String, Vec<Diagnostic>, Vec<Diagnostic>) {
        (self.normalized_xml, self.errors, self.warnings)
    }
}

/// Normalizes `input` and validates the result.
///
/// Never fails: malformed markup produces a report carrying errors.
pub fn validate(input: &str) -> ValidationReport {
    let normalized_xml = normalize(input);
    let mut collector = DiagnosticCollector::new();

    check(&normalized_xml, &mut collector);

    let (errors, warnings) = collector.into_parts();
    info!(
        errors = errors.len(),
        warnings = warnings.len();
        "Validated markup"
    );
    ValidationReport {
        normalized_xml,
        errors,
        warnings,
    }
}

fn check(text: &str, collector: &mut DiagnosticCollector) {
    let tree = match roxmltree::Document::parse(text) {
        Ok(tree) => tree,
        Err(err) => {
            let pos = err.pos();
            debug!(row = pos.row, col = pos.col; "Markup is not well-formed");
            collector.emit(
                Diagnostic::error(err.to_string())
                    .with_code(ErrorCode::ParserError)
                    .with_location(Location::new(pos.row as usize, pos.col as usize))
                    .with_help("the markup must be well-formed XML"),
            );
            return;
        }
    };

    let Some(model) = tree
        .descendants()
        .find(|node| node.has_tag_name(MODEL_TAG))
    else {
        collector.emit(
            Diagnostic::error("no `mxGraphModel` element found")
                .with_code(ErrorCode::MissingMxGraphModel)
                .with_help("wrap the cells in `<mxGraphModel><root>...</root></mxGraphModel>`"),
        );
        return;
    };

    let root = model.children().find(|node| node.has_tag_name(ROOT_TAG));
    if root.is_none() {
        collector.emit(
            element_diagnostic(text, model, Diagnostic::error("`mxGraphModel` has no `root`"))
                .with_code(ErrorCode::MissingRoot)
                .with_help("add a `root` element holding the cells"),
        );
    }

    let cells: Vec<Node<'_, '_>> = root
        .map(|root| {
            root.descendants()
                .filter(|node| node.has_tag_name(CELL_TAG))
                .collect()
        })
        .unwrap_or_default();

    let ids = check_ids(text, &cells, collector);
    check_points(text, model, collector);
    check_geometry_and_references(text, &cells, &ids, collector);
}

/// Reports missing and duplicate ids; returns the first cell for each id.
fn check_ids<'a, 'input>(
    text: &str,
    cells: &[Node<'a, 'input>],
    collector: &mut DiagnosticCollector,
) -> IndexMap<&'a str, Node<'a, 'input>> {
    let mut ids: IndexMap<&'a str, Node<'a, 'input>> = IndexMap::new();

    for &cell in cells {
        let Some(id) = cell_id(cell).filter(|id| !id.trim().is_empty()) else {
            collector.emit(
                element_diagnostic(text, cell, Diagnostic::error("cell has no id"))
                    .with_code(ErrorCode::MissingId)
                    .with_help("give the cell a unique, non-empty `id`"),
            );
            continue;
        };

        match ids.get(id) {
            Some(&first) if !is_reserved_id(id) => {
                collector.emit(
                    element_diagnostic(
                        text,
                        cell,
                        Diagnostic::error(format!("cell id `{id}` is used more than once")),
                    )
                    .with_secondary_label(start_tag_span(text, first), "first used here")
                    .with_code(ErrorCode::DuplicateId)
                    .with_help("give every cell a unique id"),
                );
            }
            Some(_) => {}
            None => {
                ids.insert(id, cell);
            }
        }
    }

    ids
}

fn check_points(text: &str, model: Node<'_, '_>, collector: &mut DiagnosticCollector) {
    for point in model
        .descendants()
        .filter(|node| node.has_tag_name(POINT_TAG))
    {
        if !is_point_placed(point) {
            collector.emit(
                element_diagnostic(
                    text,
                    point,
                    Diagnostic::error("point is not inside a geometry"),
                )
                .with_code(ErrorCode::InvalidMxPointLocation)
                .with_help(
                    "points belong directly under `mxGeometry` or in its `Array as=\"points\"`",
                ),
            );
        }

        if point.attribute("as") == Some("offset") {
            continue;
        }

        let missing: Vec<&str> = ["x", "y"]
            .into_iter()
            .filter(|name| !point.has_attribute(*name))
            .collect();
        if !missing.is_empty() {
            collector.emit(
                element_diagnostic(
                    text,
                    point,
                    Diagnostic::error(format!(
                        "point is missing {}",
                        quoted_list(&missing)
                    )),
                )
                .with_code(ErrorCode::MissingMxPointAttribute)
                .with_help("every point except an offset needs numeric `x` and `y`"),
            );
        }

        let invalid: Vec<&str> = ["x", "y"]
            .into_iter()
            .filter(|name| {
                point
                    .attribute(*name)
                    .is_some_and(|value| !is_numeric_literal(value))
            })
            .collect();
        if !invalid.is_empty() {
            collector.emit(
                element_diagnostic(
                    text,
                    point,
                    Diagnostic::error(format!(
                        "point has a non-numeric {}",
                        quoted_list(&invalid)
                    )),
                )
                .with_code(ErrorCode::InvalidMxPointValue)
                .with_help("coordinates must be plain numbers without units"),
            );
        }
    }
}

/// A point may sit directly under a geometry, or in the geometry's
/// waypoint array.
fn is_point_placed(point: Node<'_, '_>) -> bool {
    let Some(parent) = point.parent_element() else {
        return false;
    };
    if parent.has_tag_name(GEOMETRY_TAG) {
        return true;
    }
    parent.has_tag_name(ARRAY_TAG)
        && parent.attribute("as") == Some(WAYPOINTS_AS)
        && parent
            .parent_element()
            .is_some_and(|grandparent| grandparent.has_tag_name(GEOMETRY_TAG))
}

fn check_geometry_and_references<'a, 'input>(
    text: &str,
    cells: &[Node<'a, 'input>],
    ids: &IndexMap<&'a str, Node<'a, 'input>>,
    collector: &mut DiagnosticCollector,
) {
    let known: HashSet<&str> = ids.keys().copied().collect();

    for &cell in cells {
        if cell.attribute("vertex") == Some("1") {
            check_vertex_geometry(text, cell, collector);
        }

        if cell.attribute("edge") == Some("1") {
            for end in ["source", "target"] {
                let Some(reference) = cell.attribute(end) else {
                    continue;
                };
                if !known.contains(reference) {
                    collector.emit(
                        element_diagnostic(
                            text,
                            cell,
                            Diagnostic::warning(format!(
                                "edge {end} `{reference}` does not name any cell"
                            )),
                        )
                        .with_code(ErrorCode::DanglingEdgeReference),
                    );
                }
            }
        }
    }
}

fn check_vertex_geometry(text: &str, cell: Node<'_, '_>, collector: &mut DiagnosticCollector) {
    let Some(geometry) = cell
        .children()
        .find(|node| node.has_tag_name(GEOMETRY_TAG))
    else {
        collector.emit(
            element_diagnostic(text, cell, Diagnostic::warning("vertex has no geometry"))
                .with_code(ErrorCode::MissingGeometry),
        );
        return;
    };

    if geometry.attribute("relative") == Some("1") {
        return;
    }

    let mut invalid = Vec::new();
    for name in ["x", "y", "width", "height"] {
        let Some(value) = geometry.attribute(name) else {
            continue;
        };
        let is_size = matches!(name, "width" | "height");
        let valid = is_numeric_literal(value)
            && (!is_size || value.parse::<f64>().is_ok_and(|v| v >= 0.0));
        if !valid {
            invalid.push(name);
        }
    }

    if !invalid.is_empty() {
        collector.emit(
            element_diagnostic(
                text,
                geometry,
                Diagnostic::error(format!(
                    "vertex geometry has an invalid {}",
                    quoted_list(&invalid)
                )),
            )
            .with_code(ErrorCode::InvalidGeometryValue)
            .with_help("bounds must be plain numbers, with non-negative width and height"),
        );
    }
}

/// The id of a cell, falling back to its `UserObject`/`object` wrapper.
fn cell_id<'a>(cell: Node<'a, '_>) -> Option<&'a str> {
    cell.attribute("id").or_else(|| {
        cell.parent_element()
            .filter(|parent| WRAPPER_TAGS.iter().any(|tag| parent.has_tag_name(*tag)))
            .and_then(|parent| parent.attribute("id"))
    })
}

/// Attaches the label, location and snippet of `node`'s start tag.
fn element_diagnostic(text: &str, node: Node<'_, '_>, diagnostic: Diagnostic) -> Diagnostic {
    let span = start_tag_span(text, node);
    let label = format!("in `{}`", node.tag_name().name());
    diagnostic
        .with_label(span, label)
        .with_location(Location::of_offset(text, span.start()))
        .with_snippet(text.get(span.start()..span.end()).unwrap_or_default())
}

fn start_tag_span(text: &str, node: Node<'_, '_>) -> Span {
    let range = node.range();
    let end = text
        .get(range.clone())
        .and_then(|element| element.find('>'))
        .map(|offset| range.start + offset + 1)
        .unwrap_or(range.end);
    Span::new(range.start..end)
}

fn quoted_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(" and ")
}
