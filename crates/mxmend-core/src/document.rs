//! The owned document tree.
//!
//! A [`Document`] is an arena of [`Cell`]s addressed by [`CellHandle`]s with
//! a separate id lookup. Cells keep their source order, which is also the
//! order they are written back in.

use indexmap::IndexMap;
use log::debug;

use crate::{attributes::Attributes, cell::Cell, xml::XmlWriter};

/// Id of the synthetic root cell.
pub const ROOT_CELL_ID: &str = "0";

/// Id of the default layer every visible cell lives under.
pub const LAYER_CELL_ID: &str = "1";

/// Returns `true` for the two ids content cells may never use.
pub fn is_reserved_id(id: &str) -> bool {
    id == ROOT_CELL_ID || id == LAYER_CELL_ID
}

/// Index of a cell inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellHandle(usize);

impl CellHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A parsed graph model.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    model: Attributes,
    has_root: bool,
    cells: Vec<Cell>,
    index: IndexMap<String, CellHandle>,
}

impl Default for Document {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl Document {
    /// Creates a document from its parts.
    ///
    /// `has_root` records whether the source markup had a `root` element;
    /// documents without one have no cells.
    pub fn from_parts(model: Attributes, has_root: bool, cells: Vec<Cell>) -> Self {
        let mut document = Self {
            model,
            has_root,
            cells: Vec::with_capacity(cells.len()),
            index: IndexMap::new(),
        };
        for cell in cells {
            document.push(cell);
        }
        document
    }

    /// The empty tree: the reserved root cell and its default layer.
    pub fn placeholder() -> Self {
        Self::from_parts(
            Attributes::new(),
            true,
            vec![
                Cell::new(Attributes::new().with("id", ROOT_CELL_ID)),
                Cell::new(
                    Attributes::new()
                        .with("id", LAYER_CELL_ID)
                        .with("parent", ROOT_CELL_ID),
                ),
            ],
        )
    }

    /// Appends a cell and returns its handle.
    ///
    /// When the id is already taken the lookup keeps pointing at the first
    /// cell; validation reports such documents before they get here.
    pub fn push(&mut self, cell: Cell) -> CellHandle {
        let handle = CellHandle(self.cells.len());
        if let Some(id) = cell.id() {
            if self.index.contains_key(id) {
                debug!(id; "Duplicate cell id, keeping first lookup entry");
            } else {
                self.index.insert(id.to_string(), handle);
            }
        }
        self.cells.push(cell);
        handle
    }

    /// Replaces the cell stored at `handle`, returning the previous value.
    pub fn replace(&mut self, handle: CellHandle, cell: Cell) -> Cell {
        let previous = std::mem::replace(&mut self.cells[handle.0], cell);
        if let Some(old_id) = previous.id() {
            if self.index.get(old_id) == Some(&handle) {
                self.index.shift_remove(old_id);
            }
        }
        if let Some(new_id) = self.cells[handle.0].id() {
            self.index.entry(new_id.to_string()).or_insert(handle);
        }
        previous
    }

    /// Drops every cell except the reserved root and layer.
    pub fn clear_content(&mut self) {
        let cells = std::mem::take(&mut self.cells);
        self.index.clear();
        for cell in cells {
            if cell.id().is_some_and(is_reserved_id) {
                self.push(cell);
            }
        }
    }

    pub fn model_attrs(&self) -> &Attributes {
        &self.model
    }

    pub fn has_root(&self) -> bool {
        self.has_root
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn handle(&self, id: &str) -> Option<CellHandle> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Cell> {
        self.handle(id).map(|handle| &self.cells[handle.0])
    }

    pub fn cell(&self, handle: CellHandle) -> &Cell {
        &self.cells[handle.0]
    }

    pub fn cell_mut(&mut self, handle: CellHandle) -> &mut Cell {
        &mut self.cells[handle.0]
    }

    /// Iterates handles in document order.
    pub fn handles(&self) -> impl Iterator<Item = CellHandle> + use<> {
        (0..self.cells.len()).map(CellHandle)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Iterates cells that are not the reserved root or layer.
    pub fn content_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(|cell| !cell.id().is_some_and(is_reserved_id))
    }

    /// Serializes to an `mxGraphModel` tree.
    pub fn to_xml(&self) -> String {
        let mut writer = XmlWriter::new();
        self.write(&mut writer);
        writer.finish()
    }

    /// Serializes wrapped in the outer `mxfile`/`diagram` container.
    pub fn to_mxfile(&self, diagram_name: &str) -> String {
        let mut writer = XmlWriter::new();
        writer.open("mxfile", &Attributes::new().with("host", "mxmend"));
        writer.open(
            "diagram",
            &Attributes::new()
                .with("id", "diagram-0")
                .with("name", diagram_name),
        );
        self.write(&mut writer);
        writer.close("diagram");
        writer.close("mxfile");
        writer.finish()
    }

    fn write(&self, writer: &mut XmlWriter) {
        writer.open("mxGraphModel", &self.model);
        if self.has_root {
            writer.open("root", &Attributes::new());
            for cell in &self.cells {
                cell.write(writer);
            }
            writer.close("root");
        }
        writer.close("mxGraphModel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn test_placeholder_xml() {
        assert_eq!(
            Document::placeholder().to_xml(),
            r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel>"#
        );
    }

    #[test]
    fn test_lookup_and_content() {
        let mut document = Document::placeholder();
        let handle = document.push(Cell::vertex(
            "a",
            LAYER_CELL_ID,
            Geometry::absolute(0.0, 0.0, 10.0, 10.0),
        ));

        assert_eq!(document.handle("a"), Some(handle));
        assert_eq!(document.content_cells().count(), 1);
        assert_eq!(document.len(), 3);
    }

    #[test]
    fn test_replace_updates_index() {
        let mut document = Document::placeholder();
        let handle = document.push(Cell::edge("e", LAYER_CELL_ID, "a", "b"));

        document.replace(handle, Cell::edge("f", LAYER_CELL_ID, "a", "b"));

        assert!(document.handle("e").is_none());
        assert_eq!(document.handle("f"), Some(handle));
    }

    #[test]
    fn test_clear_content_keeps_reserved() {
        let mut document = Document::placeholder();
        document.push(Cell::edge("e", LAYER_CELL_ID, "a", "b"));

        document.clear_content();

        assert_eq!(document, Document::placeholder());
    }

    #[test]
    fn test_mxfile_wraps_model() {
        let xml = Document::placeholder().to_mxfile("Page-1");

        assert!(xml.starts_with("<mxfile"));
        assert!(xml.contains(r#"<diagram id="diagram-0" name="Page-1"><mxGraphModel>"#));
        assert!(xml.ends_with("</diagram></mxfile>"));
    }
}
