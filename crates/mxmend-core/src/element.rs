//! Generic XML elements for children the model does not interpret.
//!
//! Cells may carry children such as `mxRectangle as="alternateBounds"` that
//! calibration never touches. They are kept as plain element trees so a
//! document survives a parse/write cycle without losing content.

use crate::{attributes::Attributes, xml::XmlWriter};

/// A node inside an uninterpreted element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with attributes and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attrs: Attributes,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            name: name.into(),
            attrs,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Writes this element and its subtree.
    pub fn write(&self, writer: &mut XmlWriter) {
        if self.children.is_empty() {
            writer.empty(&self.name, &self.attrs);
            return;
        }

        writer.open(&self.name, &self.attrs);
        for child in &self.children {
            match child {
                Node::Element(element) => element.write(writer),
                Node::Text(text) => writer.text(text),
            }
        }
        writer.close(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_nested() {
        let element = Element::new("mxRectangle", Attributes::new().with("as", "alternateBounds"))
            .with_children(vec![Node::Text("a<b".to_string())]);

        let mut writer = XmlWriter::new();
        element.write(&mut writer);

        assert_eq!(
            writer.finish(),
            r#"<mxRectangle as="alternateBounds">a&lt;b</mxRectangle>"#
        );
    }
}
