//! XML text escaping and a minimal streaming writer.

use crate::attributes::Attributes;

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Escapes text for use inside an attribute value or element body.
///
/// Characters outside the XML 1.0 range are dropped. Newlines inside
/// attribute values are written as character references so they survive a
/// round-trip through attribute-value normalization.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#xa;"),
            '\r' => escaped.push_str("&#xd;"),
            '\t' => escaped.push_str("&#x9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Appends markup to an owned buffer.
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `<name attr="...">`.
    pub fn open(&mut self, name: &str, attrs: &Attributes) {
        self.start_tag(name, attrs);
        self.out.push('>');
    }

    /// Writes `<name attr="..."/>`.
    pub fn empty(&mut self, name: &str, attrs: &Attributes) {
        self.start_tag(name, attrs);
        self.out.push_str("/>");
    }

    /// Writes `</name>`.
    pub fn close(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    /// Writes escaped character data.
    pub fn text(&mut self, text: &str) {
        self.out.push_str(&escape_xml(text));
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn start_tag(&mut self, name: &str, attrs: &Attributes) {
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs.iter() {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape_xml(value));
            self.out.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_invalid_control_chars() {
        let s = "A\u{0007}B\u{000C}C";
        assert_eq!(escape_xml(s), "ABC");
    }

    #[test]
    fn escape_special_xml_chars() {
        let s = r#"<tag attr="x&y">'z'"#;
        assert_eq!(
            escape_xml(s),
            "&lt;tag attr=&quot;x&amp;y&quot;&gt;&apos;z&apos;"
        );
    }

    #[test]
    fn escape_line_breaks_as_references() {
        assert_eq!(escape_xml("a\nb"), "a&#xa;b");
    }

    #[test]
    fn writer_produces_nested_markup() {
        let mut writer = XmlWriter::new();
        writer.open("root", &Attributes::new());
        writer.empty("mxCell", &Attributes::new().with("id", "0"));
        writer.close("root");

        assert_eq!(writer.finish(), r#"<root><mxCell id="0"/></root>"#);
    }
}
