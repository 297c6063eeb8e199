//! Normalization of raw generated markup.
//!
//! Generated text rarely arrives as a clean `mxGraphModel` tree. It may be
//! wrapped in the outer `mxfile` container, fenced as a markdown code block,
//! surrounded by prose, or reduced to a bare list of cells. [`normalize`]
//! turns all of these into a single string for validation and never fails:
//! input with nothing to salvage becomes the empty placeholder tree.

use std::sync::OnceLock;

use log::{debug, trace};
use regex::Regex;

use mxmend_core::document::{Document, LAYER_CELL_ID, ROOT_CELL_ID};

const MODEL_OPEN: &str = "<mxGraphModel";
const MODEL_CLOSE: &str = "</mxGraphModel>";
const FILE_OPEN: &str = "<mxfile";

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*```[\w+-]*[ \t]*\r?$\n?").expect("valid regex"))
}

fn disallowed_construct_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // XML declarations, processing instructions, comments and DOCTYPE
        // blocks, including an internal subset.
        Regex::new(r"(?s)<\?.*?\?>|<!--.*?-->|<!DOCTYPE(?:[^\[>]|\[.*?\])*>")
            .expect("valid regex")
    })
}

fn root_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<root[\s/>]").expect("valid regex"))
}

fn cell_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(?:mxCell|UserObject|object)[\s/>]").expect("valid regex"))
}

fn cell_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<mxCell\b[^>]*?\sid\s*=\s*["']([^"']*)["']"#).expect("valid regex")
    })
}

/// Normalizes raw markup into a string rooted at `mxGraphModel`.
///
/// - Markup that already starts with `mxGraphModel` is kept as-is.
/// - Markup exposing the `mxfile` container has its inner model extracted;
///   a container without one (for example a compressed diagram) is kept so
///   validation can report the missing model.
/// - Anything else is sanitized: code fences, XML declarations, DOCTYPE
///   blocks, comments and processing instructions are stripped, then a
///   `root` block or a run of bare cells is wrapped in the model tags.
/// - If nothing can be salvaged the empty placeholder tree is returned.
pub fn normalize(input: &str) -> String {
    let unfenced = code_fence_regex().replace_all(input, "");
    let text = unfenced.trim();

    if text.starts_with(MODEL_OPEN) {
        trace!("Markup already rooted at mxGraphModel");
        return text.to_string();
    }

    if text.contains(FILE_OPEN) {
        return match extract_model(text) {
            Some(model) => {
                debug!("Extracted mxGraphModel from mxfile container");
                model.to_string()
            }
            None => {
                debug!("mxfile container without an inline mxGraphModel");
                text.to_string()
            }
        };
    }

    let sanitized = disallowed_construct_regex().replace_all(text, "");
    let sanitized = sanitized.trim();

    if let Some(model) = extract_model(sanitized) {
        debug!("Extracted mxGraphModel from surrounding text");
        return model.to_string();
    }

    if let Some(root) = extract_root(sanitized) {
        debug!("Wrapped bare root block in mxGraphModel");
        return format!("<mxGraphModel>{root}</mxGraphModel>");
    }

    if let Some(cells) = extract_cells(sanitized) {
        debug!("Wrapped bare cells in mxGraphModel");
        return format!(
            "<mxGraphModel><root>{}{cells}</root></mxGraphModel>",
            missing_reserved_cells(cells)
        );
    }

    debug!("Nothing salvageable, using placeholder document");
    Document::placeholder().to_xml()
}

/// Slices out the first `mxGraphModel` element, through the first closing
/// tag that follows it. Models never nest, so later pages are left behind.
fn extract_model(text: &str) -> Option<&str> {
    let start = text.find(MODEL_OPEN)?;
    let end = text[start..]
        .find(MODEL_CLOSE)
        .map(|offset| start + offset + MODEL_CLOSE.len())
        .unwrap_or(text.len());
    Some(&text[start..end])
}

fn extract_root(text: &str) -> Option<&str> {
    let start = root_open_regex().find(text)?.start();
    let end = text[start..]
        .rfind("</root>")
        .map(|offset| start + offset + "</root>".len())
        .or_else(|| {
            // A self-closing `<root/>` has no separate closing tag.
            let tag_end = start + text[start..].find('>')? + 1;
            text[..tag_end].ends_with("/>").then_some(tag_end)
        })?;
    Some(&text[start..end])
}

/// Slices from the first cell tag to the end of the last complete tag.
fn extract_cells(text: &str) -> Option<&str> {
    let start = cell_open_regex().find(text)?.start();
    let end = text.rfind('>')? + 1;
    (end > start).then(|| &text[start..end])
}

/// Returns the reserved cells a bare cell list does not define itself.
fn missing_reserved_cells(cells: &str) -> String {
    let mut has_root_cell = false;
    let mut has_layer_cell = false;
    for capture in cell_id_regex().captures_iter(cells) {
        match capture.get(1).map(|id| id.as_str()) {
            Some(ROOT_CELL_ID) => has_root_cell = true,
            Some(LAYER_CELL_ID) => has_layer_cell = true,
            _ => {}
        }
    }

    let mut reserved = String::new();
    if !has_root_cell {
        reserved.push_str(&format!(r#"<mxCell id="{ROOT_CELL_ID}"/>"#));
    }
    if !has_layer_cell {
        reserved.push_str(&format!(
            r#"<mxCell id="{LAYER_CELL_ID}" parent="{ROOT_CELL_ID}"/>"#
        ));
    }
    reserved
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel>"#;

    #[test]
    fn test_model_kept_as_is() {
        assert_eq!(normalize(MODEL), MODEL);
        assert_eq!(normalize(&format!("\n  {MODEL}\n")), MODEL);
    }

    #[test]
    fn test_extracts_model_from_mxfile() {
        let input = format!(
            r#"<mxfile host="app"><diagram id="d" name="Page-1">{MODEL}</diagram></mxfile>"#
        );
        assert_eq!(normalize(&input), MODEL);
    }

    #[test]
    fn test_extracts_first_page_of_multi_page_mxfile() {
        let second = MODEL.replace(r#"id="1" parent="0""#, r#"id="1" parent="0" value="second""#);
        let input = format!(
            r#"<mxfile><diagram id="p1" name="Page-1">{MODEL}</diagram><diagram id="p2" name="Page-2">{second}</diagram></mxfile>"#
        );

        let normalized = normalize(&input);

        assert_eq!(normalized, MODEL);
        assert!(roxmltree::Document::parse(&normalized).is_ok());
    }

    #[test]
    fn test_keeps_mxfile_without_model() {
        let input = r#"<mxfile><diagram id="d">7ZdNb5swGMc/</diagram></mxfile>"#;
        assert_eq!(normalize(input), input);
    }

    #[test]
    fn test_strips_code_fences() {
        let input = format!("```xml\n{MODEL}\n```");
        assert_eq!(normalize(&input), MODEL);
    }

    #[test]
    fn test_extracts_model_from_prose() {
        let input = format!("Here is your diagram:\n{MODEL}\nEnjoy!");
        assert_eq!(normalize(&input), MODEL);
    }

    #[test]
    fn test_strips_declaration_and_comments() {
        let input = r#"<?xml version="1.0"?><!-- generated --><root><mxCell id="0"/></root>"#;
        assert_eq!(
            normalize(input),
            r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#
        );
    }

    #[test]
    fn test_strips_doctype_with_subset() {
        let input = r#"<!DOCTYPE x [<!ENTITY a "b">]><root/>"#;
        assert_eq!(normalize(input), "<mxGraphModel><root/></mxGraphModel>");
    }

    #[test]
    fn test_wraps_bare_cells_with_reserved() {
        let input = r#"<mxCell id="a" vertex="1" parent="1"><mxGeometry width="10" height="10" as="geometry"/></mxCell>"#;
        assert_eq!(
            normalize(input),
            format!(
                r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/>{input}</root></mxGraphModel>"#
            )
        );
    }

    #[test]
    fn test_bare_cells_keep_existing_reserved() {
        let input = r#"<mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="a" vertex="1" parent="1"/>"#;
        assert_eq!(
            normalize(input),
            format!("<mxGraphModel><root>{input}</root></mxGraphModel>")
        );
    }

    #[test]
    fn test_unsalvageable_becomes_placeholder() {
        assert_eq!(normalize("sorry, I cannot draw that"), MODEL);
        assert_eq!(normalize(""), MODEL);
    }
}
