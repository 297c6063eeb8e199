//! Application of `edit` repair responses.

use log::{debug, trace};

use super::Edit;

/// The edited text and which edits took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    text: String,
    applied: usize,
    skipped: Vec<usize>,
}

impl EditReport {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of edits whose search text was found.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Indices of edits that changed nothing.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Applies edits to `base` in order.
///
/// Each edit replaces the first literal occurrence of its search text in the
/// text produced by the edits before it. An edit whose search text is empty
/// or absent is skipped; the rest still apply.
pub fn apply_edits(base: &str, edits: &[Edit]) -> EditReport {
    let mut text = base.to_string();
    let mut applied = 0;
    let mut skipped = Vec::new();

    for (index, edit) in edits.iter().enumerate() {
        if edit.search().is_empty() || !text.contains(edit.search()) {
            trace!(index; "Edit search text not found");
            skipped.push(index);
            continue;
        }
        text = text.replacen(edit.search(), edit.replace(), 1);
        applied += 1;
    }

    debug!(applied, skipped = skipped.len(); "Applied repair edits");
    EditReport {
        text,
        applied,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_literal_replacement() {
        let report = apply_edits("...A...", &[Edit::new("A", "B")]);

        assert_eq!(report.text(), "...B...");
        assert_eq!(report.applied(), 1);
        assert!(report.skipped().is_empty());
    }

    #[test]
    fn test_missing_search_is_noop() {
        let report = apply_edits("...A...", &[Edit::new("Z", "B")]);

        assert_eq!(report.text(), "...A...");
        assert_eq!(report.skipped(), &[0]);
    }

    #[test]
    fn test_partial_application_in_order() {
        let edits = [
            Edit::new("id=\"2\"", "id=\"3\""),
            Edit::new("missing", "x"),
            Edit::new("id=\"3\"", "id=\"4\""),
            Edit::new("", "x"),
        ];
        let report = apply_edits(r#"<a id="2"/><b id="2"/>"#, &edits);

        assert_eq!(report.text(), r#"<a id="4"/><b id="2"/>"#);
        assert_eq!(report.applied(), 2);
        assert_eq!(report.skipped(), &[1, 3]);
    }

    #[test]
    fn test_search_is_not_a_pattern() {
        let report = apply_edits("a.c abc", &[Edit::new("a.c", "x")]);

        assert_eq!(report.into_text(), "x abc");
    }
}
