//! Ownership of the current document and its hand-off to the renderer.
//!
//! A [`DocumentStore`] is the only place the current document changes. Each
//! applied fragment either replaces the content layer or merges into it;
//! the previous value goes to the [`HistorySink`] and the new one to the
//! [`RenderHost`].

use std::fmt;

use futures::future::BoxFuture;
use log::{debug, info, warn};
use thiserror::Error;

use mxmend_core::document::{Document, is_reserved_id};
use mxmend_parser::{error::ParseError, parse_document};

/// Where a generated fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOrigin {
    /// A generation that describes the whole canvas.
    FullCanvas,
    /// An edit to part of the canvas.
    Incremental,
}

/// How a fragment was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Replaced,
    Merged,
}

impl fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replaced => write!(f, "replaced"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// The rendering host could not load a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rendering host failed to load the document: {message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The editor surface that displays the current document.
pub trait RenderHost {
    fn load<'a>(&'a mut self, xml: &'a str) -> BoxFuture<'a, Result<(), HostError>>;
}

/// Receives the document value each apply replaces.
pub trait HistorySink {
    fn record(&mut self, snapshot: String);
}

impl HistorySink for Vec<String> {
    fn record(&mut self, snapshot: String) {
        self.push(snapshot);
    }
}

/// What applying a fragment did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    mode: ApplyMode,
    cells_added: usize,
    cells_replaced: usize,
    host_error: Option<HostError>,
}

impl ApplyOutcome {
    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Fragment cells that did not overwrite an existing cell.
    pub fn cells_added(&self) -> usize {
        self.cells_added
    }

    /// Existing content cells that were overwritten or, when replacing,
    /// dropped.
    pub fn cells_replaced(&self) -> usize {
        self.cells_replaced
    }

    /// The host failure, if loading the new document failed.
    ///
    /// The store has already advanced when this is set.
    pub fn host_error(&self) -> Option<&HostError> {
        self.host_error.as_ref()
    }

    pub fn host_synced(&self) -> bool {
        self.host_error.is_none()
    }
}

/// Holder of the current document.
///
/// The store starts from [`Document::placeholder`]. Mutation goes through
/// `&mut self`, so there is exactly one writer at a time.
pub struct DocumentStore<H, L = Vec<String>> {
    current: Document,
    host: H,
    history: L,
}

impl<H, L> DocumentStore<H, L>
where
    H: RenderHost,
    L: HistorySink,
{
    pub fn new(host: H, history: L) -> Self {
        Self {
            current: Document::placeholder(),
            host,
            history,
        }
    }

    pub fn current(&self) -> &Document {
        &self.current
    }

    pub fn current_xml(&self) -> String {
        self.current.to_xml()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn history(&self) -> &L {
        &self.history
    }

    /// Applies a fragment and hands the result to the host.
    ///
    /// Full-canvas fragments replace the content layer; other fragments are
    /// merged, with fragment cells winning id collisions. The previous
    /// document is recorded and the store advances before the host is
    /// called, so a host failure is reported in the outcome without rolling
    /// anything back.
    pub async fn apply(&mut self, fragment: &Document, origin: FragmentOrigin) -> ApplyOutcome {
        let (next, mode, cells_added, cells_replaced) = match origin {
            FragmentOrigin::FullCanvas => {
                let (next, added, replaced) = replace_content(&self.current, fragment);
                (next, ApplyMode::Replaced, added, replaced)
            }
            FragmentOrigin::Incremental => {
                let (next, added, replaced) = merge_content(&self.current, fragment);
                (next, ApplyMode::Merged, added, replaced)
            }
        };

        let previous = std::mem::replace(&mut self.current, next);
        self.history.record(previous.to_xml());
        info!(
            mode = mode.to_string(),
            cells_added,
            cells_replaced;
            "Applied fragment"
        );

        let xml = self.current.to_xml();
        let host_error = match self.host.load(&xml).await {
            Ok(()) => None,
            Err(err) => {
                warn!("Rendering host did not load the new document: {err}");
                Some(err)
            }
        };

        ApplyOutcome {
            mode,
            cells_added,
            cells_replaced,
            host_error,
        }
    }

    /// Parses and applies a fragment given as markup.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the markup is invalid; the store is left
    /// unchanged.
    pub async fn apply_xml(
        &mut self,
        xml: &str,
        origin: FragmentOrigin,
    ) -> Result<ApplyOutcome, ParseError> {
        let fragment = parse_document(xml)?;
        Ok(self.apply(&fragment, origin).await)
    }
}

/// Keeps the reserved cells of `current` and takes the content of `fragment`.
fn replace_content(current: &Document, fragment: &Document) -> (Document, usize, usize) {
    let model = if fragment.model_attrs().is_empty() {
        current.model_attrs().clone()
    } else {
        fragment.model_attrs().clone()
    };
    let reserved = current
        .cells()
        .filter(|cell| cell.id().is_some_and(is_reserved_id))
        .cloned();
    let content: Vec<_> = fragment.content_cells().cloned().collect();
    let added = content.len();
    let replaced = current.content_cells().count();

    let next = Document::from_parts(model, true, reserved.chain(content).collect());
    (next, added, replaced)
}

/// Unions the content of `fragment` into `current`.
fn merge_content(current: &Document, fragment: &Document) -> (Document, usize, usize) {
    let mut next = current.clone();
    let mut added = 0;
    let mut replaced = 0;

    for cell in fragment.content_cells() {
        match cell.id().and_then(|id| next.handle(id)) {
            Some(handle) => {
                debug!(id = cell.id().unwrap_or_default(); "Fragment cell overrides existing cell");
                next.replace(handle, cell.clone());
                replaced += 1;
            }
            None => {
                next.push(cell.clone());
                added += 1;
            }
        }
    }

    (next, added, replaced)
}

#[cfg(test)]
mod tests {
    use futures::{
        executor::block_on,
        future::{self, FutureExt},
    };

    use super::*;
    use mxmend_core::{cell::Cell, geometry::Geometry};

    #[derive(Default)]
    struct RecordingHost {
        loads: Vec<String>,
        fail: bool,
    }

    impl RenderHost for RecordingHost {
        fn load<'a>(&'a mut self, xml: &'a str) -> BoxFuture<'a, Result<(), HostError>> {
            self.loads.push(xml.to_string());
            let result = if self.fail {
                Err(HostError::new("editor frame detached"))
            } else {
                Ok(())
            };
            future::ready(result).boxed()
        }
    }

    fn fragment(ids: &[(&str, f64)]) -> Document {
        let mut document = Document::placeholder();
        for (id, x) in ids {
            document.push(Cell::vertex(
                id,
                "1",
                Geometry::absolute(*x, 0.0, 10.0, 10.0),
            ));
        }
        document
    }

    fn content_ids(document: &Document) -> Vec<&str> {
        document
            .content_cells()
            .filter_map(|cell| cell.id())
            .collect()
    }

    fn store() -> DocumentStore<RecordingHost> {
        DocumentStore::new(RecordingHost::default(), Vec::new())
    }

    #[test]
    fn test_store_starts_from_placeholder() {
        let store = store();

        assert_eq!(store.current(), &Document::placeholder());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_full_canvas_replaces_content() {
        let mut store = store();
        block_on(store.apply(&fragment(&[("a", 0.0), ("b", 0.0)]), FragmentOrigin::FullCanvas));
        let outcome = block_on(store.apply(&fragment(&[("c", 0.0)]), FragmentOrigin::FullCanvas));

        assert_eq!(outcome.mode(), ApplyMode::Replaced);
        assert_eq!(outcome.cells_added(), 1);
        assert_eq!(outcome.cells_replaced(), 2);
        assert_eq!(content_ids(store.current()), vec!["c"]);
        assert!(store.current().get("0").is_some());
        assert!(store.current().get("1").is_some());
    }

    #[test]
    fn test_incremental_merges_with_fragment_precedence() {
        let mut store = store();
        block_on(store.apply(&fragment(&[("a", 0.0), ("b", 0.0)]), FragmentOrigin::FullCanvas));
        let outcome = block_on(store.apply(
            &fragment(&[("b", 50.0), ("c", 0.0)]),
            FragmentOrigin::Incremental,
        ));

        assert_eq!(outcome.mode(), ApplyMode::Merged);
        assert_eq!(outcome.cells_added(), 1);
        assert_eq!(outcome.cells_replaced(), 1);
        assert_eq!(content_ids(store.current()), vec!["a", "b", "c"]);
        let b = store.current().get("b").unwrap().geometry().unwrap();
        assert_eq!(b.x(), Some(50.0));
    }

    #[test]
    fn test_history_records_previous_and_host_gets_new() {
        let mut store = store();
        let initial = store.current_xml();
        block_on(store.apply(&fragment(&[("a", 0.0)]), FragmentOrigin::FullCanvas));

        assert_eq!(store.history(), &vec![initial]);
        assert_eq!(store.host().loads, vec![store.current_xml()]);
    }

    #[test]
    fn test_host_failure_does_not_roll_back() {
        let mut store = DocumentStore::new(
            RecordingHost {
                fail: true,
                ..RecordingHost::default()
            },
            Vec::new(),
        );
        let outcome = block_on(store.apply(&fragment(&[("a", 0.0)]), FragmentOrigin::FullCanvas));

        assert!(!outcome.host_synced());
        assert_eq!(outcome.host_error().unwrap().message(), "editor frame detached");
        assert!(store.current().get("a").is_some());
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_apply_xml_rejects_invalid_markup() {
        let mut store = store();
        let result = block_on(store.apply_xml(
            r#"<mxGraphModel><root><mxCell id="a"/><mxCell id="a"/></root></mxGraphModel>"#,
            FragmentOrigin::Incremental,
        ));

        assert!(result.is_err());
        assert_eq!(store.current(), &Document::placeholder());
        assert!(store.host().loads.is_empty());
    }

    #[test]
    fn test_replace_adopts_fragment_model_attributes() {
        let mut store = store();
        block_on(store.apply_xml(
            r#"<mxGraphModel grid="1"><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel>"#,
            FragmentOrigin::FullCanvas,
        ))
        .unwrap();

        assert_eq!(store.current().model_attrs().get("grid"), Some("1"));
    }
}
