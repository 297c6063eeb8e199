//! # mxmend Parser
//!
//! Normalization, validation and construction for mxGraph diagram markup.
//! Generated markup goes through three steps:
//!
//! 1. **Normalize** - Extract or salvage an `mxGraphModel` tree ([`normalize`])
//! 2. **Validate** - Check the invariants the rendering host relies on
//!    ([`validate`])
//! 3. **Build** - Turn valid markup into an owned
//!    [`Document`](mxmend_core::document::Document) ([`parse_document`])
//!
//! ## Usage
//!
//! ```
//! # use mxmend_parser::{parse_document, validate, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let markup = r#"<mxGraphModel><root>
//!         <mxCell id="0"/><mxCell id="1" parent="0"/>
//!         <mxCell id="a" vertex="1" parent="1">
//!             <mxGeometry x="40" y="40" width="120" height="60" as="geometry"/>
//!         </mxCell>
//!     </root></mxGraphModel>"#;
//!
//!     assert!(validate(markup).is_valid());
//!     let document = parse_document(markup)?;
//!     assert!(document.get("a").is_some());
//!     Ok(())
//! }
//! ```

mod build;
pub mod error;
mod normalize;
mod span;
mod validate;

pub use build::build_document;
pub use normalize::normalize;
pub use span::{Location, Span};
pub use validate::{ValidationReport, validate};

use log::debug;

use mxmend_core::document::Document;

use error::ParseError;

/// Normalizes, validates and builds a document.
///
/// Validation warnings are logged and otherwise ignored.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every validation error when the markup
/// is not usable by the rendering host.
pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    let (normalized, errors, warnings) = validate(input).into_parts();
    if !errors.is_empty() {
        return Err(ParseError::new(errors));
    }
    for warning in &warnings {
        debug!("Validation warning: {warning}");
    }
    build_document(&normalized)
}
