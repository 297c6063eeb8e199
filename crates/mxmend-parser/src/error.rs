//! Error and diagnostic system for the mxmend parser.
//!
//! This module provides an error handling system with:
//! - Error codes matching the host's validation vocabulary
//! - Labeled spans and 1-based locations for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating findings across passes
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with an error code, optional source
//! locations, a snippet of the offending markup and help text. Validation
//! returns its diagnostics inside a report; building a
//! [`Document`](mxmend_core::document::Document) from markup that does not
//! parse wraps them in [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use mxmend_parser::error::{Diagnostic, ErrorCode};
//! # use mxmend_parser::Span;
//!
//! let span = Span::new(100..120);
//! let original_span = Span::new(50..70);
//!
//! let diag = Diagnostic::error("cell id `a` is used more than once")
//!     .with_code(ErrorCode::DuplicateId)
//!     .with_label(span, "duplicate id")
//!     .with_secondary_label(original_span, "first used here")
//!     .with_help("give every cell a unique id");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::{Label, LabelRole};
pub use parse_error::ParseError;
pub use severity::Severity;
