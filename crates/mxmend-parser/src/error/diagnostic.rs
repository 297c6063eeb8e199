//! The core diagnostic type for the mxmend error system.
//!
//! A [`Diagnostic`] represents a single validation error or warning with an
//! error code, labeled source spans, the 1-based location of the offending
//! element, a snippet of its markup and help text.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::{Location, Span},
};

/// Longest snippet kept on a diagnostic, in characters.
const SNIPPET_LIMIT: usize = 120;

/// A rich diagnostic message with source location information.
///
/// Diagnostics carry:
/// - A severity level
/// - An optional error code, rendered as the host's kebab-case identifier
/// - A primary message describing the issue
/// - One or more labeled source spans
/// - An optional line/column and snippet of the offending element
/// - Optional help text with suggestions
///
/// # Example
///
/// ```text
/// error[duplicate-id]: cell id `a` is used more than once
///   --> input.drawio:9:5
///    |
///  9 |     <mxCell id="a" vertex="1" parent="1">
///    |     ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ duplicate id
///    |
///   --> input.drawio:5:5
///    |
///  5 |     <mxCell id="a" value="Start" vertex="1" parent="1">
///    |     --------------------------------------------------- first used here
///    |
///    = help: give every cell a unique id
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    location: Option<Location>,
    snippet: Option<String>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use mxmend_parser::error::{Diagnostic, ErrorCode};
    /// # use mxmend_parser::Span;
    ///
    /// let span = Span::new(0..10);
    /// let diag = Diagnostic::error("point is missing `y`")
    ///     .with_code(ErrorCode::MissingMxPointAttribute)
    ///     .with_label(span, "missing coordinate")
    ///     .with_help("add a numeric `y` attribute");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use mxmend_parser::error::{Diagnostic, ErrorCode};
    /// # use mxmend_parser::Span;
    ///
    /// let span = Span::new(0..10);
    /// let diag = Diagnostic::warning("edge `e1` targets unknown cell `b`")
    ///     .with_code(ErrorCode::DanglingEdgeReference)
    ///     .with_label(span, "unknown target");
    /// ```
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the 1-based line and column, if known.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Get the markup snippet, if any.
    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::offending(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::related(span, message));
        self
    }

    /// Set the line and column.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the snippet, truncating long markup.
    pub fn with_snippet(mut self, snippet: &str) -> Self {
        let snippet = snippet.trim();
        self.snippet = Some(if snippet.chars().count() > SNIPPET_LIMIT {
            let mut truncated: String = snippet.chars().take(SNIPPET_LIMIT).collect();
            truncated.push_str("...");
            truncated
        } else {
            snippet.to_string()
        });
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            location: None,
            snippet: None,
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[missing-id]: message (at 3:5)" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(location) = self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
