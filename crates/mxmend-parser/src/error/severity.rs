//! Severity levels for diagnostics.
//!
//! Only errors make a document invalid; warnings are advisory.

use std::fmt;

/// The severity level of a diagnostic.
///
/// - [`Severity::Error`] makes the document unusable by the rendering host
/// - [`Severity::Warning`] flags content the host tolerates but that is
///   probably wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A violation the rendering host cannot cope with.
    ///
    /// Errors route the document into the repair pipeline.
    Error,

    /// A non-fatal finding.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
