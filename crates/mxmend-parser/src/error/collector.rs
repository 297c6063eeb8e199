//! Collector for accumulating diagnostics across validation passes.
//!
//! The [`DiagnosticCollector`] lets every pass report all of its findings
//! instead of stopping at the first error.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics during validation.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Splits the collected diagnostics into `(errors, warnings)`, each in
    /// emission order.
    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.diagnostics
            .into_iter()
            .partition(|diagnostic| diagnostic.severity().is_error())
    }

    /// Finish collection and return a result.
    ///
    /// - If there are errors, returns `Err(ParseError)` with all diagnostics.
    /// - Otherwise returns the warnings.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}
