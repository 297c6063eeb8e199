//! Labeled spans into the normalized markup.

use crate::span::Span;

/// What a labeled span points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// The element the diagnostic is about.
    Offending,
    /// Related markup, such as the first cell that used a duplicated id.
    Related,
}

/// A message attached to a span of the normalized markup.
///
/// Spans are byte offsets into the string a [`ValidationReport`] carries as
/// its normalized markup, not into the raw input.
///
/// [`ValidationReport`]: crate::ValidationReport
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    role: LabelRole,
}

impl Label {
    /// Labels the offending element.
    pub fn offending(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, LabelRole::Offending)
    }

    /// Labels markup related to the offending element.
    pub fn related(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, LabelRole::Related)
    }

    fn new(span: Span, message: impl Into<String>, role: LabelRole) -> Self {
        Self {
            span,
            message: message.into(),
            role,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> LabelRole {
        self.role
    }

    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Offending
    }

    /// Returns the labeled markup, or `None` when the span does not fall on
    /// character boundaries inside `markup`.
    pub fn slice<'a>(&self, markup: &'a str) -> Option<&'a str> {
        markup.get(self.span.start()..self.span.end())
    }
}
