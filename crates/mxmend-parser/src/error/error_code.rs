//! Error codes for the mxmend diagnostic system.
//!
//! Codes are the literal identifiers the rendering host's tooling uses, so
//! they render in kebab-case rather than as numbers. They are grouped by the
//! validation pass that produces them:
//! - parse and structure checks
//! - the id pass
//! - the point pass
//! - supplemental geometry and reference checks

use std::fmt;

/// Error codes for categorizing validation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Parse and structure
    // =========================================================================
    /// The markup is not well-formed XML.
    ///
    /// No further checks run once this is reported.
    ParserError,

    /// No `mxGraphModel` element was found.
    MissingMxGraphModel,

    /// The `mxGraphModel` element has no `root` child.
    MissingRoot,

    // =========================================================================
    // Ids
    // =========================================================================
    /// A cell has no id, or an id made only of whitespace.
    MissingId,

    /// A non-reserved id is used by more than one cell.
    DuplicateId,

    // =========================================================================
    // Points
    // =========================================================================
    /// A point is not nested inside a geometry or its waypoint list.
    InvalidMxPointLocation,

    /// A point other than an offset lacks `x`, `y` or both.
    MissingMxPointAttribute,

    /// A point coordinate is not a plain numeric literal.
    InvalidMxPointValue,

    // =========================================================================
    // Supplemental
    // =========================================================================
    /// A vertex geometry carries a non-numeric bound or a negative size.
    InvalidGeometryValue,

    /// An edge names a source or target id that no cell uses.
    ///
    /// Reported as a warning.
    DanglingEdgeReference,

    /// A vertex has no geometry child.
    ///
    /// Reported as a warning.
    MissingGeometry,
}

impl ErrorCode {
    /// Returns the code as rendered in reports (e.g., "duplicate-id").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ParserError => "parser-error",
            ErrorCode::MissingMxGraphModel => "missing-mxgraphmodel",
            ErrorCode::MissingRoot => "missing-root",
            ErrorCode::MissingId => "missing-id",
            ErrorCode::DuplicateId => "duplicate-id",
            ErrorCode::InvalidMxPointLocation => "invalid-mxpoint-location",
            ErrorCode::MissingMxPointAttribute => "missing-mxpoint-attribute",
            ErrorCode::InvalidMxPointValue => "invalid-mxpoint-value",
            ErrorCode::InvalidGeometryValue => "invalid-geometry-value",
            ErrorCode::DanglingEdgeReference => "dangling-edge-reference",
            ErrorCode::MissingGeometry => "missing-geometry",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParserError => "markup is not well-formed",
            ErrorCode::MissingMxGraphModel => "missing mxGraphModel element",
            ErrorCode::MissingRoot => "missing root element",
            ErrorCode::MissingId => "cell without id",
            ErrorCode::DuplicateId => "duplicate cell id",
            ErrorCode::InvalidMxPointLocation => "point outside a geometry",
            ErrorCode::MissingMxPointAttribute => "point without coordinates",
            ErrorCode::InvalidMxPointValue => "non-numeric point coordinate",
            ErrorCode::InvalidGeometryValue => "invalid geometry bounds",
            ErrorCode::DanglingEdgeReference => "edge references unknown cell",
            ErrorCode::MissingGeometry => "vertex without geometry",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::ParserError.to_string(), "parser-error");
        assert_eq!(ErrorCode::MissingMxGraphModel.to_string(), "missing-mxgraphmodel");
        assert_eq!(ErrorCode::DuplicateId.to_string(), "duplicate-id");
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(
            ErrorCode::MissingMxPointAttribute.as_str(),
            "missing-mxpoint-attribute"
        );
        assert_eq!(
            ErrorCode::InvalidMxPointLocation.as_str(),
            "invalid-mxpoint-location"
        );
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::MissingId.description(), "cell without id");
        assert_eq!(
            ErrorCode::DanglingEdgeReference.description(),
            "edge references unknown cell"
        );
    }
}
