//! Error types for mxmend operations.
//!
//! This module provides the main error type [`MendError`] which wraps the
//! error conditions that can occur while processing generated markup.

use std::io;

use thiserror::Error;

use mxmend_parser::error::ParseError;

use crate::repair::{JsonRepairError, RepairError};

/// The main error type for mxmend operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the validation diagnostics together with the
/// normalized markup they point into, so callers can render labeled spans.
#[derive(Debug, Error)]
pub enum MendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("JSON repair failed: {0}")]
    JsonRepair(#[from] JsonRepairError),

    #[error("Repair failed: {0}")]
    Repair(#[from] RepairError),
}

impl MendError {
    /// Create a new `Parse` error with the markup its spans refer to.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
