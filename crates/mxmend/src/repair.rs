//! Recovery of usable payloads from malformed generated output.
//!
//! Two independent tracks live here:
//!
//! - [`json`] repairs the syntax of tool-call style JSON payloads locally.
//! - [`model`] asks a [`RepairModel`] collaborator to fix diagram markup that
//!   failed validation, using the request/response contract in [`protocol`]
//!   and applying `edit` responses with [`apply_edits`].

mod edits;
mod json;
mod model;
mod protocol;

pub use edits::{EditReport, apply_edits};
pub use json::{JsonOutcome, JsonRepairError, parse_json, repair_json};
pub use model::{
    ModelError, RepairModel, RepairPrompt, build_repair_prompt, cancellable, request_repair,
    resolve_repair,
};
pub use protocol::{
    Edit, RepairRequest, RepairResponse, RepairStrategy, ResponseStage, parse_repair_response,
};

use thiserror::Error;

/// Errors raised by model-assisted diagram repair.
#[derive(Debug, Error)]
pub enum RepairError {
    /// The request carried no markup to repair.
    #[error("repair request has an empty `invalidXml` payload")]
    EmptyPayload,

    /// The caller abandoned the repair through its abort handle.
    #[error("repair was cancelled")]
    Cancelled,

    #[error(transparent)]
    Model(#[from] ModelError),

    /// The response named a strategy other than `display` or `edit`.
    #[error("unknown repair strategy `{0}`")]
    UnknownStrategy(String),

    /// Neither the JSON contract nor markup extraction produced a response.
    #[error("repair response is unusable: {reason}")]
    Unusable { reason: String },

    /// An `edit` response arrived without a last-known-good payload.
    #[error("edit response requires a base payload, but none was provided")]
    MissingBase,

    /// Every attempt produced markup that still failed validation.
    #[error("repair exhausted after {attempts} attempt(s): {last_errors}")]
    Exhausted { attempts: usize, last_errors: String },
}

impl RepairError {
    pub(crate) fn unusable(reason: impl Into<String>) -> Self {
        Self::Unusable {
            reason: reason.into(),
        }
    }
}
