//! Model-assisted repair of diagram markup.
//!
//! mxmend never talks to a model directly. Callers supply a [`RepairModel`]
//! that turns a [`RepairPrompt`] into raw response text; everything around
//! that round-trip (prompt construction, response parsing, edit
//! application, cancellation) lives here.

use std::future::Future;

use futures::future::{AbortRegistration, Abortable, Aborted, BoxFuture};
use log::{debug, info};
use thiserror::Error;

use super::{
    RepairError, RepairRequest, RepairResponse, RepairStrategy, ResponseStage, apply_edits,
    parse_repair_response,
};
use crate::config::ModelRuntime;

const SYSTEM_PROMPT: &str = "\
You repair draw.io (mxGraph) diagram XML that failed validation.
Respond with exactly one JSON object and nothing else. Do not wrap it in code fences.
The object has a `strategy` field that is either \"display\" or \"edit\":
- \"display\": include an `xml` string field holding the complete corrected <mxGraphModel> document.
- \"edit\": include an `edits` array of {\"search\": string, \"replace\": string} pairs. Each search \
string is replaced literally, once, in the current XML. Only use \"edit\" when current XML is provided.
You may add a short `notes` string describing the fix.
The corrected XML must keep cells <mxCell id=\"0\"/> and <mxCell id=\"1\" parent=\"0\"/>, \
give every cell a unique id, give every vertex an <mxGeometry> with numeric x, y, width and height, \
and only place <mxPoint> elements inside <mxGeometry> or <Array as=\"points\"> with numeric x and y.";

/// Error reported by a [`RepairModel`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model invocation failed: {message}")]
pub struct ModelError {
    message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The prompt pair and runtime descriptor handed to a [`RepairModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct RepairPrompt {
    system: String,
    user: String,
    runtime: ModelRuntime,
}

impl RepairPrompt {
    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn runtime(&self) -> &ModelRuntime {
        &self.runtime
    }
}

/// The model-invocation collaborator.
///
/// One call is one network round-trip. Implementations return the raw
/// response text; parsing is done by the caller.
pub trait RepairModel {
    fn complete<'a>(&'a self, prompt: &'a RepairPrompt) -> BoxFuture<'a, Result<String, ModelError>>;
}

/// Builds the prompt for a repair request.
pub fn build_repair_prompt(request: &RepairRequest) -> RepairPrompt {
    let mut user = String::new();
    if let Some(errors) = request.error_context() {
        user.push_str("Validation errors:\n");
        user.push_str(errors);
        user.push_str("\n\n");
    }
    user.push_str("Invalid XML:\n");
    user.push_str(request.invalid_xml());
    if let Some(current) = request.current_xml() {
        user.push_str("\n\nCurrent XML (last valid version, target of any edits):\n");
        user.push_str(current);
    }

    RepairPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        runtime: request.runtime().clone(),
    }
}

/// Sends one repair request and parses the response.
///
/// # Errors
///
/// Returns [`RepairError::Model`] when the collaborator fails, and the
/// parsing errors of [`parse_repair_response`] otherwise.
pub async fn request_repair<M>(
    model: &M,
    request: &RepairRequest,
) -> Result<RepairResponse, RepairError>
where
    M: RepairModel + ?Sized,
{
    let prompt = build_repair_prompt(request);
    debug!(
        provider = prompt.runtime().provider(),
        model = prompt.runtime().model(),
        prompt_len = prompt.user().len();
        "Requesting repair"
    );
    let raw = model.complete(&prompt).await?;

    match parse_repair_response(&raw) {
        ResponseStage::Parsed(response) => Ok(response),
        ResponseStage::Extracted(response) => {
            info!("Repair response ignored the JSON contract, using embedded markup");
            Ok(response)
        }
        ResponseStage::Failed(err) => Err(err),
    }
}

/// Turns a response into markup.
///
/// `display` responses carry their markup; `edit` responses are applied to
/// `base`, the last-known-good markup.
///
/// # Errors
///
/// Returns [`RepairError::MissingBase`] for an `edit` response without a
/// base.
pub fn resolve_repair(response: &RepairResponse, base: Option<&str>) -> Result<String, RepairError> {
    match response.strategy() {
        RepairStrategy::Display { xml } => Ok(xml.clone()),
        RepairStrategy::Edit { edits } => {
            let base = base.ok_or(RepairError::MissingBase)?;
            Ok(apply_edits(base, edits).into_text())
        }
    }
}

/// Runs a repair future, stopping early when its abort handle fires.
///
/// # Errors
///
/// Returns [`RepairError::Cancelled`] when aborted, and the future's own
/// error otherwise.
pub async fn cancellable<F, T>(
    future: F,
    registration: Option<AbortRegistration>,
) -> Result<T, RepairError>
where
    F: Future<Output = Result<T, RepairError>>,
{
    let Some(registration) = registration else {
        return future.await;
    };
    match Abortable::new(future, registration).await {
        Ok(result) => result,
        Err(Aborted) => {
            info!("Repair cancelled");
            Err(RepairError::Cancelled)
        }
    }
}
