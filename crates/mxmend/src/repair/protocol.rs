//! The repair request/response contract.
//!
//! Field names and strategy literals are fixed by the invocation layer:
//! requests carry `invalidXml`, `currentXml` and `errorContext`; responses
//! are a single JSON object whose `strategy` is `"display"` (with `xml`) or
//! `"edit"` (with `edits`), plus optional `notes`.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RepairError;
use crate::config::ModelRuntime;

/// A request for model-assisted repair of invalid markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    invalid_xml: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_xml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_context: Option<String>,
    runtime: ModelRuntime,
}

impl RepairRequest {
    /// Creates a request for `invalid_xml`.
    ///
    /// # Errors
    ///
    /// Returns [`RepairError::EmptyPayload`] when the payload is blank.
    pub fn new(invalid_xml: impl Into<String>, runtime: ModelRuntime) -> Result<Self, RepairError> {
        let invalid_xml = invalid_xml.into();
        if invalid_xml.trim().is_empty() {
            return Err(RepairError::EmptyPayload);
        }
        Ok(Self {
            invalid_xml,
            current_xml: None,
            error_context: None,
            runtime,
        })
    }

    /// Sets the last-known-good markup that `edit` responses apply to.
    pub fn with_current_xml(mut self, current_xml: impl Into<String>) -> Self {
        self.current_xml = Some(current_xml.into()).filter(|xml| !xml.trim().is_empty());
        self
    }

    pub fn with_error_context(mut self, error_context: impl Into<String>) -> Self {
        self.error_context = Some(error_context.into()).filter(|text| !text.trim().is_empty());
        self
    }

    pub fn invalid_xml(&self) -> &str {
        &self.invalid_xml
    }

    pub fn current_xml(&self) -> Option<&str> {
        self.current_xml.as_deref()
    }

    pub fn error_context(&self) -> Option<&str> {
        self.error_context.as_deref()
    }

    pub fn runtime(&self) -> &ModelRuntime {
        &self.runtime
    }
}

/// One literal substring replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    #[serde(default)]
    search: String,
    #[serde(default)]
    replace: String,
}

impl Edit {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn replace(&self) -> &str {
        &self.replace
    }
}

/// How a response repairs the markup.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairStrategy {
    /// Replace the payload with the given markup.
    Display { xml: String },
    /// Apply the edits to the last-known-good markup.
    Edit { edits: Vec<Edit> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairResponse {
    strategy: RepairStrategy,
    notes: Option<String>,
}

impl RepairResponse {
    pub fn new(strategy: RepairStrategy, notes: Option<String>) -> Self {
        Self { strategy, notes }
    }

    pub fn strategy(&self) -> &RepairStrategy {
        &self.strategy
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Which stage of response parsing produced a result.
#[derive(Debug)]
pub enum ResponseStage {
    /// The response honoured the JSON contract.
    Parsed(RepairResponse),
    /// The JSON contract failed, but markup was found in the raw text and
    /// turned into a `display` response.
    Extracted(RepairResponse),
    Failed(RepairError),
}

impl ResponseStage {
    pub fn into_result(self) -> Result<RepairResponse, RepairError> {
        match self {
            Self::Parsed(response) | Self::Extracted(response) => Ok(response),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Parses a raw model response.
///
/// The first fenced block is used when present, otherwise the whole trimmed
/// response. An unknown `strategy` fails immediately; any other departure
/// from the contract falls back to extracting an embedded markup block.
pub fn parse_repair_response(raw: &str) -> ResponseStage {
    let candidate = fenced_block(raw).unwrap_or_else(|| raw.trim());

    let parsed = serde_json::from_str::<Value>(candidate);
    let contract_error = match &parsed {
        Ok(value) => match response_from_value(value) {
            Ok(response) => return ResponseStage::Parsed(response),
            Err(err @ RepairError::UnknownStrategy(_)) => return ResponseStage::Failed(err),
            Err(err) => err.to_string(),
        },
        Err(err) => format!("response is not JSON: {err}"),
    };
    debug!(reason = contract_error.as_str(); "Repair response broke the contract, scanning for markup");

    // String values are already unescaped; the raw text is not.
    let extracted = parsed
        .as_ref()
        .ok()
        .and_then(markup_in_strings)
        .or_else(|| embedded_markup(raw).map(str::to_string));

    match extracted {
        Some(xml) => ResponseStage::Extracted(RepairResponse::new(
            RepairStrategy::Display { xml },
            None,
        )),
        None => ResponseStage::Failed(RepairError::unusable(contract_error)),
    }
}

fn response_from_value(value: &Value) -> Result<RepairResponse, RepairError> {
    let object = value
        .as_object()
        .ok_or_else(|| RepairError::unusable("response is not a JSON object"))?;
    let strategy = object
        .get("strategy")
        .and_then(Value::as_str)
        .ok_or_else(|| RepairError::unusable("response has no string `strategy` field"))?;
    let notes = object
        .get("notes")
        .and_then(Value::as_str)
        .map(str::to_string);

    let strategy = match strategy {
        "display" => {
            let xml = object
                .get("xml")
                .and_then(Value::as_str)
                .filter(|xml| !xml.trim().is_empty())
                .ok_or_else(|| RepairError::unusable("`display` response has no `xml` string"))?;
            RepairStrategy::Display {
                xml: xml.to_string(),
            }
        }
        "edit" => {
            let edits = object
                .get("edits")
                .filter(|edits| edits.is_array())
                .ok_or_else(|| RepairError::unusable("`edit` response has no `edits` array"))?;
            let edits = Vec::<Edit>::deserialize(edits)
                .map_err(|err| RepairError::unusable(format!("malformed `edits`: {err}")))?;
            RepairStrategy::Edit { edits }
        }
        other => return Err(RepairError::UnknownStrategy(other.to_string())),
    };

    Ok(RepairResponse::new(strategy, notes))
}

fn fenced_block(raw: &str) -> Option<&str> {
    fenced_block_regex()
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
}

fn embedded_markup(raw: &str) -> Option<&str> {
    markup_block_regex().find(raw).map(|found| found.as_str())
}

/// Finds the first markup block inside any string of a JSON value.
fn markup_in_strings(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => embedded_markup(text).map(str::to_string),
        Value::Array(items) => items.iter().find_map(markup_in_strings),
        Value::Object(fields) => fields.values().find_map(markup_in_strings),
        _ => None,
    }
}

fn fenced_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```").expect("valid regex"))
}

fn markup_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)<mxfile\b.*?</mxfile>|<mxGraphModel\b.*?</mxGraphModel>|<root\b.*?</root>",
        )
        .expect("valid regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> RepairResponse {
        match parse_repair_response(raw) {
            ResponseStage::Parsed(response) => response,
            other => panic!("expected parsed response, got {other:?}"),
        }
    }

    #[test]
    fn test_request_rejects_blank_payload() {
        let err = RepairRequest::new("  \n", ModelRuntime::default()).unwrap_err();

        assert!(matches!(err, RepairError::EmptyPayload));
    }

    #[test]
    fn test_request_wire_names() {
        let request = RepairRequest::new("<bad/>", ModelRuntime::new("acme", "m1"))
            .unwrap()
            .with_current_xml("<good/>")
            .with_error_context("duplicate-id");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["invalidXml"], "<bad/>");
        assert_eq!(value["currentXml"], "<good/>");
        assert_eq!(value["errorContext"], "duplicate-id");
        assert_eq!(value["runtime"]["provider"], "acme");
    }

    #[test]
    fn test_request_omits_absent_fields() {
        let request = RepairRequest::new("<bad/>", ModelRuntime::default())
            .unwrap()
            .with_current_xml("");
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("currentXml").is_none());
        assert!(value.get("errorContext").is_none());
    }

    #[test]
    fn test_parse_display() {
        let response =
            parsed(r#"{"strategy":"display","xml":"<mxGraphModel/>","notes":"rebuilt ids"}"#);

        assert_eq!(
            response.strategy(),
            &RepairStrategy::Display {
                xml: "<mxGraphModel/>".to_string()
            }
        );
        assert_eq!(response.notes(), Some("rebuilt ids"));
    }

    #[test]
    fn test_parse_edit_in_fence() {
        let response = parsed(
            "Here you go:\n```json\n{\"strategy\":\"edit\",\"edits\":[{\"search\":\"A\",\"replace\":\"B\"}]}\n```\n",
        );

        assert_eq!(
            response.strategy(),
            &RepairStrategy::Edit {
                edits: vec![Edit::new("A", "B")]
            }
        );
    }

    #[test]
    fn test_unknown_strategy_fails_hard() {
        let stage =
            parse_repair_response(r#"{"strategy":"rewrite","xml":"<mxGraphModel></mxGraphModel>"}"#);

        assert!(matches!(
            stage,
            ResponseStage::Failed(RepairError::UnknownStrategy(name)) if name == "rewrite"
        ));
    }

    #[test]
    fn test_raw_markup_is_extracted() {
        let stage = parse_repair_response(
            "Sorry, here is the diagram:\n<mxGraphModel><root><mxCell id=\"0\"/></root></mxGraphModel>\nThanks",
        );

        let ResponseStage::Extracted(response) = stage else {
            panic!("expected extraction, got {stage:?}");
        };
        assert_eq!(
            response.strategy(),
            &RepairStrategy::Display {
                xml: r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#.to_string()
            }
        );
    }

    #[test]
    fn test_shape_error_falls_back_to_markup() {
        let stage = parse_repair_response(
            r#"{"strategy":"display","content":"<mxGraphModel><root><mxCell id=\"0\"/><mxCell id=\"1\" parent=\"0\"/></root></mxGraphModel>"}"#,
        );

        let ResponseStage::Extracted(response) = stage else {
            panic!("expected extracted markup");
        };
        let RepairStrategy::Display { xml } = response.strategy() else {
            panic!("expected a display strategy");
        };
        assert!(!xml.contains('\\'));
        assert!(mxmend_parser::validate(xml).is_valid());
    }

    #[test]
    fn test_markup_in_nested_json_strings() {
        let stage = parse_repair_response(
            r#"{"result":{"parts":["intro","<root><mxCell id=\"0\"/></root>"]}}"#,
        );

        let ResponseStage::Extracted(response) = stage else {
            panic!("expected extracted markup");
        };
        assert_eq!(
            response.strategy(),
            &RepairStrategy::Display {
                xml: r#"<root><mxCell id="0"/></root>"#.to_string()
            }
        );
    }

    #[test]
    fn test_nothing_usable_fails() {
        let err = parse_repair_response(r#"{"strategy":"edit","edits":"none"}"#)
            .into_result()
            .unwrap_err();

        assert!(matches!(err, RepairError::Unusable { .. }));
        assert!(err.to_string().contains("`edits` array"));
    }

    #[test]
    fn test_malformed_edit_entries_fail() {
        let err = parse_repair_response(r#"{"strategy":"edit","edits":[{"search":1}]}"#)
            .into_result()
            .unwrap_err();

        assert!(err.to_string().contains("malformed `edits`"));
    }
}
