//! mxmend - Validation, layout calibration and repair for generated mxGraph diagrams.
//!
//! Diagram markup produced by a language model is checked against the
//! invariants the rendering host relies on, repaired when it fails, laid out
//! on a grid and handed to a [`DocumentStore`](orchestrator::DocumentStore).

pub mod calibrate;
pub mod config;
pub mod orchestrator;
pub mod repair;

mod error;

pub use mxmend_core::{attributes, cell, document, element, geometry, style};
pub use mxmend_parser::{
    Location, Span, ValidationReport,
    error::{Diagnostic, ErrorCode, ParseError, Severity},
};

pub use error::MendError;

use futures::future::AbortRegistration;
use log::{debug, info, warn};

use calibrate::{CalibrationOutput, CalibrationReport};
use config::AppConfig;
use orchestrator::{ApplyOutcome, DocumentStore, FragmentOrigin, HistorySink, RenderHost};
use repair::{JsonOutcome, RepairError, RepairModel, RepairRequest};

/// Markup produced by a successful model-assisted repair.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedMarkup {
    xml: String,
    attempts: usize,
    notes: Option<String>,
}

impl RepairedMarkup {
    /// The repaired markup, normalized and valid.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Model round-trips the repair took.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Notes attached to the successful response.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn into_xml(self) -> String {
        self.xml
    }
}

/// What [`Pipeline::ingest`] did with one generated payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    repair_attempts: usize,
    calibration: CalibrationReport,
    apply: ApplyOutcome,
}

impl IngestOutcome {
    /// Model round-trips spent on repair; zero when the payload was valid.
    pub fn repair_attempts(&self) -> usize {
        self.repair_attempts
    }

    pub fn calibration(&self) -> &CalibrationReport {
        &self.calibration
    }

    pub fn apply(&self) -> &ApplyOutcome {
        &self.apply
    }
}

/// Entry point for processing generated diagram markup.
///
/// Validation, calibration and JSON repair are synchronous. Model-assisted
/// repair and ingestion are `async` and runtime agnostic.
///
/// # Examples
///
/// ```
/// use mxmend::{Pipeline, config::AppConfig};
///
/// let markup = r#"<mxGraphModel><root>
///     <mxCell id="0"/><mxCell id="1" parent="0"/>
///     <mxCell id="a" vertex="1" parent="1">
///         <mxGeometry x="100" y="100" width="120" height="60" as="geometry"/>
///     </mxCell>
/// </root></mxGraphModel>"#;
///
/// let pipeline = Pipeline::new(AppConfig::default());
/// assert!(pipeline.validate(markup).is_valid());
///
/// let output = pipeline.process(markup).expect("valid markup");
/// assert_eq!(output.report().nodes_adjusted(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Calibration and repair settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Normalizes and validates markup.
    pub fn validate(&self, input: &str) -> ValidationReport {
        mxmend_parser::validate(input)
    }

    /// Calibrates markup that is already valid.
    pub fn calibrate(&self, xml: &str) -> CalibrationOutput {
        calibrate::calibrate(xml, self.config.calibration())
    }

    /// Validates markup and calibrates it when valid.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Parse`] carrying every validation error, with the
    /// normalized markup the diagnostics point into.
    pub fn process(&self, input: &str) -> Result<CalibrationOutput, MendError> {
        info!("Processing markup");
        let (normalized, errors, _) = self.validate(input).into_parts();
        if !errors.is_empty() {
            return Err(MendError::new_parse_error(ParseError::new(errors), normalized));
        }
        Ok(self.calibrate(&normalized))
    }

    /// Parses a JSON payload, repairing its syntax when needed.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::JsonRepair`] when the repaired text does not
    /// parse either.
    pub fn repair_json(&self, text: &str) -> Result<JsonOutcome, MendError> {
        Ok(repair::parse_json(text)?)
    }

    /// Turns a saved model response into markup.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Repair`] when the response is unusable, or when
    /// it is an `edit` response and `base` is `None`.
    pub fn apply_repair_response(&self, raw: &str, base: Option<&str>) -> Result<String, MendError> {
        let response = repair::parse_repair_response(raw).into_result()?;
        if let Some(notes) = response.notes() {
            debug!(notes; "Repair response notes");
        }
        Ok(repair::resolve_repair(&response, base)?)
    }

    /// Repairs invalid markup with a model.
    ///
    /// Each attempt sends the latest payload, in its normalized form, with
    /// the validation errors it produced, resolves the response against `current` (the last-known-good
    /// markup) and re-validates the result. At most
    /// [`max_attempts`](config::RepairConfig::max_attempts) round-trips are
    /// made.
    ///
    /// # Errors
    ///
    /// Returns [`RepairError::Cancelled`] when `abort` fires,
    /// [`RepairError::Exhausted`] when no attempt produced valid markup, and
    /// any error of a single attempt.
    pub async fn repair<M>(
        &self,
        model: &M,
        invalid: &str,
        current: Option<&str>,
        abort: Option<AbortRegistration>,
    ) -> Result<RepairedMarkup, RepairError>
    where
        M: RepairModel + ?Sized,
    {
        let max_attempts = self.config.repair().max_attempts();
        let runtime = self.config.repair().runtime();

        let attempts = async {
            let report = self.validate(invalid);
            let mut errors = report.error_summary();
            let (mut payload, _, _) = report.into_parts();

            for attempt in 1..=max_attempts {
                info!(attempt, max_attempts; "Requesting model repair");
                let mut request = RepairRequest::new(payload.as_str(), runtime.clone())?
                    .with_error_context(errors.as_str());
                if let Some(current) = current {
                    request = request.with_current_xml(current);
                }

                let response = repair::request_repair(model, &request).await?;
                let candidate = repair::resolve_repair(&response, current)?;
                let report = self.validate(&candidate);
                if report.is_valid() {
                    info!(attempt; "Model repair produced valid markup");
                    let notes = response.notes().map(str::to_string);
                    let (xml, _, _) = report.into_parts();
                    return Ok(RepairedMarkup {
                        xml,
                        attempts: attempt,
                        notes,
                    });
                }

                warn!(attempt, errors = report.errors().len(); "Repaired markup is still invalid");
                errors = report.error_summary();
                (payload, _, _) = report.into_parts();
            }

            Err(RepairError::Exhausted {
                attempts: max_attempts,
                last_errors: errors,
            })
        };

        repair::cancellable(attempts, abort).await
    }

    /// Validates, repairs if needed, calibrates and applies generated markup.
    ///
    /// Repair uses the store's current document as the last-known-good
    /// markup.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Repair`] when the payload is invalid and repair
    /// fails. A rendering host failure is not an error; it is reported in
    /// the [`ApplyOutcome`].
    pub async fn ingest<H, L, M>(
        &self,
        store: &mut DocumentStore<H, L>,
        model: &M,
        generated: &str,
        origin: FragmentOrigin,
        abort: Option<AbortRegistration>,
    ) -> Result<IngestOutcome, MendError>
    where
        H: RenderHost,
        L: HistorySink,
        M: RepairModel + ?Sized,
    {
        let report = self.validate(generated);
        let (valid_xml, repair_attempts) = if report.is_valid() {
            let (xml, _, _) = report.into_parts();
            (xml, 0)
        } else {
            info!(errors = report.errors().len(); "Generated markup is invalid, repairing");
            let current = store.current_xml();
            let repaired = self.repair(model, generated, Some(&current), abort).await?;
            let attempts = repaired.attempts();
            (repaired.into_xml(), attempts)
        };

        let fragment = mxmend_parser::parse_document(&valid_xml)
            .map_err(|err| MendError::new_parse_error(err, valid_xml.as_str()))?;
        let (calibrated, calibration) =
            calibrate::calibrate_document(&fragment, self.config.calibration());
        let apply = store.apply(&calibrated, origin).await;

        Ok(IngestOutcome {
            repair_attempts,
            calibration,
            apply,
        })
    }
}
