//! CLI logic for the mxmend diagram tool.
//!
//! This module dispatches the parsed [`Args`] to the [`Pipeline`] stages and
//! handles file input and output.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{fs, io};

use log::{info, warn};
use serde::Serialize;

use mxmend::{Diagnostic, MendError, ParseError, Pipeline};

/// A diagnostic as printed by `validate --json`.
#[derive(Debug, Serialize)]
struct DiagnosticSummary<'a> {
    severity: String,
    code: Option<&'static str>,
    message: &'a str,
    line: Option<usize>,
    column: Option<usize>,
}

impl<'a> From<&'a Diagnostic> for DiagnosticSummary<'a> {
    fn from(diag: &'a Diagnostic) -> Self {
        Self {
            severity: diag.severity().to_string(),
            code: diag.code().map(|code| code.as_str()),
            message: diag.message(),
            line: diag.location().map(|location| location.line()),
            column: diag.location().map(|location| location.column()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationSummary<'a> {
    valid: bool,
    errors: Vec<DiagnosticSummary<'a>>,
    warnings: Vec<DiagnosticSummary<'a>>,
}

/// Run the mxmend CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `MendError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid markup
/// - Unrepairable JSON payloads and unusable repair responses
pub fn run(args: &Args) -> Result<(), MendError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let pipeline = Pipeline::new(app_config);

    match &args.command {
        Command::Validate { input, json } => validate(&pipeline, input, *json),
        Command::Calibrate { input, output } => calibrate(&pipeline, input, output),
        Command::RepairJson { input } => repair_json(&pipeline, input),
        Command::ApplyRepair {
            response,
            base,
            output,
        } => apply_repair(&pipeline, response, base.as_deref(), output),
    }
}

fn validate(pipeline: &Pipeline, input: &str, json: bool) -> Result<(), MendError> {
    info!(input_path = input; "Validating markup");
    let source = fs::read_to_string(input)?;
    let report = pipeline.validate(&source);

    if json {
        let summary = ValidationSummary {
            valid: report.is_valid(),
            errors: report.errors().iter().map(DiagnosticSummary::from).collect(),
            warnings: report.warnings().iter().map(DiagnosticSummary::from).collect(),
        };
        println!("{}", to_json(&summary)?);
    }

    for warning in report.warnings() {
        warn!("{warning}");
    }

    let (normalized, errors, warnings) = report.into_parts();
    if !errors.is_empty() {
        return Err(MendError::new_parse_error(ParseError::new(errors), normalized));
    }

    info!(warnings = warnings.len(); "Markup is valid");
    Ok(())
}

fn calibrate(pipeline: &Pipeline, input: &str, output: &str) -> Result<(), MendError> {
    info!(input_path = input, output_path = output; "Calibrating markup");
    let source = fs::read_to_string(input)?;
    let (xml, report) = pipeline.process(&source)?.into_parts();

    if let Some(warning) = report.warning() {
        warn!("{warning}");
    }
    fs::write(output, xml)?;
    println!("{}", to_json(&report)?);

    info!(output_file = output; "Calibrated markup written");
    Ok(())
}

fn repair_json(pipeline: &Pipeline, input: &str) -> Result<(), MendError> {
    info!(input_path = input; "Parsing JSON payload");
    let source = fs::read_to_string(input)?;
    let outcome = pipeline.repair_json(&source)?;

    if outcome.was_repaired() {
        info!("Payload needed syntax repair");
    }
    println!("{}", to_json(outcome.value())?);
    Ok(())
}

fn apply_repair(
    pipeline: &Pipeline,
    response_path: &str,
    base_path: Option<&str>,
    output: &str,
) -> Result<(), MendError> {
    info!(response_path, output_path = output; "Applying repair response");
    let raw = fs::read_to_string(response_path)?;
    let base = base_path.map(fs::read_to_string).transpose()?;

    let xml = pipeline.apply_repair_response(&raw, base.as_deref())?;
    let (normalized, errors, _) = pipeline.validate(&xml).into_parts();
    if !errors.is_empty() {
        return Err(MendError::new_parse_error(ParseError::new(errors), normalized));
    }

    fs::write(output, normalized)?;
    info!(output_file = output; "Repaired markup written");
    Ok(())
}

fn to_json(value: &impl Serialize) -> Result<String, MendError> {
    serde_json::to_string_pretty(value).map_err(|err| MendError::Io(io::Error::other(err)))
}
