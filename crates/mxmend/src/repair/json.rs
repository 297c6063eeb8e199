//! Local syntax repair for JSON payloads.
//!
//! Repairs run in a fixed order and each one is a no-op on correct input.
//! String literals are masked before any textual repair runs, so quotes,
//! brackets and `//` sequences inside strings are never touched.

use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Stands in for a string literal while repairs run on the surrounding code.
const STRING_MARK: char = '\u{E000}';

/// Characters of context kept on each side of a failure offset.
const CONTEXT_RADIUS: usize = 80;

const PREVIEW_LENGTH: usize = 200;

/// Result of [`parse_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum JsonOutcome {
    /// The text parsed as-is.
    Parsed(Value),
    /// The text parsed after repair; `text` is the repaired source.
    Repaired { value: Value, text: String },
}

impl JsonOutcome {
    pub fn value(&self) -> &Value {
        match self {
            Self::Parsed(value) | Self::Repaired { value, .. } => value,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Parsed(value) | Self::Repaired { value, .. } => value,
        }
    }

    pub fn was_repaired(&self) -> bool {
        matches!(self, Self::Repaired { .. })
    }
}

/// Both the original text and its repair failed to parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid JSON: {original_error} (after repair: {repaired_error})")]
pub struct JsonRepairError {
    original_error: String,
    repaired_error: String,
    preview: String,
    line: Option<usize>,
    context: Option<String>,
}

impl JsonRepairError {
    fn new(text: &str, original: &serde_json::Error, repaired: &serde_json::Error) -> Self {
        let line = (original.line() > 0).then(|| original.line());
        let context = line.map(|line| context_window(text, line, original.column()));
        Self {
            original_error: original.to_string(),
            repaired_error: repaired.to_string(),
            preview: preview(text),
            line,
            context,
        }
    }

    /// Parse error of the text as received.
    pub fn original_error(&self) -> &str {
        &self.original_error
    }

    /// Parse error of the repaired text.
    pub fn repaired_error(&self) -> &str {
        &self.repaired_error
    }

    /// The trimmed start of the received text.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// 1-based line of the original failure.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Text around the original failure offset.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

/// Parses JSON, repairing it only when the text does not parse as-is.
///
/// # Errors
///
/// Returns a [`JsonRepairError`] carrying both parse errors when the repaired
/// text does not parse either.
pub fn parse_json(text: &str) -> Result<JsonOutcome, JsonRepairError> {
    let original_err = match serde_json::from_str(text) {
        Ok(value) => return Ok(JsonOutcome::Parsed(value)),
        Err(err) => err,
    };
    debug!(
        line = original_err.line(),
        column = original_err.column();
        "JSON did not parse, attempting repair"
    );

    let repaired = repair_json(text);
    match serde_json::from_str(&repaired) {
        Ok(value) => {
            info!(original_len = text.len(), repaired_len = repaired.len(); "Repaired JSON payload");
            Ok(JsonOutcome::Repaired {
                value,
                text: repaired,
            })
        }
        Err(repaired_err) => Err(JsonRepairError::new(text, &original_err, &repaired_err)),
    }
}

/// Applies every textual repair to `text`.
///
/// In order: code fences are stripped; comments are dropped and strings are
/// masked; missing commas are inserted between adjacent strings, between a
/// number and a following key, between a closer and a following key and
/// between a closer and an opener; trailing commas are removed; bare keys are
/// quoted; unmatched openers are closed. Single-quoted strings come back
/// double-quoted, with raw control characters escaped.
pub fn repair_json(text: &str) -> String {
    let unfenced = strip_code_fences(text);
    let masked = mask_strings(&unfenced);

    let mut code = masked.code;
    loop {
        let next = adjacent_strings_regex()
            .replace_all(&code, "$1,$2$3")
            .into_owned();
        if next == code {
            break;
        }
        code = next;
    }
    let code = number_key_regex().replace_all(&code, "$1,$2$3");
    let code = closer_key_regex().replace_all(&code, "$1,$2$3");
    let code = closer_opener_regex().replace_all(&code, "$1,$2$3");
    let code = trailing_comma_regex().replace_all(&code, "$1");
    let code = bare_key_regex().replace_all(&code, "$1\"$2\"$3");
    let code = balance_brackets(&code);

    unmask_strings(&code, &masked.strings)
}

fn adjacent_strings_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\x{E000})(\s+)(\x{E000})").expect("valid regex"))
}

fn number_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9])(\s*)(\x{E000}\s*:)").expect("valid regex"))
}

fn closer_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([}\]])(\s*)(\x{E000}\s*:)").expect("valid regex"))
}

fn closer_opener_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([}\]])(\s*)([{\[])").expect("valid regex"))
}

fn trailing_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid regex"))
}

fn bare_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)(\s*:)").expect("valid regex")
    })
}

fn strip_code_fences(text: &str) -> String {
    let mut lines: Vec<&str> = text.trim().lines().collect();
    if lines.first().is_some_and(|line| line.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim() == "```") {
        lines.pop();
    }
    lines.join("\n")
}

struct StringLiteral {
    quote: char,
    body: String,
}

struct Masked {
    code: String,
    strings: Vec<StringLiteral>,
}

/// Replaces every string literal with [`STRING_MARK`] and drops comments.
///
/// An unterminated string runs to the end of the input.
fn mask_strings(text: &str) -> Masked {
    let mut code = String::with_capacity(text.len());
    let mut strings = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                let mut body = String::new();
                while let Some(next) = chars.next() {
                    if next == c {
                        break;
                    }
                    body.push(next);
                    if next == '\\'
                        && let Some(escaped) = chars.next()
                    {
                        body.push(escaped);
                    }
                }
                code.push(STRING_MARK);
                strings.push(StringLiteral { quote: c, body });
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        code.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            STRING_MARK => {}
            _ => code.push(c),
        }
    }

    Masked { code, strings }
}

fn unmask_strings(code: &str, strings: &[StringLiteral]) -> String {
    let mut output = String::with_capacity(code.len());
    let mut literals = strings.iter();
    for c in code.chars() {
        if c != STRING_MARK {
            output.push(c);
            continue;
        }
        let Some(literal) = literals.next() else {
            continue;
        };
        output.push('"');
        write_string_body(&mut output, literal);
        output.push('"');
    }
    output
}

fn write_string_body(output: &mut String, literal: &StringLiteral) {
    let mut chars = literal.body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') if literal.quote == '\'' => output.push('\''),
                Some(escaped) => {
                    output.push('\\');
                    output.push(escaped);
                }
                None => output.push_str("\\\\"),
            },
            '"' if literal.quote == '\'' => output.push_str("\\\""),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            _ => output.push(c),
        }
    }
}

/// Closes unmatched openers and drops closers that match nothing.
///
/// A closer that skips over open brackets closes them first.
fn balance_brackets(code: &str) -> String {
    let mut output = String::with_capacity(code.len());
    let mut open: Vec<char> = Vec::new();

    for c in code.chars() {
        match c {
            '{' | '[' => {
                open.push(c);
                output.push(c);
            }
            '}' | ']' => {
                let opener = if c == '}' { '{' } else { '[' };
                if !open.contains(&opener) {
                    continue;
                }
                while let Some(top) = open.pop() {
                    if top == opener {
                        break;
                    }
                    output.push(closer_for(top));
                }
                output.push(c);
            }
            _ => output.push(c),
        }
    }

    if open.is_empty() {
        return output;
    }
    let trimmed_len = output.trim_end().trim_end_matches(',').len();
    output.truncate(trimmed_len);
    while let Some(top) = open.pop() {
        output.push(closer_for(top));
    }
    output
}

fn closer_for(opener: char) -> char {
    if opener == '{' { '}' } else { ']' }
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > PREVIEW_LENGTH {
        let head: String = trimmed.chars().take(PREVIEW_LENGTH).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}

/// Text within [`CONTEXT_RADIUS`] characters of a 1-based line and column.
fn context_window(text: &str, line: usize, column: usize) -> String {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let mut offset = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let before: Vec<char> = text[..offset].chars().rev().take(CONTEXT_RADIUS).collect();
    let after = text[offset..].chars().take(CONTEXT_RADIUS);
    before.into_iter().rev().chain(after).collect()
}
