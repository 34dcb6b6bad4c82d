//! Recovery of JSON values from model output.
//!
//! Models are asked for bare JSON but regularly wrap it in markdown fences or
//! prose. Parsing is attempted strictly first; only when that fails is the
//! text scanned for a balanced bracketed value of the expected shape.

use log::debug;
use serde_json::{ Map, Value };

use crate::errors::{ ClauseError, ClauseResult };
use crate::models::clause::ClauseAnalysis;
use crate::models::common::RiskLevel;

pub const INCOMPLETE_JSON: &str = "Model returned incomplete JSON";

/// Fields every analysis object must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["risk_level", "risk_explanation", "plain_english"];

/// The top-level JSON value a call site expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn delimiters(&self) -> (u8, u8) {
        match self {
            JsonShape::Array => (b'[', b']'),
            JsonShape::Object => (b'{', b'}'),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonShape::Array => value.is_array(),
            JsonShape::Object => value.is_object(),
        }
    }
}

/// Strip markdown code fences from a response
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = start + 3;
    // Skip the language tag (e.g. "json") on the opening fence line
    let content_start = trimmed[after_fence..]
        .find('\n')
        .map(|i| after_fence + i + 1)
        .unwrap_or(after_fence);

    match trimmed[content_start..].find("```") {
        Some(end) => trimmed[content_start..content_start + end].trim(),
        None => trimmed[content_start..].trim(),
    }
}

/// Parse model output as JSON.
///
/// A strict parse that succeeds is returned as-is even when its shape differs
/// from `expected`; callers validate the shape. The bracket scan only runs
/// when the text is not valid JSON at all.
pub fn parse_json(raw: &str, expected: JsonShape) -> ClauseResult<Value> {
    let text = strip_code_fences(raw);

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(strict_error) => {
            debug!("Strict JSON parse failed ({}), scanning for a bracketed value", strict_error);
            find_bracketed_value(text, expected).ok_or_else(|| {
                ClauseError::MalformedResponse(format!("No valid JSON found: {}", strict_error))
            })
        }
    }
}

/// First balanced `[...]` or `{...}` substring that parses as JSON
fn find_bracketed_value(text: &str, shape: JsonShape) -> Option<Value> {
    let (open, close) = shape.delimiters();
    let bytes = text.as_bytes();

    for start in (0..bytes.len()).filter(|&i| bytes[i] == open) {
        let Some(end) = balanced_end(bytes, start, open, close) else {
            continue;
        };
        // Brackets are ASCII, so both offsets sit on char boundaries
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
            if shape.matches(&value) {
                return Some(value);
            }
        }
    }

    None
}

/// Index of the bracket closing the one at `start`, skipping string contents
fn balanced_end(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        if byte == b'"' {
            in_string = true;
        } else if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(start + offset);
            }
        }
    }

    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a segmentation response: an array whose every element is a string
pub fn expect_string_array(value: Value) -> ClauseResult<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(
                ClauseError::SegmentationFailed(
                    format!("Expected a JSON array of strings, got {}", kind_of(&other))
                )
            );
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(clause) => Ok(clause),
            other =>
                Err(
                    ClauseError::SegmentationFailed(
                        format!("Element {} is {}, not a string", i + 1, kind_of(&other))
                    )
                ),
        })
        .collect()
}

fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    object.get(name).and_then(Value::as_str)
}

/// Build an analysis from one model object.
///
/// Missing or non-string fields yield an error analysis; defaults are never guessed.
pub fn analysis_from_value(value: &Value) -> ClauseAnalysis {
    let Some(object) = value.as_object() else {
        return ClauseAnalysis::failed(
            format!("Model returned a JSON {} instead of an object", kind_of(value))
        );
    };

    let (Some(level), Some(explanation), Some(plain)) = (
        string_field(object, REQUIRED_FIELDS[0]),
        string_field(object, REQUIRED_FIELDS[1]),
        string_field(object, REQUIRED_FIELDS[2]),
    ) else {
        return ClauseAnalysis::failed(INCOMPLETE_JSON);
    };

    match RiskLevel::from_model_label(level) {
        Some(risk_level) => ClauseAnalysis::new(risk_level, explanation.trim(), plain.trim()),
        None => ClauseAnalysis::failed(format!("Model returned unknown risk level: {}", level)),
    }
}
