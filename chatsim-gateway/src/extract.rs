//! Tolerant JSON extraction from model completions.
//!
//! Completions often wrap the payload in prose ("Here is the result: ...").
//! The whole text is parsed first; failing that, a single greedy span from
//! the first `{` to the last `}` (or `[` to the last `]`) is parsed.
//!
//! The span match does not count braces. Text with several JSON values, or
//! with stray braces in the surrounding prose, can yield the wrong span or
//! an unparsable one.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}|\[.*\]").expect("JSON span pattern"));

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("No valid JSON found in response")]
    NoJsonFound,
    #[error("Invalid JSON structure in response: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

/// Parse `text` as JSON, falling back to the greedy object/array span.
pub fn extract(text: &str) -> Result<Value, ExtractError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let span = JSON_SPAN.find(text).ok_or(ExtractError::NoJsonFound)?;
    serde_json::from_str(span.as_str()).map_err(ExtractError::InvalidJson)
}
