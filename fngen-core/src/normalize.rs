//! Response normalization
//!
//! Backends wrap JSON in code fences or stray quotes despite instructions.
//! A [`ResponseNormalizer`] recovers a syntactically valid JSON document from
//! the raw reply, or fails with [`FunctionError::MalformedResponse`]. It is a
//! best-effort adapter, not a parser, and can be swapped per function.

use crate::errors::{FunctionError, FunctionResult};
use serde_json::Value;
use std::fmt::Debug;
use tracing::trace;

/// Policy that turns a raw backend reply into parseable JSON text
pub trait ResponseNormalizer: Debug + Send + Sync {
    fn normalize(&self, raw: &str) -> FunctionResult<String>;
}

/// Fence stripping and outer-quote recovery only
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictNormalizer;

impl ResponseNormalizer for StrictNormalizer {
    fn normalize(&self, raw: &str) -> FunctionResult<String> {
        let mut text = raw.trim();

        if text.starts_with("```") && text.ends_with("```") {
            text = strip_fence(text).ok_or_else(|| {
                FunctionError::malformed(format!("Invalid Markdown-wrapped response format: {}", raw))
            })?;
        }

        if is_valid_json(text) {
            return Ok(text.to_string());
        }

        // Stringified JSON, e.g. "{"a": 1}"
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            let unquoted = &text[1..text.len() - 1];
            if is_valid_json(unquoted) {
                trace!("Recovered JSON by stripping outer quotes");
                return Ok(unquoted.to_string());
            }
        }

        Err(FunctionError::malformed(format!("Invalid response format: {}", text)))
    }
}

/// Strict recovery first, then fenced blocks and JSON embedded in prose
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientNormalizer;

impl ResponseNormalizer for LenientNormalizer {
    fn normalize(&self, raw: &str) -> FunctionResult<String> {
        let strict = match StrictNormalizer.normalize(raw) {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        for block in regex_utils::fence::extract_all(raw) {
            if let Ok(text) = StrictNormalizer.normalize(block) {
                trace!("Recovered JSON from a fenced block inside prose");
                return Ok(text);
            }
        }

        for start in regex_utils::json::candidate_starts(raw) {
            if let Some(text) = leading_json(&raw[start..]) {
                trace!(offset = start, "Recovered JSON embedded in prose");
                return Ok(text.to_string());
            }
        }

        Err(strict)
    }
}

/// Interior of a fenced block: everything between the first and last line
fn strip_fence(text: &str) -> Option<&str> {
    let first = text.find('\n')?;
    let last = text.rfind('\n')?;
    if first >= last {
        return None;
    }
    Some(text[first + 1..last].trim())
}

fn is_valid_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// The complete JSON value at the start of `text`, if there is one
fn leading_json(text: &str) -> Option<&str> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match stream.next() {
        Some(Ok(_)) => Some(&text[..stream.byte_offset()]),
        _ => None,
    }
}
