//! Structural validation of analysis replies

use serde_json::Value;

use crate::prompt::REQUIRED_KEYS;
use crate::{AnalysisResult, Error, Result};

/// Decodes reply text into an [`AnalysisResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Parse and check a raw reply.
    ///
    /// The score is accepted as-is, even outside 0..=100.
    pub fn validate(&self, payload: &str) -> Result<AnalysisResult> {
        let body = strip_code_fence(payload);

        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::ContentInvalid(format!("reply is not valid JSON: {}", e)))?;

        let object = value
            .as_object()
            .ok_or_else(|| Error::ContentInvalid("reply is not a JSON object".to_string()))?;

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::ContentInvalid(format!(
                "reply is missing required keys: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| Error::ContentInvalid(format!("reply has wrongly typed keys: {}", e)))
    }
}

/// Unwrap a reply wrapped in a single markdown code fence
fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}
