//! Common types used across the nutrition analysis system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::Error;

/// Nutrition-quality assessment of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub score: f64,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Shape of the request sent to the inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Reply constrained by an explicit output schema
    Structured,
    /// Plain instruction prompt, no machine schema
    Unstructured,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMode::Structured => write!(f, "structured"),
            RequestMode::Unstructured => write!(f, "unstructured"),
        }
    }
}

/// Everything a transport needs to perform one attempt
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub prompt: String,
    pub model_id: String,
    pub mode: RequestMode,
    /// Present only in structured mode
    pub output_schema: Option<serde_json::Value>,
    pub timeout: Duration,
}

/// Per-call retry state; lives for the duration of one `analyze` call
#[derive(Debug)]
pub struct AttemptState {
    pub attempt_index: u32,
    pub mode: RequestMode,
    pub last_error: Option<Error>,
}

impl AttemptState {
    pub fn new() -> Self {
        Self {
            attempt_index: 0,
            mode: RequestMode::Structured,
            last_error: None,
        }
    }

    /// Record a failure and move to the next attempt
    pub fn advance(&mut self, error: Error) {
        self.attempt_index += 1;
        self.last_error = Some(error);
    }

    /// Permanently drop the output schema for the rest of the call
    pub fn switch_to_unstructured(&mut self, error: Error) {
        self.mode = RequestMode::Unstructured;
        self.advance(error);
    }
}

impl Default for AttemptState {
    fn default() -> Self {
        Self::new()
    }
}
