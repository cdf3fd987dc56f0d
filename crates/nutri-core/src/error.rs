//! Error types for Nutri

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the nutrition analysis system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    CallerInputInvalid(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Service unavailable: {0}")]
    TransientAvailability(String),

    #[error("Structured request rejected: {0}")]
    SchemaRejected(String),

    #[error("Invalid response content: {0}")]
    ContentInvalid(String),

    #[error("Inference provider error: {0}")]
    HardFailure(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failed attempt is handled by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Remote temporarily unable to serve; retry, then degrade
    Availability,
    /// Remote refused the structured request shape
    SchemaRejection,
    /// Remote answered but the answer is unusable
    Content,
    /// Everything else; propagated as-is
    Hard,
}

impl Error {
    /// Classify this error for the retry loop
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Timeout(_) | Error::TransientAvailability(_) => ErrorClass::Availability,
            Error::SchemaRejected(_) => ErrorClass::SchemaRejection,
            Error::ContentInvalid(_) => ErrorClass::Content,
            _ => ErrorClass::Hard,
        }
    }

    /// Whether the retry loop may try again after this error
    pub fn is_retriable(&self) -> bool {
        self.class() == ErrorClass::Availability
    }
}

/// Message fragments that mark a provider error as an availability problem
/// regardless of the status code it arrived with.
const AVAILABILITY_MARKERS: &[&str] = &[
    "overloaded",
    "unavailable",
    "resource exhausted",
    "resource_exhausted",
    "try again later",
    "connection reset",
];

/// Whether a provider message reads like a temporary availability problem
pub fn mentions_unavailability(message: &str) -> bool {
    let lower = message.to_lowercase();
    AVAILABILITY_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Map an HTTP failure from the inference service onto the error taxonomy.
///
/// 429 and 5xx are availability problems. A 400 that complains about the
/// argument or schema is a schema rejection, unless it is about credentials;
/// this holds even when its message uses availability wording. Anything else
/// is hard, except when the body says the model is overloaded.
pub fn classify_http_failure(status: u16, body: &str) -> Error {
    let detail = format!("HTTP {}: {}", status, body.trim());

    if status == 429 || (500..=599).contains(&status) {
        return Error::TransientAvailability(detail);
    }

    if status == 400 {
        let lower = body.to_lowercase();
        let about_credentials = lower.contains("api key") || lower.contains("api_key");
        let about_arguments = lower.contains("invalid_argument")
            || lower.contains("invalid argument")
            || lower.contains("schema");
        if about_arguments && !about_credentials {
            return Error::SchemaRejected(detail);
        }
    }

    if mentions_unavailability(body) {
        return Error::TransientAvailability(detail);
    }

    Error::HardFailure(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_and_server_errors_are_availability() {
        assert_eq!(classify_http_failure(429, "quota").class(), ErrorClass::Availability);
        assert_eq!(classify_http_failure(500, "").class(), ErrorClass::Availability);
        assert_eq!(classify_http_failure(503, "busy").class(), ErrorClass::Availability);
    }

    #[test]
    fn test_overloaded_message_is_availability_even_on_4xx() {
        let err = classify_http_failure(404, "The model is overloaded. Please try again later.");
        assert!(err.is_retriable());
    }

    #[test]
    fn test_invalid_argument_is_schema_rejection() {
        let body = r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","message":"Invalid JSON payload received. Unknown name \"responseSchema\""}}"#;
        assert_eq!(classify_http_failure(400, body).class(), ErrorClass::SchemaRejection);
    }

    #[test]
    fn test_schema_rejection_wins_over_availability_wording() {
        let body = r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","message":"responseSchema is unavailable for this model"}}"#;
        assert_eq!(classify_http_failure(400, body).class(), ErrorClass::SchemaRejection);
        assert_eq!(
            classify_http_failure(400, "model temporarily unavailable").class(),
            ErrorClass::Availability
        );
    }

    #[test]
    fn test_bad_api_key_is_hard_failure() {
        let body = r#"{"error":{"code":400,"status":"INVALID_ARGUMENT","message":"API key not valid. Please pass a valid API key."}}"#;
        assert_eq!(classify_http_failure(400, body).class(), ErrorClass::Hard);
        assert_eq!(classify_http_failure(401, "unauthenticated").class(), ErrorClass::Hard);
        assert_eq!(classify_http_failure(403, "PERMISSION_DENIED").class(), ErrorClass::Hard);
    }

    #[test]
    fn test_content_errors_are_not_retriable() {
        assert!(!Error::ContentInvalid("bad".into()).is_retriable());
        assert!(Error::Timeout("slow".into()).is_retriable());
    }
}
