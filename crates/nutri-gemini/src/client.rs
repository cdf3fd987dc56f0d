//! Gemini generateContent transport

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use nutri_core::{
    ClientConfig, Error, InferenceRequest, InferenceTransport, RequestMode, Result,
    classify_http_failure, mentions_unavailability,
};

/// Sends analysis prompts to the Gemini `generateContent` endpoint
pub struct GeminiTransport {
    api_key: Option<String>,
    api_url: String,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationParams,
}

#[derive(Serialize)]
pub(crate) struct RequestContent {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Serialize)]
pub(crate) struct RequestPart {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationParams {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiTransport {
    /// Create a transport from client configuration.
    ///
    /// The per-attempt timeout is enforced by the caller, so the HTTP client
    /// itself carries none. A missing key is only an error once `send` is
    /// called; offline clients never get that far.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().filter(|key| !key.trim().is_empty());

        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            api_key,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Render the outbound body for one attempt
    pub(crate) fn request_body(request: &InferenceRequest) -> GenerateContentRequest {
        let (response_mime_type, response_schema) = match request.mode {
            RequestMode::Structured => (
                Some("application/json".to_string()),
                request.output_schema.clone(),
            ),
            RequestMode::Unstructured => (None, None),
        };

        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationParams {
                temperature: 0.0,
                response_mime_type,
                response_schema,
            },
        }
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_url, model_id)
    }

    /// Pull the reply text out of a successful response body
    fn extract_text(body: &str) -> Result<String> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| Error::ContentInvalid(format!("unexpected response envelope: {}", e)))?;

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::ContentInvalid(format!("prompt blocked: {}", reason)));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::ContentInvalid("response has no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::ContentInvalid(format!(
                "empty reply (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

/// Map a reqwest failure onto the error taxonomy
fn classify_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::Timeout(err.to_string());
    }
    if err.is_connect() || err.is_request() || err.is_body() {
        return Error::TransientAvailability(err.to_string());
    }
    let message = err.to_string();
    if mentions_unavailability(&message) {
        return Error::TransientAvailability(message);
    }
    Error::HardFailure(message)
}

#[async_trait]
impl InferenceTransport for GeminiTransport {
    async fn send(&self, request: &InferenceRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::HardFailure("no Gemini API key configured".to_string()))?;
        let body = Self::request_body(request);
        let url = self.endpoint(&request.model_id);
        debug!(url = %url, mode = %request.mode, "POST generateContent");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            let error = classify_http_failure(status.as_u16(), &text);
            warn!(status = status.as_u16(), class = ?error.class(), "Gemini request failed");
            return Err(error);
        }

        Self::extract_text(&text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutri_core::{NormalizedRequest, PromptBuilder};
    use std::time::Duration;

    fn inference_request(mode: RequestMode) -> InferenceRequest {
        let builder = PromptBuilder::new();
        let request = NormalizedRequest::new(vec!["oats".to_string()]).unwrap();
        InferenceRequest {
            prompt: builder.build(&request),
            model_id: "gemini-2.0-flash".to_string(),
            mode,
            output_schema: match mode {
                RequestMode::Structured => Some(builder.output_schema()),
                RequestMode::Unstructured => None,
            },
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_structured_body_carries_schema() {
        let body = serde_json::to_value(GeminiTransport::request_body(&inference_request(
            RequestMode::Structured,
        )))
        .unwrap();

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["required"][0], "summary");
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn test_unstructured_body_has_no_schema() {
        let body = serde_json::to_value(GeminiTransport::request_body(&inference_request(
            RequestMode::Unstructured,
        )))
        .unwrap();

        let config = body["generationConfig"].as_object().unwrap();
        assert!(!config.contains_key("responseSchema"));
        assert!(!config.contains_key("responseMimeType"));
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("1. oats"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(GeminiTransport::extract_text(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_extract_text_rejects_empty_and_blocked() {
        let empty = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        assert!(matches!(
            GeminiTransport::extract_text(empty),
            Err(Error::ContentInvalid(_))
        ));

        let blocked = r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(
            GeminiTransport::extract_text(blocked),
            Err(Error::ContentInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_send_without_key_is_hard_failure() {
        let transport = GeminiTransport::new(&ClientConfig::offline()).unwrap();
        let err = transport
            .send(&inference_request(RequestMode::Structured))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HardFailure(_)));
    }
}
