//! Resilient inference client
//!
//! Drives one analysis call end to end: credential check, a sequential
//! attempt loop bounded by per-attempt timeouts, error classification and
//! backoff, and finally either the validated remote result, a degraded
//! local result, or a hard error.

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::degradation::{heuristic_analysis, offline_stub};
use crate::retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::{
    AnalysisResult, AttemptState, ClientConfig, Error, InferenceRequest, InferenceTransport,
    NormalizedRequest, PromptBuilder, RequestMode, ResponseValidator, Result,
};

/// Where an analysis result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Validated reply from the inference service
    Remote,
    /// No credential configured
    Offline,
    /// Service unavailable after every attempt
    Heuristic,
}

/// An analysis result plus how it was produced
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub source: ResultSource,
    /// Network attempts made for this call
    pub attempts: u32,
}

/// Inference client with timeout, retry and degradation policy
///
/// Holds no per-call state, so one instance can serve concurrent callers.
pub struct InferenceClient<T: InferenceTransport, S: Sleeper = TokioSleeper> {
    config: ClientConfig,
    transport: T,
    sleeper: S,
    prompts: PromptBuilder,
    validator: ResponseValidator,
}

impl<T: InferenceTransport> InferenceClient<T, TokioSleeper> {
    /// Create a new client that sleeps on the tokio timer between attempts
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            sleeper: TokioSleeper,
            prompts: PromptBuilder::new(),
            validator: ResponseValidator::new(),
        }
    }
}

impl<T: InferenceTransport, S: Sleeper> InferenceClient<T, S> {
    /// Replace the sleeper used for backoff
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> InferenceClient<T, S2> {
        InferenceClient {
            config: self.config,
            transport: self.transport,
            sleeper,
            prompts: self.prompts,
            validator: self.validator,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upper bound on the duration of one call, for callers' own timeouts
    pub fn worst_case_latency(&self) -> std::time::Duration {
        self.config.worst_case_latency()
    }

    /// Analyze a recipe and return only the result
    pub async fn analyze(&self, request: &NormalizedRequest) -> Result<AnalysisResult> {
        self.analyze_with_outcome(request).await.map(|outcome| outcome.result)
    }

    /// Analyze a recipe.
    ///
    /// Errors only with `ContentInvalid` (the service answered with something
    /// unusable) or `HardFailure` (credentials, permissions, a second schema
    /// rejection, ...). Availability failures end in the heuristic result.
    pub async fn analyze_with_outcome(&self, request: &NormalizedRequest) -> Result<AnalysisOutcome> {
        if !self.config.has_credential() {
            info!("no inference credential configured; returning offline analysis");
            return Ok(AnalysisOutcome {
                result: offline_stub(),
                source: ResultSource::Offline,
                attempts: 0,
            });
        }

        let prompt = self.prompts.build(request);
        let mut state = AttemptState::new();

        loop {
            let attempt = self.build_request(&prompt, state.mode);
            debug!(
                transport = self.transport.name(),
                attempt = state.attempt_index,
                mode = %state.mode,
                ingredients = request.len(),
                "sending inference request"
            );

            let failure = match timeout(attempt.timeout, self.transport.send(&attempt)).await {
                Ok(Ok(text)) => {
                    let result = self.validator.validate(&text).inspect_err(|e| {
                        error!(attempt = state.attempt_index, error = %e, "inference reply rejected");
                    })?;
                    return Ok(AnalysisOutcome {
                        result,
                        source: ResultSource::Remote,
                        attempts: state.attempt_index + 1,
                    });
                }
                Ok(Err(e)) => e,
                Err(_) => Error::Timeout(format!(
                    "attempt {} exceeded {} ms",
                    state.attempt_index, self.config.timeout_ms
                )),
            };

            let jitter_ms = RetryPolicy::sample_jitter_ms();
            match self.config.retry.decide(&state, failure.class(), jitter_ms) {
                RetryDecision::Retry { delay } => {
                    warn!(
                        attempt = state.attempt_index,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "inference attempt failed; backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    state.advance(failure);
                }
                RetryDecision::SwitchMode => {
                    warn!(
                        attempt = state.attempt_index,
                        error = %failure,
                        "structured request rejected; retrying without output schema"
                    );
                    state.switch_to_unstructured(failure);
                }
                RetryDecision::Degrade => {
                    info!(
                        attempts = state.attempt_index + 1,
                        error = %failure,
                        "inference service unavailable; returning heuristic analysis"
                    );
                    return Ok(AnalysisOutcome {
                        result: heuristic_analysis(request),
                        source: ResultSource::Heuristic,
                        attempts: state.attempt_index + 1,
                    });
                }
                RetryDecision::Fail => {
                    error!(attempt = state.attempt_index, error = %failure, "inference call failed");
                    return Err(match failure {
                        Error::SchemaRejected(detail) => Error::HardFailure(format!(
                            "request rejected even without output schema: {}",
                            detail
                        )),
                        other => other,
                    });
                }
            }
        }
    }

    fn build_request(&self, prompt: &str, mode: RequestMode) -> InferenceRequest {
        InferenceRequest {
            prompt: prompt.to_string(),
            model_id: self.config.model_id.clone(),
            mode,
            output_schema: match mode {
                RequestMode::Structured => Some(self.prompts.output_schema()),
                RequestMode::Unstructured => None,
            },
            timeout: self.config.timeout(),
        }
    }
}
