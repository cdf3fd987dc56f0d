//! Client configuration

use serde::{Serialize, Serializer};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::{Error, Result, RetryPolicy};

pub const DEFAULT_MODEL_ID: &str = "gemini-2.0-flash";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;

/// Configuration for the inference client, read once and passed in
#[derive(Clone, Serialize)]
pub struct ClientConfig {
    #[serde(serialize_with = "redact_key")]
    pub api_key: Option<String>,
    pub model_id: String,
    pub api_url: String,
    pub timeout_ms: u64,
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create configuration with explicit credential and default tuning
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }

    /// Configuration with no credential; the client will serve the offline stub
    pub fn offline() -> Self {
        Self::new(None)
    }

    /// Create configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::offline();

        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let model_id = lookup("NUTRI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model_id);

        let api_url = lookup("NUTRI_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let timeout_ms = parse_number(&lookup, "NUTRI_TIMEOUT_MS", defaults.timeout_ms)?;
        let max_retries = parse_number(&lookup, "NUTRI_MAX_RETRIES", defaults.retry.max_retries)?;
        let backoff_base_ms =
            parse_number(&lookup, "NUTRI_BACKOFF_BASE_MS", defaults.retry.backoff_base_ms)?;
        let backoff_max_ms =
            parse_number(&lookup, "NUTRI_BACKOFF_MAX_MS", defaults.retry.backoff_max_ms)?;

        if timeout_ms == 0 {
            return Err(Error::Configuration(
                "NUTRI_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            model_id,
            api_url,
            timeout_ms,
            retry: RetryPolicy {
                max_retries,
                backoff_base_ms,
                backoff_max_ms,
            },
        })
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Upper bound on how long one `analyze` call can take
    pub fn worst_case_latency(&self) -> Duration {
        self.timeout()
            .saturating_mul(self.retry.max_attempts())
            .saturating_add(self.retry.max_total_backoff())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model_id", &self.model_id)
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("retry", &self.retry)
            .finish()
    }
}

fn redact_key<S: Serializer>(key: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match key {
        Some(_) => serializer.serialize_str("[redacted]"),
        None => serializer.serialize_none(),
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            Error::Configuration(format!("{} must be a non-negative integer, got {:?}", key, raw))
        }),
    }
}
