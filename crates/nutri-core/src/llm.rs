//! Inference transport trait

use async_trait::async_trait;
use std::sync::Arc;

use crate::{InferenceRequest, Result};

/// Trait for generative-text backends (e.g., Gemini)
///
/// One call is one network attempt. Implementations return the reply text
/// on success and map failures onto the error taxonomy: availability
/// problems as `Timeout`/`TransientAvailability`, a refused output schema as
/// `SchemaRejected`, an unusable reply as `ContentInvalid`, and anything
/// else as `HardFailure`. Retrying and timing out are the caller's job.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Send one request and return the raw reply text
    async fn send(&self, request: &InferenceRequest) -> Result<String>;

    /// Short name for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: InferenceTransport + ?Sized> InferenceTransport for Arc<T> {
    async fn send(&self, request: &InferenceRequest) -> Result<String> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
