//! Gemini integration for Nutri
//!
//! This crate provides the Gemini implementation of the InferenceTransport trait.

mod client;

pub use client::GeminiTransport;

// Re-export core types for convenience
pub use nutri_core::{
    AnalysisResult, ClientConfig, Error, InferenceClient, InferenceTransport, Result,
};

/// Build an inference client backed by Gemini
pub fn gemini_client(config: ClientConfig) -> Result<InferenceClient<GeminiTransport>> {
    let transport = GeminiTransport::new(&config)?;
    Ok(InferenceClient::new(config, transport))
}

/// Build an inference client from environment variables
pub fn from_env() -> Result<InferenceClient<GeminiTransport>> {
    gemini_client(ClientConfig::from_env()?)
}
