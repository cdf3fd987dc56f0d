//! Core types and the resilient inference client for Nutri
//!
//! This crate turns a recipe's ingredient list into a nutrition-quality
//! assessment. It defines the request envelope and normalizer, the prompt
//! and reply contract, the retry and degradation policies, and the
//! [`InferenceClient`] that ties them together behind the
//! [`InferenceTransport`] trait, so provider crates and tests can plug in.

pub mod client;
pub mod config;
pub mod degradation;
pub mod error;
pub mod ingredient;
pub mod llm;
pub mod prompt;
pub mod retry;
pub mod types;
pub mod validator;

pub use client::{AnalysisOutcome, InferenceClient, ResultSource};
pub use config::ClientConfig;
pub use degradation::{heuristic_analysis, offline_stub};
pub use error::{Error, ErrorClass, Result, classify_http_failure, mentions_unavailability};
pub use ingredient::{
    AnalyzeRequest, AnalyzeResponse, IngredientDescriptor, IngredientInput, NormalizedRequest,
    normalize_ingredients,
};
pub use llm::InferenceTransport;
pub use prompt::PromptBuilder;
pub use retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
pub use types::*;
pub use validator::ResponseValidator;
