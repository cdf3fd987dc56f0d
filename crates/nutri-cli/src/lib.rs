//! CLI helpers for Nutri

mod input;
mod report;

pub use input::{RequestSource, load_request, parse_body};
pub use report::{render_report, to_response_json};

// Re-export core types
pub use nutri_core::{Error, Result};
