//! Loading analysis requests from the command line, files or stdin

use std::io::{self, Read};
use std::path::Path;

use nutri_core::{AnalyzeRequest, Error, IngredientInput, NormalizedRequest, Result};

/// Where the ingredient list comes from
#[derive(Debug, Clone)]
pub enum RequestSource {
    /// Bare ingredient strings from argv
    Args(Vec<String>),
    /// A JSON body `{ "ingredients": [...] }` on disk
    File(std::path::PathBuf),
    /// A JSON body on standard input
    Stdin,
}

/// Read and validate a request; empty input is a caller-input error
pub fn load_request(source: &RequestSource) -> Result<NormalizedRequest> {
    match source {
        RequestSource::Args(items) => {
            let inputs: Vec<IngredientInput> =
                items.iter().map(|item| IngredientInput::from(item.as_str())).collect();
            NormalizedRequest::from_inputs(&inputs)
        }
        RequestSource::File(path) => parse_body(&read_file(path)?),
        RequestSource::Stdin => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body)?;
            parse_body(&body)
        }
    }
}

/// Validate a raw JSON request body
pub fn parse_body(body: &str) -> Result<NormalizedRequest> {
    AnalyzeRequest::from_json(body)?.normalize()
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::CallerInputInvalid(format!("cannot read {}: {}", path.display(), e))
    })
}
