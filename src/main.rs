use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use nutri_cli::{RequestSource, load_request, render_report, to_response_json};
use nutri_core::{ClientConfig, Error, NormalizedRequest, PromptBuilder};
use nutri_gemini::gemini_client;

#[derive(Parser)]
#[command(name = "nutri")]
#[command(about = "Nutrition analysis for recipe ingredient lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze ingredients and print `{ "analysis": ... }` as JSON
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Print the prompt that would be sent instead of calling the service
        #[arg(long)]
        show_prompt: bool,
    },
    /// Analyze ingredients and print a human-readable report
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Show the effective configuration and latency bound
    Config,
}

#[derive(Args)]
struct InputArgs {
    /// Ingredients, e.g. "2 eggs" "1 cup flour"
    ingredients: Vec<String>,

    /// Read a JSON request body `{ "ingredients": [...] }` from a file
    #[arg(short, long, conflicts_with_all = ["ingredients", "stdin"])]
    file: Option<PathBuf>,

    /// Read a JSON request body from standard input
    #[arg(long, conflicts_with = "ingredients")]
    stdin: bool,
}

impl InputArgs {
    fn source(&self) -> RequestSource {
        if let Some(path) = &self.file {
            RequestSource::File(path.clone())
        } else if self.stdin {
            RequestSource::Stdin
        } else {
            RequestSource::Args(self.ingredients.clone())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            match err.downcast_ref::<Error>() {
                Some(Error::CallerInputInvalid(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::from_env()?;

    match cli.command {
        Commands::Analyze {
            input,
            pretty,
            show_prompt,
        } => {
            let request = load_request(&input.source())?;
            if show_prompt {
                print!("{}", PromptBuilder::new().build(&request));
                return Ok(());
            }
            let outcome = analyze(config, &request).await?;
            println!("{}", to_response_json(&outcome.result, pretty)?);
        }
        Commands::Summary { input } => {
            let request = load_request(&input.source())?;
            let outcome = analyze(config, &request).await?;
            println!("{}", render_report(&outcome));
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!(
                "{} {:.1}s",
                "Worst-case call latency:".bold(),
                config.worst_case_latency().as_secs_f64()
            );
            if !config.has_credential() {
                println!("{}", "No GEMINI_API_KEY set: running in offline mode.".yellow());
            }
        }
    }

    Ok(())
}

async fn analyze(config: ClientConfig, request: &NormalizedRequest) -> Result<nutri_core::AnalysisOutcome> {
    let client = gemini_client(config)?;
    tracing::debug!(
        ingredients = request.len(),
        bound_ms = client.worst_case_latency().as_millis() as u64,
        "starting analysis"
    );
    Ok(client.analyze_with_outcome(request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_ingredients() {
        let cli = Cli::try_parse_from(["nutri", "analyze", "2 eggs", "toast", "--pretty"]).unwrap();
        match cli.command {
            Commands::Analyze { input, pretty, .. } => {
                assert!(pretty);
                assert!(matches!(input.source(), RequestSource::Args(items) if items == ["2 eggs", "toast"]));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_file_conflicts_with_positional() {
        assert!(Cli::try_parse_from(["nutri", "summary", "eggs", "--file", "req.json"]).is_err());
    }
}
