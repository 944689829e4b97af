//! The `analyze` command: run one analysis and print the review.

use std::env;
use std::sync::Arc;

use clap::Args;
use tracing::{debug, info, instrument};

use review_warden_core::{errors::AnalysisError, PipelineState, ReviewWarden};
use review_warden_developer_platforms::errors::Error as SourceError;
use review_warden_developer_platforms::github::GitHubProvider;
use review_warden_model_clients::openai::{OpenAiClient, OpenAiConfig};

use crate::errors::CliError;

#[cfg(test)]
#[path = "analyze_tests.rs"]
mod tests;

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// The repository as `owner/name` or a GitHub URL
    #[arg(short, long)]
    pub repo: String,

    /// The pull request number
    #[arg(short, long)]
    pub pr_number: u64,

    /// GitHub token; falls back to the GITHUB_TOKEN environment variable
    #[arg(short, long)]
    pub token: Option<String>,
}

/// Reads the model endpoint configuration from the environment.
///
/// `MODEL_API_KEY` is required; `MODEL_BASE_URL` and `MODEL_NAME` override
/// the OpenAI defaults, which lets the CLI target any compatible endpoint.
fn model_config_from_env() -> Result<OpenAiConfig, CliError> {
    let api_key = env::var("MODEL_API_KEY")
        .map_err(|_| CliError::ConfigError("MODEL_API_KEY is not set".to_string()))?;

    let mut config = OpenAiConfig {
        api_key,
        ..OpenAiConfig::default()
    };
    if let Ok(base_url) = env::var("MODEL_BASE_URL") {
        config.base_url = base_url;
    }
    if let Ok(name) = env::var("MODEL_NAME") {
        config.model = name;
    }

    Ok(config)
}

/// Resolves the GitHub token from the flag or the environment.
fn resolve_token(flag: Option<String>) -> Result<String, CliError> {
    flag.or_else(|| env::var("GITHUB_TOKEN").ok())
        .ok_or_else(|| {
            CliError::AuthError(
                "No GitHub token provided. Pass --token or set GITHUB_TOKEN.".to_string(),
            )
        })
}

/// Translates a pipeline failure into the CLI error taxonomy.
fn map_analysis_error(err: AnalysisError) -> CliError {
    match err {
        AnalysisError::Validation(msg) => CliError::InvalidArguments(msg),
        AnalysisError::Source(SourceError::AuthFailed(msg)) => CliError::AuthError(msg),
        other => CliError::AnalysisFailed(other.to_string()),
    }
}

/// Executes the analyze command.
///
/// Runs a single analysis against the configured model endpoint and prints
/// the committed review as pretty JSON on stdout.
///
/// # Arguments
///
/// * `args` - The parsed command-line arguments
///
/// # Errors
///
/// Returns a `CliError` when the token or model configuration is missing,
/// the arguments fail validation, or the analysis itself fails.
#[instrument(skip(args), fields(repository = args.repo.as_str(), pull_request = args.pr_number))]
pub async fn execute(args: AnalyzeArgs) -> Result<(), CliError> {
    let token = resolve_token(args.token)?;
    let model_config = model_config_from_env()?;

    debug!("Creating the GitHub client");
    let provider =
        GitHubProvider::from_token(&token).map_err(|e| CliError::AuthError(e.to_string()))?;
    let model =
        OpenAiClient::new(model_config).map_err(|e| CliError::ConfigError(e.to_string()))?;

    let state = Arc::new(PipelineState::in_memory());
    let warden = ReviewWarden::new(provider, model, state);

    info!(
        repository = args.repo.as_str(),
        pull_request = args.pr_number,
        "Analyzing pull request"
    );
    let review = warden
        .analyze(&args.repo, args.pr_number)
        .await
        .map_err(map_analysis_error)?;

    let rendered =
        serde_json::to_string_pretty(&review).map_err(|e| CliError::Other(e.to_string()))?;
    println!("{}", rendered);

    Ok(())
}
