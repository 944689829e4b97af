//! # Review Warden CLI
//!
//! Command-line interface for running pull request analyses from a
//! terminal.
//!
//! This binary drives the same analysis pipeline as the server, but for a
//! single pull request: it fetches the changed files, asks the configured
//! model for a review, and prints the committed review as pretty JSON.
//!
//! # Commands
//!
//! - `analyze` - Analyze one pull request and print the review
//!
//! # Examples
//!
//! ```bash
//! # Analyze a pull request with an explicit token
//! review-warden analyze --repo owner/repo --pr-number 123 --token <token>
//!
//! # Or let the token come from the environment
//! export GITHUB_TOKEN=<token>
//! review-warden analyze --repo https://github.com/owner/repo --pr-number 123
//! ```

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command implementations for the CLI.
mod commands;

/// Error types specific to the CLI.
mod errors;

use commands::analyze::AnalyzeArgs;
use errors::CliError;

/// Command-line interface structure for Review Warden.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the Review Warden CLI.
#[derive(Subcommand)]
enum Commands {
    /// Analyze a pull request and print the resulting review
    #[command(name = "analyze")]
    Analyze(AnalyzeArgs),
}

/// Main entry point for the Review Warden CLI.
///
/// Initializes logging, parses command-line arguments, and dispatches to
/// the appropriate command handler.
///
/// # Errors
///
/// Returns a `CliError` when the command fails; the error variant
/// determines the process exit code.
#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("REVIEW_WARDEN_LOG"))
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Analyze(args) => {
            if let Err(e) = commands::analyze::execute(args).await {
                error!("Error analyzing pull request: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
