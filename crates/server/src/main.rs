//! # Review Warden Server
//!
//! HTTP front end for the analysis pipeline. Exposes the analysis
//! endpoint plus read-only views over the committed reviews and the
//! aggregate statistics the dashboard consumes.
//!
//! GitHub credentials arrive with each analysis request and live only for
//! the duration of that request; the model endpoint configuration comes
//! from the environment at startup.

use std::{env, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use review_warden_core::{
    config::AnalysisConfig,
    errors::AnalysisError,
    models::{DashboardStats, MetricsPoint, ReviewSummary, TaggedSecurityIssue},
    PipelineState, ReviewWarden,
};
use review_warden_developer_platforms::errors::Error as SourceError;
use review_warden_developer_platforms::github::GitHubProvider;
use review_warden_model_clients::openai::{OpenAiClient, OpenAiConfig};

mod errors;
use errors::ServerError;

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// The port used when `REVIEW_WARDEN_PORT` is not set.
const DEFAULT_PORT: u16 = 8000;

struct ServerConfig {
    port_number: u16,
    model: OpenAiConfig,
}

/// The state shared by all request handlers.
pub struct AppState {
    /// The pipeline state: run tokens, review repository, aggregates
    pub pipeline: Arc<PipelineState>,

    /// Model endpoint configuration, cloned into a client per request
    pub model_config: OpenAiConfig,

    /// Analysis tuning shared by all runs
    pub analysis_config: AnalysisConfig,
}

/// The body of an analysis request.
#[derive(Debug, Deserialize)]
pub struct AnalyzePrRequest {
    /// The repository as `owner/name` or a GitHub URL
    pub repo_url: String,

    /// The pull request number
    pub pr_number: u64,

    /// A GitHub token used for this request only, never stored
    pub github_token: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct Banner {
    name: &'static str,
    version: &'static str,
}

fn error_response(status: StatusCode, reason: String) -> Response {
    (status, Json(ErrorBody { error: reason })).into_response()
}

/// Maps a pipeline failure onto the HTTP status the caller should see.
///
/// Every diff source failure surfaces as a 4xx: the request named a pull
/// request that could not be fetched, and the caller is the one who can
/// act on that (fix the token, the coordinates, or resubmit). Model
/// failures map to 502 and a post-analysis storage fault to 500.
fn analysis_error_response(err: &AnalysisError) -> Response {
    let status = match err {
        AnalysisError::Validation(_) => StatusCode::BAD_REQUEST,
        AnalysisError::AlreadyAnalyzing { .. } => StatusCode::CONFLICT,
        AnalysisError::Source(SourceError::AuthFailed(_)) => StatusCode::UNAUTHORIZED,
        AnalysisError::Source(SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
        AnalysisError::Source(SourceError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
        AnalysisError::Source(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Model(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error_response(status, err.to_string())
}

async fn handle_root() -> Json<Banner> {
    Json(Banner {
        name: "Review Warden API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[instrument(skip_all)]
async fn handle_analyze_pr(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzePrRequest>,
) -> Response {
    info!(
        repository = request.repo_url.as_str(),
        pull_request = request.pr_number,
        "Received analysis request"
    );

    let provider = match GitHubProvider::from_token(&request.github_token) {
        Ok(provider) => provider,
        Err(e) => {
            error!(
                repository = request.repo_url.as_str(),
                pull_request = request.pr_number,
                error = e.to_string(),
                "Failed to create the GitHub client for the request token"
            );
            return analysis_error_response(&AnalysisError::Source(e));
        }
    };

    let model = match OpenAiClient::new(state.model_config.clone()) {
        Ok(model) => model,
        Err(e) => {
            error!(
                error = e.to_string(),
                "Failed to create the model client"
            );
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create the model client".to_string(),
            );
        }
    };

    let warden = ReviewWarden::with_config(
        provider,
        model,
        Arc::clone(&state.pipeline),
        state.analysis_config.clone(),
    );

    match warden.analyze(&request.repo_url, request.pr_number).await {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(e) => {
            warn!(
                repository = request.repo_url.as_str(),
                pull_request = request.pr_number,
                error = e.to_string(),
                "Analysis request failed"
            );
            analysis_error_response(&e)
        }
    }
}

async fn handle_list_reviews(State(state): State<Arc<AppState>>) -> Json<Vec<ReviewSummary>> {
    Json(state.pipeline.reviews().list_summaries())
}

async fn handle_get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.pipeline.reviews().get(&id) {
        Some(review) => (StatusCode::OK, Json(review)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("No review with id {}", id),
        ),
    }
}

async fn handle_security_issues(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<TaggedSecurityIssue>> {
    Json(state.pipeline.reviews().security_issues())
}

async fn handle_metrics(State(state): State<Arc<AppState>>) -> Json<Vec<MetricsPoint>> {
    Json(state.pipeline.aggregates().series())
}

async fn handle_dashboard_stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    Json(state.pipeline.aggregates().snapshot())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(handle_root))
        .route("/api/analyze-pr", post(handle_analyze_pr))
        .route("/api/reviews", get(handle_list_reviews))
        .route("/api/reviews/{id}", get(handle_get_review))
        .route("/api/security-issues", get(handle_security_issues))
        .route("/api/metrics", get(handle_metrics))
        .route("/api/dashboard-stats", get(handle_dashboard_stats))
        .with_state(state)
}

fn get_server_config() -> Result<ServerConfig, ServerError> {
    let port_number = match env::var("REVIEW_WARDEN_PORT") {
        Ok(val) => val.parse().map_err(|_| {
            error!(input = val, "Failed to parse REVIEW_WARDEN_PORT");
            ServerError::ConfigError("REVIEW_WARDEN_PORT is not a number".to_string())
        })?,
        Err(_) => DEFAULT_PORT,
    };

    let api_key = env::var("MODEL_API_KEY").map_err(|e| {
        error!(
            error = e.to_string(),
            "Failed to get the model API key from the environment variables"
        );
        ServerError::ConfigError("MODEL_API_KEY is not set".to_string())
    })?;

    let mut model = OpenAiConfig {
        api_key,
        ..OpenAiConfig::default()
    };
    if let Ok(base_url) = env::var("MODEL_BASE_URL") {
        model.base_url = base_url;
    }
    if let Ok(name) = env::var("MODEL_NAME") {
        model.model = name;
    }

    Ok(ServerConfig { port_number, model })
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("REVIEW_WARDEN_LOG"))
        .init();

    info!("Starting Review Warden server");

    let config = get_server_config()?;

    let state = Arc::new(AppState {
        pipeline: Arc::new(PipelineState::in_memory()),
        model_config: config.model,
        analysis_config: AnalysisConfig::default(),
    });

    let addr = format!("0.0.0.0:{}", config.port_number);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr.clone())
        .await
        .map_err(|e| ServerError::StartupError(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::StartupError(e.to_string()))?;

    Ok(())
}
