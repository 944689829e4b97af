use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;

use review_warden_core::config::AnalysisConfig;
use review_warden_core::errors::AnalysisError;
use review_warden_core::store::StoreError;
use review_warden_core::PipelineState;
use review_warden_developer_platforms::errors::Error as SourceError;
use review_warden_model_clients::errors::Error as ModelError;
use review_warden_model_clients::openai::OpenAiConfig;

use super::{
    analysis_error_response, handle_analyze_pr, handle_dashboard_stats, handle_get_review,
    handle_list_reviews, handle_security_issues, AnalyzePrRequest, AppState,
};

fn test_state() -> Arc<AppState> {
    Arc::new(AppState {
        pipeline: Arc::new(PipelineState::in_memory()),
        model_config: OpenAiConfig::default(),
        analysis_config: AnalysisConfig::default(),
    })
}

#[test]
fn test_validation_error_maps_to_bad_request() {
    let response = analysis_error_response(&AnalysisError::Validation("bad input".to_string()));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_contention_maps_to_conflict() {
    let response = analysis_error_response(&AnalysisError::AlreadyAnalyzing {
        repository: "owner/repo".to_string(),
        pr_number: 7,
    });
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn test_source_errors_map_to_their_statuses() {
    let cases = [
        (
            AnalysisError::Source(SourceError::AuthFailed("bad token".to_string())),
            StatusCode::UNAUTHORIZED,
        ),
        (
            AnalysisError::Source(SourceError::NotFound("owner/repo#7".to_string())),
            StatusCode::NOT_FOUND,
        ),
        (
            AnalysisError::Source(SourceError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS,
        ),
        // A source failure is always the caller's to act on, so even the
        // variants without a dedicated status stay in the 4xx range.
        (
            AnalysisError::Source(SourceError::Transient("502 from upstream".to_string())),
            StatusCode::BAD_REQUEST,
        ),
        (
            AnalysisError::Source(SourceError::InvalidResponse),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (err, expected) in cases {
        assert_eq!(analysis_error_response(&err).status(), expected);
    }
}

#[test]
fn test_model_error_maps_to_bad_gateway() {
    let response = analysis_error_response(&AnalysisError::Model(ModelError::Timeout));
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn test_storage_error_maps_to_internal_server_error() {
    let response = analysis_error_response(&AnalysisError::Storage(StoreError::WriteFailed(
        "disk full".to_string(),
    )));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_get_review_unknown_id_returns_not_found() {
    let state = test_state();
    let response = handle_get_review(State(state), Path("no-such-id".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_reviews_starts_empty() {
    let state = test_state();
    let reviews = handle_list_reviews(State(state)).await;
    assert!(reviews.0.is_empty());
}

#[tokio::test]
async fn test_security_issues_start_empty() {
    let state = test_state();
    let issues = handle_security_issues(State(state)).await;
    assert!(issues.0.is_empty());
}

#[tokio::test]
async fn test_dashboard_stats_start_at_zero() {
    let state = test_state();
    let stats = handle_dashboard_stats(State(state)).await;
    assert_eq!(stats.0.total_prs_analyzed, 0);
    assert_eq!(stats.0.average_quality_score, 0.0);
}

#[tokio::test]
async fn test_analyze_pr_with_unparseable_repository_returns_bad_request() {
    let state = test_state();
    let request = AnalyzePrRequest {
        repo_url: "not a repository".to_string(),
        pr_number: 7,
        github_token: "ghp_test".to_string(),
    };

    // The repository fails validation before any network call is made.
    let response = handle_analyze_pr(State(state), axum::Json(request)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_get_server_config_requires_api_key() {
    std::env::remove_var("MODEL_API_KEY");
    std::env::remove_var("REVIEW_WARDEN_PORT");
    let result = super::get_server_config();
    assert!(result.is_err());
}
