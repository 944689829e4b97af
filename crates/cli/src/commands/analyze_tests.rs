use review_warden_core::errors::AnalysisError;
use review_warden_developer_platforms::errors::Error as SourceError;
use review_warden_model_clients::errors::Error as ModelError;

use super::{map_analysis_error, resolve_token};
use crate::errors::CliError;

#[test]
fn test_explicit_token_flag_wins() {
    let token = resolve_token(Some("ghp_from_flag".to_string())).unwrap();
    assert_eq!(token, "ghp_from_flag");
}

#[test]
fn test_missing_token_is_an_auth_error() {
    std::env::remove_var("GITHUB_TOKEN");
    let result = resolve_token(None);
    assert!(matches!(result, Err(CliError::AuthError(_))));
}

#[test]
fn test_validation_maps_to_invalid_arguments() {
    let err = map_analysis_error(AnalysisError::Validation("bad repo".to_string()));
    assert!(matches!(err, CliError::InvalidArguments(_)));
}

#[test]
fn test_source_auth_failure_maps_to_auth_error() {
    let err = map_analysis_error(AnalysisError::Source(SourceError::AuthFailed(
        "bad credentials".to_string(),
    )));
    assert!(matches!(err, CliError::AuthError(_)));
}

#[test]
fn test_model_failure_maps_to_analysis_failed() {
    let err = map_analysis_error(AnalysisError::Model(ModelError::Timeout));
    assert!(matches!(err, CliError::AnalysisFailed(_)));
}
