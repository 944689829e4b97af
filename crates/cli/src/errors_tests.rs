use std::process::Termination;

use super::CliError;

#[test]
fn test_display_messages() {
    assert_eq!(
        CliError::ConfigError("MODEL_API_KEY is not set".to_string()).to_string(),
        "Configuration error: MODEL_API_KEY is not set"
    );
    assert_eq!(
        CliError::AuthError("no token".to_string()).to_string(),
        "Authentication error: no token"
    );
    assert_eq!(
        CliError::InvalidArguments("pull request number must be positive".to_string()).to_string(),
        "Invalid arguments: pull request number must be positive"
    );
    assert_eq!(
        CliError::AnalysisFailed("model timed out".to_string()).to_string(),
        "Analysis failed: model timed out"
    );
}

#[test]
fn test_exit_codes_are_distinct() {
    let codes = [
        CliError::AnalysisFailed(String::new()).report(),
        CliError::ConfigError(String::new()).report(),
        CliError::AuthError(String::new()).report(),
        CliError::InvalidArguments(String::new()).report(),
    ];

    // ExitCode has no accessor; formatting the debug output is enough to
    // show the four variants report differently.
    let rendered: Vec<String> = codes.iter().map(|c| format!("{:?}", c)).collect();
    for (i, a) in rendered.iter().enumerate() {
        for b in rendered.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}
