use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use review_warden_developer_platforms::errors::Error as SourceError;
use review_warden_developer_platforms::models::{ChangedFile, PullRequestInfo};
use review_warden_developer_platforms::DiffSource;
use review_warden_model_clients::errors::Error as ModelError;
use review_warden_model_clients::ModelClient;

use crate::config::AnalysisConfig;
use crate::errors::AnalysisError;
use crate::models::Review;
use crate::store::{ReviewRepository, StoreError};
use crate::{PipelineState, ReviewWarden};

fn changed_file(path: &str) -> ChangedFile {
    ChangedFile {
        path: path.to_string(),
        patch: "@@ -1,2 +1,2 @@\n-let x = 1;\n+let x = 2;".to_string(),
        additions: 1,
        deletions: 1,
    }
}

/// A well-formed model response: one suggestion and one security issue,
/// both referencing `path`, with component scores 80 and 70.
fn response_for(path: &str) -> String {
    format!(
        r#"```json
{{
  "suggestions": [
    {{
      "file_path": "{path}",
      "line_number": 3,
      "suggestion": "Extract the duplicated parsing into a helper",
      "category": "maintainability",
      "severity": "medium"
    }}
  ],
  "security_issues": [
    {{
      "file_path": "{path}",
      "line_number": 10,
      "issue_type": "hardcoded_secret",
      "description": "An API token is committed in the source",
      "severity": "high",
      "recommendation": "Load the token from configuration"
    }}
  ],
  "complexity_score": 80,
  "maintainability_score": 70,
  "overall_assessment": "Solid change with one secret to remove."
}}
```"#
    )
}

/// A diff source that serves a fixed pull request, optionally failing a
/// scripted number of times first.
struct MockDiffSource {
    title: String,
    files: Vec<ChangedFile>,
    failures: Mutex<VecDeque<SourceError>>,
}

impl MockDiffSource {
    fn with_files(files: Vec<ChangedFile>) -> Self {
        Self {
            title: "feat: add login".to_string(),
            files,
            failures: Mutex::new(VecDeque::new()),
        }
    }

    fn failing_then_succeeding(files: Vec<ChangedFile>, failures: Vec<SourceError>) -> Self {
        Self {
            title: "feat: add login".to_string(),
            files,
            failures: Mutex::new(failures.into()),
        }
    }
}

#[async_trait]
impl DiffSource for MockDiffSource {
    async fn get_pull_request(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
    ) -> Result<PullRequestInfo, SourceError> {
        Ok(PullRequestInfo {
            title: self.title.clone(),
            author: Some("developer123".to_string()),
        })
    }

    async fn get_changed_files(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
    ) -> Result<Vec<ChangedFile>, SourceError> {
        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }
        Ok(self.files.clone())
    }
}

/// A diff source that parks inside `get_changed_files` until released,
/// keeping the caller's run token held.
struct GatedDiffSource {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    files: Vec<ChangedFile>,
}

#[async_trait]
impl DiffSource for GatedDiffSource {
    async fn get_pull_request(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
    ) -> Result<PullRequestInfo, SourceError> {
        Ok(PullRequestInfo {
            title: "feat: add login".to_string(),
            author: None,
        })
    }

    async fn get_changed_files(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
    ) -> Result<Vec<ChangedFile>, SourceError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.files.clone())
    }
}

/// A model that replays scripted responses in order.
struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn submit(&self, _prompt: &str) -> Result<String, ModelError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::Timeout))
    }
}

/// A repository whose commit always fails.
struct BrokenRepository;

impl ReviewRepository for BrokenRepository {
    fn commit(&self, _review: Review) -> Result<(), StoreError> {
        Err(StoreError::WriteFailed("disk full".to_string()))
    }

    fn get(&self, _id: &str) -> Option<Review> {
        None
    }

    fn list_summaries(&self) -> Vec<crate::models::ReviewSummary> {
        Vec::new()
    }

    fn security_issues(&self) -> Vec<crate::models::TaggedSecurityIssue> {
        Vec::new()
    }
}

fn fast_config() -> AnalysisConfig {
    AnalysisConfig {
        retry_backoff: Duration::ZERO,
        ..AnalysisConfig::default()
    }
}

#[tokio::test]
async fn test_analyze_commits_review_and_updates_aggregates() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![changed_file("src/auth.rs")]);
    let model = ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]);

    let warden = ReviewWarden::with_config(source, model, Arc::clone(&state), fast_config());
    let review = warden.analyze("owner/repo", 7).await.unwrap();

    assert_eq!(review.repository, "owner/repo");
    assert_eq!(review.pr_number, 7);
    assert_eq!(review.author.as_deref(), Some("developer123"));
    assert_eq!(review.files_analyzed, 1);
    assert_eq!(review.suggestions.len(), 1);
    assert_eq!(review.security_issues.len(), 1);
    assert!(!review.degraded);
    assert_eq!(review.discarded_records, 0);

    // (80 + 70) / 2 minus one point for the single security issue.
    assert_eq!(review.quality_metrics.complexity_score, 80.0);
    assert_eq!(review.quality_metrics.maintainability_score, 70.0);
    assert_eq!(review.quality_metrics.overall_score, 74.0);

    assert!(review.summary.contains("1 suggestions"));
    assert!(review.summary.contains("Solid change"));

    let stored = state.reviews().get(&review.id).unwrap();
    assert_eq!(stored.id, review.id);

    let stats = state.aggregates().snapshot();
    assert_eq!(stats.total_prs_analyzed, 1);
    assert_eq!(stats.total_suggestions, 1);
    assert_eq!(stats.total_security_issues, 1);
    assert_eq!(stats.average_quality_score, 74.0);
}

#[tokio::test]
async fn test_unparseable_repository_is_rejected() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![changed_file("src/auth.rs")]);
    let model = ScriptedModel::new(vec![]);

    let warden = ReviewWarden::with_config(source, model, Arc::clone(&state), fast_config());
    let err = warden.analyze("not a repository", 7).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Validation(_)));
    assert!(state.reviews().list_summaries().is_empty());
}

#[tokio::test]
async fn test_zero_pull_request_number_is_rejected() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![changed_file("src/auth.rs")]);
    let model = ScriptedModel::new(vec![]);

    let warden = ReviewWarden::with_config(source, model, state, fast_config());
    let err = warden.analyze("owner/repo", 0).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Validation(_)));
}

#[tokio::test]
async fn test_pull_request_without_changes_is_rejected() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(Vec::new());
    let model = ScriptedModel::new(vec![]);

    let warden = ReviewWarden::with_config(source, model, Arc::clone(&state), fast_config());
    let err = warden.analyze("owner/repo", 7).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Validation(_)));
    assert!(state.reviews().list_summaries().is_empty());
    assert_eq!(state.aggregates().snapshot().total_prs_analyzed, 0);
}

#[tokio::test]
async fn test_transient_source_failures_are_retried() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::failing_then_succeeding(
        vec![changed_file("src/auth.rs")],
        vec![
            SourceError::Transient("502 from upstream".to_string()),
            SourceError::Transient("connection reset".to_string()),
        ],
    );
    let model = ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]);

    let warden = ReviewWarden::with_config(source, model, state, fast_config());
    let review = warden.analyze("owner/repo", 7).await.unwrap();

    assert_eq!(review.files_analyzed, 1);
}

#[tokio::test]
async fn test_non_retryable_source_failure_aborts() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::failing_then_succeeding(
        vec![changed_file("src/auth.rs")],
        vec![SourceError::NotFound("owner/repo#7".to_string())],
    );
    let model = ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]);

    let warden = ReviewWarden::with_config(source, model, Arc::clone(&state), fast_config());
    let err = warden.analyze("owner/repo", 7).await.unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::Source(SourceError::NotFound(_))
    ));
    assert!(state.reviews().list_summaries().is_empty());
}

#[tokio::test]
async fn test_all_chunks_failing_aborts_without_commit() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![changed_file("src/auth.rs")]);
    // One chunk, three attempts (initial + two retries), all timing out.
    let model = ScriptedModel::new(vec![
        Err(ModelError::Timeout),
        Err(ModelError::Timeout),
        Err(ModelError::Timeout),
    ]);

    let warden = ReviewWarden::with_config(source, model, Arc::clone(&state), fast_config());
    let err = warden.analyze("owner/repo", 7).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Model(ModelError::Timeout)));
    assert!(state.reviews().list_summaries().is_empty());
    assert_eq!(state.aggregates().snapshot().total_prs_analyzed, 0);
}

#[tokio::test]
async fn test_model_retry_within_a_chunk_recovers() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![changed_file("src/auth.rs")]);
    let model = ScriptedModel::new(vec![
        Err(ModelError::Http("503 Service Unavailable".to_string())),
        Ok(response_for("src/auth.rs")),
    ]);

    let warden = ReviewWarden::with_config(source, model, state, fast_config());
    let review = warden.analyze("owner/repo", 7).await.unwrap();

    // The chunk recovered within its retry bound, so nothing was lost.
    assert!(!review.degraded);
    assert_eq!(review.suggestions.len(), 1);
}

#[tokio::test]
async fn test_partial_chunk_failure_yields_degraded_review() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![
        changed_file("src/first.rs"),
        changed_file("src/second.rs"),
    ]);
    let model = ScriptedModel::new(vec![
        Ok(response_for("src/first.rs")),
        Err(ModelError::Timeout),
    ]);

    // A budget of 1 forces one file per chunk; no retries so the scripted
    // timeout sinks the second chunk outright.
    let config = AnalysisConfig {
        chunk_budget: 1,
        model_retries: 0,
        retry_backoff: Duration::ZERO,
        ..AnalysisConfig::default()
    };
    let warden = ReviewWarden::with_config(source, model, Arc::clone(&state), config);
    let review = warden.analyze("owner/repo", 7).await.unwrap();

    assert!(review.degraded);
    assert_eq!(review.files_analyzed, 1);
    assert_eq!(review.suggestions.len(), 1);
    assert_eq!(review.suggestions[0].file_path, "src/first.rs");

    // Metrics come from the one successful chunk.
    assert_eq!(review.quality_metrics.complexity_score, 80.0);
    assert_eq!(review.quality_metrics.maintainability_score, 70.0);

    // Degraded reviews still count toward the aggregates.
    assert_eq!(state.aggregates().snapshot().total_prs_analyzed, 1);
}

#[tokio::test]
async fn test_findings_for_unknown_files_are_discarded() {
    let state = Arc::new(PipelineState::in_memory());
    let source = MockDiffSource::with_files(vec![changed_file("src/auth.rs")]);
    let response = r#"{
        "suggestions": [
            {
                "file_path": "src/auth.rs",
                "suggestion": "Name the magic constant",
                "category": "best_practice",
                "severity": "low"
            },
            {
                "file_path": "src/not_in_the_diff.rs",
                "suggestion": "Hallucinated advice",
                "category": "performance",
                "severity": "high"
            }
        ],
        "complexity_score": 90,
        "maintainability_score": 90
    }"#;
    let model = ScriptedModel::new(vec![Ok(response.to_string())]);

    let warden = ReviewWarden::with_config(source, model, state, fast_config());
    let review = warden.analyze("owner/repo", 7).await.unwrap();

    assert_eq!(review.suggestions.len(), 1);
    assert_eq!(review.suggestions[0].file_path, "src/auth.rs");
    assert_eq!(review.discarded_records, 1);
    assert!(review.degraded);
}

#[tokio::test]
async fn test_file_cap_limits_analysis() {
    let state = Arc::new(PipelineState::in_memory());
    let files: Vec<ChangedFile> = (0..4)
        .map(|i| changed_file(&format!("src/file{}.rs", i)))
        .collect();
    let source = MockDiffSource::with_files(files);
    let model = ScriptedModel::new(vec![Ok(response_for("src/file0.rs"))]);

    let config = AnalysisConfig {
        max_files: 2,
        retry_backoff: Duration::ZERO,
        ..AnalysisConfig::default()
    };
    let warden = ReviewWarden::with_config(source, model, state, config);
    let review = warden.analyze("owner/repo", 7).await.unwrap();

    assert_eq!(review.files_analyzed, 2);
}

#[tokio::test]
async fn test_concurrent_analysis_of_same_pull_request_is_rejected() {
    let state = Arc::new(PipelineState::in_memory());
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let gated = GatedDiffSource {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
        files: vec![changed_file("src/auth.rs")],
    };
    let first_warden = ReviewWarden::with_config(
        gated,
        ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
        Arc::clone(&state),
        fast_config(),
    );
    let first = tokio::spawn(async move { first_warden.analyze("owner/repo", 7).await });

    // Wait until the first run is parked inside the diff source call, so
    // its run token is provably held.
    entered.notified().await;

    let contender = ReviewWarden::with_config(
        MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
        ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
        Arc::clone(&state),
        fast_config(),
    );
    let err = contender.analyze("owner/repo", 7).await.unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::AlreadyAnalyzing {
            pr_number: 7,
            ..
        }
    ));

    // A different pull request is not blocked by the held token.
    let other = contender.analyze("owner/repo", 8).await.unwrap();
    assert_eq!(other.pr_number, 8);

    release.notify_one();
    let review = first.await.unwrap().unwrap();
    assert_eq!(review.pr_number, 7);

    // With the first run finished, the key is free again.
    let again = ReviewWarden::with_config(
        MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
        ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
        Arc::clone(&state),
        fast_config(),
    );
    again.analyze("owner/repo", 7).await.unwrap();
}

#[tokio::test]
async fn test_run_token_is_released_after_a_failed_run() {
    let state = Arc::new(PipelineState::in_memory());

    let failing = ReviewWarden::with_config(
        MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
        ScriptedModel::new(vec![]),
        Arc::clone(&state),
        AnalysisConfig {
            model_retries: 0,
            retry_backoff: Duration::ZERO,
            ..AnalysisConfig::default()
        },
    );
    let err = failing.analyze("owner/repo", 7).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Model(_)));

    // The failed run must not leave its key stuck.
    let retry = ReviewWarden::with_config(
        MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
        ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
        Arc::clone(&state),
        fast_config(),
    );
    retry.analyze("owner/repo", 7).await.unwrap();
}

#[tokio::test]
async fn test_reanalysis_appends_a_new_review() {
    let state = Arc::new(PipelineState::in_memory());

    for _ in 0..2 {
        let warden = ReviewWarden::with_config(
            MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
            ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
            Arc::clone(&state),
            fast_config(),
        );
        warden.analyze("owner/repo", 7).await.unwrap();
    }

    let summaries = state.reviews().list_summaries();
    assert_eq!(summaries.len(), 2);
    assert_ne!(summaries[0].id, summaries[1].id);
    assert_eq!(state.aggregates().snapshot().total_prs_analyzed, 2);
}

#[tokio::test]
async fn test_storage_failure_surfaces_and_skips_aggregates() {
    let state = Arc::new(PipelineState::new(Arc::new(BrokenRepository)));
    let warden = ReviewWarden::with_config(
        MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
        ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
        Arc::clone(&state),
        fast_config(),
    );

    let err = warden.analyze("owner/repo", 7).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Storage(_)));
    assert_eq!(state.aggregates().snapshot().total_prs_analyzed, 0);
}

#[tokio::test]
async fn test_github_url_is_accepted_as_repository() {
    let state = Arc::new(PipelineState::in_memory());
    let warden = ReviewWarden::with_config(
        MockDiffSource::with_files(vec![changed_file("src/auth.rs")]),
        ScriptedModel::new(vec![Ok(response_for("src/auth.rs"))]),
        state,
        fast_config(),
    );

    let review = warden
        .analyze("https://github.com/owner/repo/pull/7", 7)
        .await
        .unwrap();
    assert_eq!(review.repository, "owner/repo");
}
