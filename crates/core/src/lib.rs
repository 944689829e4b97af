//! # Review Warden Core
//!
//! The analysis pipeline: accepts an analysis request for a GitHub pull
//! request, retrieves the changed files, drives the language model
//! interaction, validates the model's free-form output into a fixed
//! schema, and commits the result as an immutable [`models::Review`]
//! alongside incrementally maintained aggregate statistics.
//!
//! The two external capabilities — the diff source and the model — are
//! trait objects supplied by the caller, so the whole pipeline runs
//! against deterministic fakes in tests.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use review_warden_core::{PipelineState, ReviewWarden};
//! use review_warden_developer_platforms::github::GitHubProvider;
//! use review_warden_model_clients::openai::{OpenAiClient, OpenAiConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Shared across requests: run tokens, the review store, aggregates.
//! let state = Arc::new(PipelineState::in_memory());
//!
//! // Per request: a provider for the caller's GitHub token.
//! let diff_source = GitHubProvider::from_token("ghp_example")?;
//! let model = OpenAiClient::new(OpenAiConfig::default())?;
//!
//! let warden = ReviewWarden::new(diff_source, model, Arc::clone(&state));
//! let review = warden.analyze("octocat/hello-world", 42).await?;
//!
//! println!("overall score: {}", review.quality_metrics.overall_score);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use review_warden_developer_platforms::{
    models::{ChangedFile, PullRequestInfo},
    DiffSource,
};
use review_warden_model_clients::{errors::Error as ModelError, ModelClient};

pub mod aggregates;
use aggregates::AggregateStore;

pub mod config;
use config::AnalysisConfig;

pub mod errors;
use errors::AnalysisError;

pub mod models;
use models::{QualityMetrics, Review, SecurityIssue, Suggestion};

pub mod parser;
use parser::parse;

pub mod prompts;
use prompts::{build_chunks, PromptChunk};

pub mod repo_id;
use repo_id::RepoId;

pub mod run_tokens;
use run_tokens::RunTokenRegistry;

pub mod store;
use store::{InMemoryReviewRepository, ReviewRepository};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// The state shared by all analysis runs: the per-pull-request run tokens,
/// the review repository and the aggregate store.
///
/// A [`ReviewWarden`] is constructed per request (it carries the caller's
/// credential inside its diff source); all of them share one
/// `Arc<PipelineState>`.
pub struct PipelineState {
    run_tokens: RunTokenRegistry,
    reviews: Arc<dyn ReviewRepository>,
    aggregates: AggregateStore,
}

impl PipelineState {
    /// Creates pipeline state around an existing review repository.
    pub fn new(reviews: Arc<dyn ReviewRepository>) -> Self {
        Self {
            run_tokens: RunTokenRegistry::new(),
            reviews,
            aggregates: AggregateStore::new(),
        }
    }

    /// Creates pipeline state with an in-memory review repository.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryReviewRepository::new()))
    }

    /// The review repository.
    pub fn reviews(&self) -> &dyn ReviewRepository {
        self.reviews.as_ref()
    }

    /// The aggregate store.
    pub fn aggregates(&self) -> &AggregateStore {
        &self.aggregates
    }
}

/// The findings accumulated across the chunks of one analysis run.
#[derive(Default)]
struct RunAccumulator {
    suggestions: Vec<Suggestion>,
    security_issues: Vec<SecurityIssue>,
    complexity_sum: f64,
    maintainability_sum: f64,
    summaries: Vec<String>,
    discarded: usize,
    files_analyzed: usize,
    successful_chunks: usize,
    degraded: bool,
    last_model_error: Option<ModelError>,
}

/// Main struct for analyzing pull requests.
///
/// `ReviewWarden` composes the diff source, prompt construction, the model
/// client and the response parser into one analysis run, enforces
/// one-run-per-pull-request mutual exclusion, and produces a committed
/// [`Review`].
pub struct ReviewWarden<D: DiffSource, M: ModelClient> {
    diff_source: D,
    model: M,
    config: AnalysisConfig,
    state: Arc<PipelineState>,
}

impl<D: DiffSource, M: ModelClient> ReviewWarden<D, M> {
    /// Creates a warden with the default [`AnalysisConfig`].
    pub fn new(diff_source: D, model: M, state: Arc<PipelineState>) -> Self {
        Self::with_config(diff_source, model, state, AnalysisConfig::default())
    }

    /// Creates a warden with a custom configuration.
    pub fn with_config(
        diff_source: D,
        model: M,
        state: Arc<PipelineState>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            diff_source,
            model,
            config,
            state,
        }
    }

    /// Analyzes one pull request and commits the resulting review.
    ///
    /// # Arguments
    ///
    /// * `repository` - The repository as `owner/name` or a GitHub URL
    /// * `pr_number` - The pull request number, must be positive
    ///
    /// # Returns
    ///
    /// The committed review. The review may be marked degraded when some
    /// chunks or records were lost to recovered failures; the run only
    /// fails outright when validation fails, the diff source fails, every
    /// chunk's model call fails, or the commit itself fails.
    ///
    /// # Errors
    ///
    /// See [`AnalysisError`] for the failure taxonomy. In every case —
    /// including a storage failure after a successful analysis — the run
    /// token is released before this method returns.
    #[instrument(skip(self), fields(repository = repository, pull_request = pr_number))]
    pub async fn analyze(
        &self,
        repository: &str,
        pr_number: u64,
    ) -> Result<Review, AnalysisError> {
        let repo =
            RepoId::parse(repository).map_err(|e| AnalysisError::Validation(e.to_string()))?;
        if pr_number == 0 {
            return Err(AnalysisError::Validation(
                "Pull request number must be positive".to_string(),
            ));
        }

        // Scoped acquisition: the token is released when `_token` drops,
        // on every exit path below.
        let _token = self
            .state
            .run_tokens
            .try_acquire(&repo.full_name(), pr_number)
            .ok_or_else(|| AnalysisError::AlreadyAnalyzing {
                repository: repo.full_name(),
                pr_number,
            })?;

        info!(
            repository = repo.full_name().as_str(),
            pull_request = pr_number,
            "Starting pull request analysis",
        );

        let pr_info = self.fetch_pull_request(&repo, pr_number).await?;
        let mut files = self.fetch_changed_files(&repo, pr_number).await?;

        if files.is_empty() {
            return Err(AnalysisError::Validation(
                "Pull request has no reviewable changes".to_string(),
            ));
        }

        if files.len() > self.config.max_files {
            warn!(
                repository = repo.full_name().as_str(),
                pull_request = pr_number,
                total = files.len(),
                cap = self.config.max_files,
                "Pull request exceeds the file cap; analyzing the first files only",
            );
            files.truncate(self.config.max_files);
        }

        let chunks = build_chunks(&pr_info.title, &files, self.config.chunk_budget);
        let run = self.analyze_chunks(&repo, pr_number, &chunks).await;

        if run.successful_chunks == 0 {
            let reason = run.last_model_error.unwrap_or_else(|| {
                ModelError::MalformedResponse("no analyzable chunks".to_string())
            });
            return Err(AnalysisError::Model(reason));
        }

        let review = self.assemble_review(&repo, pr_number, pr_info.author, run);

        self.state.reviews.commit(review.clone())?;
        self.state.aggregates.record(&review);

        info!(
            repository = review.repository.as_str(),
            pull_request = pr_number,
            review_id = review.id.as_str(),
            suggestions = review.suggestions.len(),
            security_issues = review.security_issues.len(),
            overall_score = review.quality_metrics.overall_score,
            degraded = review.degraded,
            "Committed pull request review",
        );

        Ok(review)
    }

    /// Fetches the pull request metadata, retrying transient failures.
    async fn fetch_pull_request(
        &self,
        repo: &RepoId,
        pr_number: u64,
    ) -> Result<PullRequestInfo, AnalysisError> {
        let mut attempt = 0;
        loop {
            match self
                .diff_source
                .get_pull_request(repo.owner(), repo.name(), pr_number)
                .await
            {
                Ok(info) => return Ok(info),
                Err(e) if e.is_retryable() && attempt < self.config.source_retries => {
                    attempt += 1;
                    warn!(
                        repository = repo.full_name().as_str(),
                        pull_request = pr_number,
                        attempt,
                        error = e.to_string(),
                        "Transient failure fetching pull request; retrying",
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetches the changed files, retrying transient failures.
    async fn fetch_changed_files(
        &self,
        repo: &RepoId,
        pr_number: u64,
    ) -> Result<Vec<ChangedFile>, AnalysisError> {
        let mut attempt = 0;
        loop {
            match self
                .diff_source
                .get_changed_files(repo.owner(), repo.name(), pr_number)
                .await
            {
                Ok(files) => return Ok(files),
                Err(e) if e.is_retryable() && attempt < self.config.source_retries => {
                    attempt += 1;
                    warn!(
                        repository = repo.full_name().as_str(),
                        pull_request = pr_number,
                        attempt,
                        error = e.to_string(),
                        "Transient failure fetching changed files; retrying",
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Runs the model over every chunk and accumulates validated findings.
    ///
    /// A chunk whose model call still fails after the retry bound is
    /// dropped: its files do not count as analyzed and the run is marked
    /// degraded instead of aborting. Findings concatenate in chunk order,
    /// which is diff source file order.
    async fn analyze_chunks(
        &self,
        repo: &RepoId,
        pr_number: u64,
        chunks: &[PromptChunk],
    ) -> RunAccumulator {
        let mut run = RunAccumulator::default();

        for (index, chunk) in chunks.iter().enumerate() {
            match self.submit_with_retry(&chunk.prompt).await {
                Ok(raw_text) => {
                    let findings = parse(&raw_text, &chunk.paths);

                    debug!(
                        repository = repo.full_name().as_str(),
                        pull_request = pr_number,
                        chunk = index,
                        suggestions = findings.suggestions.len(),
                        security_issues = findings.security_issues.len(),
                        discarded = findings.discarded,
                        "Parsed model response for chunk",
                    );

                    run.suggestions.extend(findings.suggestions);
                    run.security_issues.extend(findings.security_issues);
                    run.complexity_sum += findings.metrics.complexity_score;
                    run.maintainability_sum += findings.metrics.maintainability_score;
                    if let Some(summary) = findings.summary {
                        run.summaries.push(summary);
                    }
                    run.discarded += findings.discarded;
                    run.files_analyzed += chunk.paths.len();
                    run.successful_chunks += 1;
                }
                Err(e) => {
                    warn!(
                        repository = repo.full_name().as_str(),
                        pull_request = pr_number,
                        chunk = index,
                        error = e.to_string(),
                        "Dropping chunk after exhausting model retries",
                    );
                    run.degraded = true;
                    run.last_model_error = Some(e);
                }
            }
        }

        run
    }

    /// Submits one prompt, retrying failed calls up to the configured
    /// bound with a fixed backoff.
    async fn submit_with_retry(&self, prompt: &str) -> Result<String, ModelError> {
        let mut attempt = 0;
        loop {
            match self.model.submit(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.config.model_retries => {
                    attempt += 1;
                    debug!(
                        attempt,
                        error = e.to_string(),
                        "Model call failed; retrying chunk",
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Assembles the immutable review from the accumulated findings.
    ///
    /// The overall score is computed here, deterministically, from the
    /// averaged component scores and the validated security issue count —
    /// never taken from the model.
    fn assemble_review(
        &self,
        repo: &RepoId,
        pr_number: u64,
        author: Option<String>,
        run: RunAccumulator,
    ) -> Review {
        let chunk_count = run.successful_chunks as f64;
        let quality_metrics = QualityMetrics::from_component_scores(
            run.complexity_sum / chunk_count,
            run.maintainability_sum / chunk_count,
            run.security_issues.len(),
        );

        let mut summary = format!(
            "Analyzed {} files. Found {} suggestions and {} security issues. Overall quality score: {:.1}/100.",
            run.files_analyzed,
            run.suggestions.len(),
            run.security_issues.len(),
            quality_metrics.overall_score,
        );
        if !run.summaries.is_empty() {
            summary.push(' ');
            summary.push_str(&run.summaries.join(" "));
        }

        Review {
            id: Uuid::new_v4().to_string(),
            repository: repo.full_name(),
            pr_number,
            author,
            summary,
            quality_metrics,
            suggestions: run.suggestions,
            security_issues: run.security_issues,
            files_analyzed: run.files_analyzed,
            degraded: run.degraded || run.discarded > 0,
            discarded_records: run.discarded,
            created_at: Utc::now(),
        }
    }
}
