//! # Models
//!
//! This module contains the data model produced by the analysis pipeline.
//!
//! A committed [`Review`] is the unit of persistence: it owns its
//! suggestions, security issues and quality metrics exclusively, and it is
//! immutable once stored. Everything the dashboard shows is derived from
//! the set of committed reviews.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// The category of a code improvement suggestion.
///
/// This is a closed set; model output using any other category label is
/// rejected during parsing rather than coerced into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    /// Structural or design-level improvements
    Architecture,
    /// Changes that make the code run faster or use fewer resources
    Performance,
    /// Changes that make the code easier to change later
    Maintainability,
    /// Violations of accepted practice for the language or ecosystem
    BestPractice,
}

impl FromStr for SuggestionCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "architecture" => Ok(SuggestionCategory::Architecture),
            "performance" => Ok(SuggestionCategory::Performance),
            "maintainability" => Ok(SuggestionCategory::Maintainability),
            "best_practice" | "best-practice" | "best practice" => {
                Ok(SuggestionCategory::BestPractice)
            }
            _ => Err(()),
        }
    }
}

/// The severity of a code improvement suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSeverity {
    /// Nice to have
    Low,
    /// Worth fixing before merge
    Medium,
    /// Should block the merge
    High,
}

impl FromStr for SuggestionSeverity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(SuggestionSeverity::Low),
            "medium" => Ok(SuggestionSeverity::Medium),
            "high" => Ok(SuggestionSeverity::High),
            _ => Err(()),
        }
    }
}

/// The severity of a security issue.
///
/// A strictly larger set than [`SuggestionSeverity`]: security defects can
/// be categorically worse than style or design findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Low impact or hard to exploit
    Low,
    /// Exploitable under specific conditions
    Medium,
    /// Exploitable and impactful
    High,
    /// Actively dangerous; must not ship
    Critical,
}

impl FromStr for IssueSeverity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(IssueSeverity::Low),
            "medium" => Ok(IssueSeverity::Medium),
            "high" => Ok(IssueSeverity::High),
            "critical" => Ok(IssueSeverity::Critical),
            _ => Err(()),
        }
    }
}

/// A single code improvement suggestion within a review.
///
/// # Fields
///
/// * `file_path` - A path returned by the diff source for this review;
///   suggestions referencing unknown files never reach a committed review
/// * `line_number` - The line the suggestion refers to, if the model gave one
/// * `category` - One of the fixed [`SuggestionCategory`] values
/// * `severity` - How important the suggestion is
/// * `suggestion` - The suggestion text, never empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// The file the suggestion refers to
    pub file_path: String,

    /// The line the suggestion refers to, if known
    pub line_number: Option<u64>,

    /// The category of the suggestion
    pub category: SuggestionCategory,

    /// How important the suggestion is
    pub severity: SuggestionSeverity,

    /// The suggestion text
    pub suggestion: String,
}

/// A security issue found within a review.
///
/// An issue without a remediation is not actionable, so `recommendation` is
/// required to be non-empty; candidates without one are rejected during
/// parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityIssue {
    /// The file the issue was found in
    pub file_path: String,

    /// The line the issue refers to, if known
    pub line_number: Option<u64>,

    /// A short label for the kind of issue (e.g. "SQL injection")
    pub issue_type: String,

    /// How dangerous the issue is
    pub severity: IssueSeverity,

    /// A description of the issue
    pub description: String,

    /// How to fix the issue
    pub recommendation: String,
}

/// The quality scores of a review.
///
/// All three scores are real numbers in `[0, 100]`. The overall score is a
/// deterministic function of the component scores and the security issue
/// count — it is never taken from the model, which keeps reviews comparable
/// across runs even if the model's self-reported "overall" drifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// The computed overall quality score
    pub overall_score: f64,

    /// The model-reported complexity score, clamped to `[0, 100]`
    pub complexity_score: f64,

    /// The model-reported maintainability score, clamped to `[0, 100]`
    pub maintainability_score: f64,
}

/// The number of points deducted per security issue when computing the
/// overall score, capped at [`MAX_SECURITY_PENALTY`].
const SECURITY_PENALTY_PER_ISSUE: f64 = 1.0;

/// The largest overall-score deduction security issues can cause.
const MAX_SECURITY_PENALTY: f64 = 5.0;

/// Clamps a score into the valid `[0, 100]` range.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

impl QualityMetrics {
    /// Computes the metrics for a review from its component scores.
    ///
    /// The overall score is the midpoint of the complexity and
    /// maintainability scores, reduced by one point per security issue up
    /// to a cap of five, and clamped into `[0, 100]`. Component scores
    /// outside the valid range are clamped before use.
    ///
    /// # Arguments
    ///
    /// * `complexity_score` - The model-reported complexity score
    /// * `maintainability_score` - The model-reported maintainability score
    /// * `security_issue_count` - The number of validated security issues
    ///
    /// # Examples
    ///
    /// ```
    /// use review_warden_core::models::QualityMetrics;
    ///
    /// let metrics = QualityMetrics::from_component_scores(80.0, 60.0, 0);
    /// assert_eq!(metrics.overall_score, 70.0);
    ///
    /// let penalized = QualityMetrics::from_component_scores(80.0, 60.0, 12);
    /// assert_eq!(penalized.overall_score, 65.0);
    /// ```
    pub fn from_component_scores(
        complexity_score: f64,
        maintainability_score: f64,
        security_issue_count: usize,
    ) -> Self {
        let complexity = clamp_score(complexity_score);
        let maintainability = clamp_score(maintainability_score);

        let penalty =
            (security_issue_count as f64 * SECURITY_PENALTY_PER_ISSUE).min(MAX_SECURITY_PENALTY);
        let overall = clamp_score((complexity + maintainability) / 2.0 - penalty);

        Self {
            overall_score: overall,
            complexity_score: complexity,
            maintainability_score: maintainability,
        }
    }
}

/// A committed analysis of one pull request.
///
/// Reviews are immutable once committed: re-analyzing the same pull request
/// appends a new review with a new id, it never mutates a prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Opaque identifier, assigned at commit time
    pub id: String,

    /// The repository in canonical `owner/name` form
    pub repository: String,

    /// The pull request number
    pub pr_number: u64,

    /// The login of the user that opened the pull request, if known
    pub author: Option<String>,

    /// A short human readable summary of the analysis
    pub summary: String,

    /// The quality scores of the review
    pub quality_metrics: QualityMetrics,

    /// Code improvement suggestions, in diff source file order
    pub suggestions: Vec<Suggestion>,

    /// Security issues, in diff source file order
    pub security_issues: Vec<SecurityIssue>,

    /// The number of files whose analysis succeeded
    pub files_analyzed: usize,

    /// Whether some findings were lost to a partial, recovered failure
    pub degraded: bool,

    /// The number of model records that failed validation and were dropped
    pub discarded_records: usize,

    /// When the review was committed
    pub created_at: DateTime<Utc>,
}

/// A condensed view of a review for list endpoints.
///
/// The dashboard's review list doesn't need the finding bodies, only
/// enough to render a row and decide whether to fetch the full review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// The review id
    pub id: String,

    /// The repository in canonical `owner/name` form
    pub repository: String,

    /// The pull request number
    pub pr_number: u64,

    /// The login of the user that opened the pull request, if known
    pub author: Option<String>,

    /// The short summary line of the review
    pub summary: String,

    /// The computed overall quality score
    pub overall_score: f64,

    /// The number of suggestions in the review
    pub suggestion_count: usize,

    /// The number of security issues in the review
    pub security_issue_count: usize,

    /// Whether the review is missing findings due to a recovered failure
    pub degraded: bool,

    /// When the review was committed
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewSummary {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            repository: review.repository.clone(),
            pr_number: review.pr_number,
            author: review.author.clone(),
            summary: review.summary.clone(),
            overall_score: review.quality_metrics.overall_score,
            suggestion_count: review.suggestions.len(),
            security_issue_count: review.security_issues.len(),
            degraded: review.degraded,
            created_at: review.created_at,
        }
    }
}

/// A security issue tagged with the review that owns it.
///
/// Used by the flattened cross-review security listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedSecurityIssue {
    /// The repository the issue belongs to
    pub repository: String,

    /// The pull request the issue belongs to
    pub pr_number: u64,

    /// The issue itself
    #[serde(flatten)]
    pub issue: SecurityIssue,
}

/// Aggregate statistics across all committed reviews.
///
/// Maintained incrementally by the aggregate store, but always equal to the
/// value a full recomputation over the review set would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// The number of committed reviews
    pub total_prs_analyzed: u64,

    /// The total number of suggestions across all reviews
    pub total_suggestions: u64,

    /// The total number of security issues across all reviews
    pub total_security_issues: u64,

    /// The arithmetic mean of the overall scores; 0.0 with no reviews
    pub average_quality_score: f64,
}

/// One point of the quality trend series, one per committed review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsPoint {
    /// The id of the review the point belongs to
    pub pr_id: String,

    /// The repository the review belongs to
    pub repository: String,

    /// The computed overall quality score
    pub overall_score: f64,

    /// The model-reported complexity score
    pub complexity_score: f64,

    /// The model-reported maintainability score
    pub maintainability_score: f64,

    /// When the review was committed
    pub recorded_at: DateTime<Utc>,
}

impl From<&Review> for MetricsPoint {
    fn from(review: &Review) -> Self {
        Self {
            pr_id: review.id.clone(),
            repository: review.repository.clone(),
            overall_score: review.quality_metrics.overall_score,
            complexity_score: review.quality_metrics.complexity_score,
            maintainability_score: review.quality_metrics.maintainability_score,
            recorded_at: review.created_at,
        }
    }
}
