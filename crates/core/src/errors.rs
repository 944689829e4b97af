use review_warden_developer_platforms::errors::Error as SourceError;
use review_warden_model_clients::errors::Error as ModelError;
use thiserror::Error;

use crate::store::StoreError;

/// Error types for the analysis pipeline.
///
/// The taxonomy mirrors how callers must react: validation failures and
/// lock contention are caller mistakes (4xx, never retried internally),
/// source and model failures carry their platform-specific reason
/// unchanged, and storage failures mean a successfully computed review was
/// lost and should be resubmitted.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The request was malformed: unparseable repository identifier,
    /// non-positive pull request number, or a pull request without
    /// reviewable changes.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An analysis for the same pull request is already in flight.
    ///
    /// Contenders are rejected rather than queued; callers may retry once
    /// the running analysis completes.
    #[error("An analysis for {repository}#{pr_number} is already in progress")]
    AlreadyAnalyzing {
        /// The repository in canonical `owner/name` form
        repository: String,
        /// The contended pull request number
        pr_number: u64,
    },

    /// The diff source failed; the platform-specific reason is preserved.
    #[error("Diff source error: {0}")]
    Source(#[from] SourceError),

    /// Every chunk's model call failed; the last model error is preserved.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The analysis succeeded but the review could not be stored.
    ///
    /// The computed result is lost; the caller must resubmit.
    #[error("Failed to store the completed review: {0}")]
    Storage(#[from] StoreError),
}
