//! Configuration for the analysis pipeline.

use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Tunable behaviour of a single analysis run.
///
/// # Examples
///
/// ```
/// use review_warden_core::config::AnalysisConfig;
///
/// let config = AnalysisConfig {
///     max_files: 5,
///     ..AnalysisConfig::default()
/// };
/// assert_eq!(config.model_retries, 2);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// The maximum number of changed files analyzed per review. Files
    /// beyond this cap are ignored; `files_analyzed` reflects the cap.
    pub max_files: usize,

    /// The approximate maximum number of characters of rendered diff
    /// sections per model prompt.
    pub chunk_budget: usize,

    /// How many times a failed model call is retried per chunk before the
    /// chunk is dropped.
    pub model_retries: u32,

    /// How many times a transient diff source failure is retried before
    /// the run is aborted.
    pub source_retries: u32,

    /// The pause between retries.
    pub retry_backoff: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_files: 25,
            chunk_budget: 12_000,
            model_retries: 2,
            source_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}
