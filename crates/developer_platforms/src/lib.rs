use async_trait::async_trait;

pub mod errors;

pub mod github;

pub mod models;
use errors::Error;
use models::{ChangedFile, PullRequestInfo};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for retrieving pull request changes from developer platforms that
/// host them (e.g. GitHub, GitLab).
///
/// This is the boundary the analysis pipeline talks to when it needs the
/// content of a pull request. Implementations translate platform specific
/// wire formats and failures into the [`models`] types and the [`Error`]
/// taxonomy so that the pipeline never has to understand a platform API.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use review_warden_developer_platforms::{DiffSource, errors::Error, models::{ChangedFile, PullRequestInfo}};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct FixtureSource;
///
/// #[async_trait]
/// impl DiffSource for FixtureSource {
///     async fn get_pull_request(
///         &self,
///         repo_owner: &str,
///         repo_name: &str,
///         pr_number: u64,
///     ) -> Result<PullRequestInfo, Error> {
///         # let _ = (repo_owner, repo_name, pr_number);
///         Ok(PullRequestInfo {
///             title: "feat: add login".to_string(),
///             author: Some("developer123".to_string()),
///         })
///     }
///
///     async fn get_changed_files(
///         &self,
///         repo_owner: &str,
///         repo_name: &str,
///         pr_number: u64,
///     ) -> Result<Vec<ChangedFile>, Error> {
///         # let _ = (repo_owner, repo_name, pr_number);
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Retrieves the metadata of a pull request.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    ///
    /// # Returns
    ///
    /// A `Result` containing the pull request title and author
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequestInfo, Error>;

    /// Gets the list of files changed in a pull request.
    ///
    /// The returned files are ordered as the platform returns them. That
    /// order is load bearing: the analysis pipeline derives the order of its
    /// findings from it. Files that were removed by the pull request carry
    /// no reviewable content and are excluded.
    ///
    /// # Arguments
    ///
    /// * `repo_owner` - The owner of the repository
    /// * `repo_name` - The name of the repository
    /// * `pr_number` - The pull request number
    ///
    /// # Returns
    ///
    /// A `Result` containing a vector of changed files with their diffs
    async fn get_changed_files(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<ChangedFile>, Error>;
}
