//! # Models
//!
//! This module contains the data models used at the diff source boundary.
//!
//! These models represent the slice of a pull request that the analysis
//! pipeline consumes: the pull request metadata and the set of changed
//! files with their unified diffs. They are designed to be serializable and
//! deserializable to facilitate integration with platform APIs.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Metadata for a pull request.
///
/// Only the fields the analysis pipeline reports on are carried; the rest
/// of the platform payload stays behind the boundary.
///
/// # Examples
///
/// ```
/// use review_warden_developer_platforms::models::PullRequestInfo;
///
/// let info = PullRequestInfo {
///     title: "feat(auth): add GitHub login".to_string(),
///     author: Some("developer123".to_string()),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// The title of the pull request
    pub title: String,

    /// The login of the user that opened the pull request, if known
    pub author: Option<String>,
}

/// A single file changed by a pull request.
///
/// # Fields
///
/// * `path` - The path of the file within the repository
/// * `patch` - The unified diff for the file; empty for binary files where
///   the platform provides no textual patch
/// * `additions` - The number of added lines
/// * `deletions` - The number of deleted lines
///
/// # Examples
///
/// ```
/// use review_warden_developer_platforms::models::ChangedFile;
///
/// let file = ChangedFile {
///     path: "src/auth.rs".to_string(),
///     patch: "@@ -1,3 +1,4 @@\n+use tracing::info;".to_string(),
///     additions: 1,
///     deletions: 0,
/// };
/// assert_eq!(file.total_lines_changed(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    /// The path of the file within the repository
    pub path: String,

    /// The unified diff for the file
    pub patch: String,

    /// The number of added lines
    pub additions: u64,

    /// The number of deleted lines
    pub deletions: u64,
}

impl ChangedFile {
    /// The total number of lines changed in the file (additions + deletions).
    pub fn total_lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }
}
