//! Canonicalization of repository identifiers.
//!
//! Analysis requests may name the repository as a bare `owner/name` pair or
//! as a GitHub URL. Everything downstream of request validation works with
//! the canonical [`RepoId`] form only.

use std::fmt;

#[cfg(test)]
#[path = "repo_id_tests.rs"]
mod tests;

/// The input could not be canonicalized into `owner/name` form.
#[derive(Debug, thiserror::Error)]
#[error("Invalid repository identifier '{input}': {reason}")]
pub struct RepoIdError {
    /// The rejected input
    pub input: String,

    /// Why it was rejected
    pub reason: String,
}

/// A repository identity in canonical `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Parses a repository identifier into canonical form.
    ///
    /// Accepted inputs:
    ///
    /// * bare `owner/name`
    /// * `https://github.com/owner/name` (also `http://`, with or without a
    ///   trailing `.git` suffix or extra path segments such as `/pull/7`)
    ///
    /// # Arguments
    ///
    /// * `input` - The repository identifier as supplied by the caller
    ///
    /// # Returns
    ///
    /// A `Result` containing the canonical `RepoId`, or a `RepoIdError`
    /// describing why the input was rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_warden_core::repo_id::RepoId;
    ///
    /// let id = RepoId::parse("https://github.com/octocat/hello-world.git").unwrap();
    /// assert_eq!(id.full_name(), "octocat/hello-world");
    ///
    /// assert!(RepoId::parse("not a repository").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, RepoIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RepoIdError {
                input: input.to_string(),
                reason: "identifier is empty".to_string(),
            });
        }

        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let is_url = without_scheme.starts_with("github.com/");
        let path = without_scheme
            .strip_prefix("github.com/")
            .unwrap_or(without_scheme);

        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();

        // A bare identifier must be exactly owner/name; a URL may carry
        // extra path segments (e.g. /pull/7) that are ignored.
        if parts.len() < 2 || (!is_url && parts.len() != 2) {
            return Err(RepoIdError {
                input: input.to_string(),
                reason: "expected 'owner/name' or a GitHub repository URL".to_string(),
            });
        }

        let owner = parts[0].to_string();
        let name = parts[1].trim_end_matches(".git").to_string();

        if name.is_empty() {
            return Err(RepoIdError {
                input: input.to_string(),
                reason: "repository name is empty".to_string(),
            });
        }

        for segment in [&owner, &name] {
            if segment.chars().any(char::is_whitespace) {
                return Err(RepoIdError {
                    input: input.to_string(),
                    reason: "identifier contains whitespace".to_string(),
                });
            }
        }

        Ok(Self { owner, name })
    }

    /// The repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical `owner/name` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
