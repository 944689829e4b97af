use async_trait::async_trait;
use octocrab::models::pulls::FileDiffStatus;
use octocrab::Octocrab;
use tracing::{debug, error, instrument};

use crate::{
    errors::Error,
    models::{ChangedFile, PullRequestInfo},
    DiffSource,
};

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;

/// Creates an `Octocrab` client authenticated with a personal access token.
///
/// Credentials are supplied per analysis request and used transiently, so
/// this is the only authentication path: there is no app installation flow.
///
/// # Arguments
///
/// * `token` - A GitHub personal access token with read access to the
///   repositories whose pull requests should be analyzed.
///
/// # Returns
///
/// A `Result` containing the authenticated `Octocrab` client, or an
/// `Error::AuthFailed` if the client could not be built.
#[instrument(skip(token))]
pub fn create_token_client(token: &str) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| Error::AuthFailed(format!("Failed to build the GitHub client: {}", e)))
}

/// Translates an octocrab failure into the boundary error taxonomy.
///
/// GitHub reports the interesting failure classes through HTTP status
/// codes, which must stay distinguishable for the pipeline: authentication
/// problems, missing resources and rate limiting each get their own
/// variant, everything else is treated as transient.
fn classify_octocrab_error(context: &str, e: octocrab::Error) -> Error {
    match e {
        octocrab::Error::GitHub { source, backtrace } => {
            let status = source.status_code.as_u16();
            error!(
                error_message = source.message,
                status_code = status,
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                context
            );
            match status {
                401 | 403 => Error::AuthFailed(source.message.clone()),
                404 => Error::NotFound(source.message.clone()),
                429 => Error::RateLimited,
                _ => Error::Transient(source.message.clone()),
            }
        }
        octocrab::Error::UriParse { source, backtrace } => {
            error!(
                error_message = source.to_string(),
                backtrace = backtrace.to_string(),
                "{}. Failed to parse URI.",
                context
            );
            Error::InvalidResponse
        }
        octocrab::Error::InvalidUtf8 { source, backtrace } => {
            error!(
                error_message = source.to_string(),
                backtrace = backtrace.to_string(),
                "{}. The message wasn't valid UTF-8.",
                context
            );
            Error::InvalidResponse
        }
        _ => {
            error!(
                error_message = e.to_string(),
                "{}. Received an unexpected error from GitHub",
                context
            );
            Error::Transient(e.to_string())
        }
    }
}

/// A [`DiffSource`] backed by the GitHub REST API.
///
/// The provider wraps an `Octocrab` client that was authenticated with a
/// per-request personal access token (see [`create_token_client`]).
#[derive(Debug)]
pub struct GitHubProvider {
    client: Octocrab,
}

impl GitHubProvider {
    /// Creates a provider around an existing `Octocrab` client.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates a provider directly from a personal access token.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthFailed` when the underlying client cannot be
    /// constructed from the token.
    pub fn from_token(token: &str) -> Result<Self, Error> {
        Ok(Self {
            client: create_token_client(token)?,
        })
    }
}

#[async_trait]
impl DiffSource for GitHubProvider {
    #[instrument(skip(self))]
    async fn get_pull_request(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequestInfo, Error> {
        let pr = self
            .client
            .pulls(repo_owner, repo_name)
            .get(pr_number)
            .await
            .map_err(|e| classify_octocrab_error("Failed to get pull request information", e))?;

        Ok(PullRequestInfo {
            title: pr.title.unwrap_or_default(),
            author: pr.user.map(|u| u.login),
        })
    }

    #[instrument(skip(self))]
    async fn get_changed_files(
        &self,
        repo_owner: &str,
        repo_name: &str,
        pr_number: u64,
    ) -> Result<Vec<ChangedFile>, Error> {
        let mut current_page = self
            .client
            .pulls(repo_owner, repo_name)
            .list_files(pr_number)
            .await
            .map_err(|e| classify_octocrab_error("Failed to list pull request files", e))?;

        let mut entries = current_page.take_items();
        while let Ok(Some(mut new_page)) = self.client.get_page(&current_page.next).await {
            entries.extend(new_page.take_items());

            current_page = new_page;
        }

        debug!(
            repository_owner = repo_owner,
            repository = repo_name,
            pull_request = pr_number,
            count = entries.len(),
            "Fetched changed files for pull request",
        );

        // Removed files have no reviewable content. Order is preserved as
        // GitHub returned it; the pipeline depends on that.
        let files = entries
            .into_iter()
            .filter(|entry| !matches!(entry.status, FileDiffStatus::Removed))
            .map(|entry| ChangedFile {
                path: entry.filename,
                patch: entry.patch.unwrap_or_default(),
                additions: entry.additions,
                deletions: entry.deletions,
            })
            .collect();

        Ok(files)
    }
}
