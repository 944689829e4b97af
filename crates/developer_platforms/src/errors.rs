#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for developer platform operations.
///
/// This enum represents all possible errors that can occur when retrieving
/// pull request content from developer platforms like GitHub. The variants
/// deliberately keep authentication failures, missing resources and rate
/// limiting apart: the analysis pipeline surfaces them to callers unchanged
/// and they lead to different HTTP status codes and retry decisions.
///
/// # Examples
///
/// ```rust
/// use review_warden_developer_platforms::errors::Error;
///
/// let auth_error = Error::AuthFailed("Invalid token".to_string());
/// println!("{}", auth_error);
///
/// let rate_limit = Error::RateLimited;
/// assert_eq!(rate_limit.to_string(), "Rate limit exceeded");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Authentication failed with the platform.
    ///
    /// The provided credential is invalid, expired, or lacks the permissions
    /// needed to read the pull request. The string parameter contains
    /// additional details about the failure.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The repository or pull request does not exist.
    ///
    /// This also covers repositories the credential cannot see at all, since
    /// platforms typically report those as missing rather than forbidden.
    /// The string parameter names the resource that was requested.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Platform rate limit exceeded.
    ///
    /// The API rate limit for the platform has been exhausted. Callers
    /// should back off and retry after the rate limit window resets rather
    /// than retrying immediately.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// A transient platform-side failure.
    ///
    /// Network problems, 5xx responses and similar conditions where an
    /// immediate bounded retry is reasonable. The string parameter contains
    /// the underlying failure description.
    #[error("Transient platform error: {0}")]
    Transient(String),

    /// Invalid response format from the platform API.
    ///
    /// The response was received but was not in the expected shape, for
    /// example due to missing required fields or an API version change.
    #[error("Invalid response format")]
    InvalidResponse,
}

impl Error {
    /// Returns `true` when the failure is worth a bounded immediate retry.
    ///
    /// Only [`Error::Transient`] qualifies. Authentication failures and
    /// missing resources do not heal on retry, and rate limiting requires
    /// waiting for the limit window instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}
