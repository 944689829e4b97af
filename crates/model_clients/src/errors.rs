#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for model client operations.
///
/// This enum represents all possible errors that can occur when submitting
/// a prompt to a language model provider. The pipeline retries these per
/// chunk with a small bound; the variants stay distinguishable so callers
/// can report why a chunk was dropped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model did not respond within the configured timeout.
    #[error("Model request timed out")]
    Timeout,

    /// The provider rejected the request because a usage quota or rate
    /// limit was exhausted.
    #[error("Model quota exceeded")]
    QuotaExceeded,

    /// The response channel itself was malformed.
    ///
    /// The provider answered, but not with a usable completion: missing
    /// choices, empty message content, or a body that was not valid JSON.
    /// Note that this is about the transport envelope — a completion whose
    /// *text* is garbage is still a successful submission, and it is the
    /// response parser's job to cope with it.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Any other HTTP-level failure talking to the provider.
    #[error("Model request failed: {0}")]
    Http(String),
}
