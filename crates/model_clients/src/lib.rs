use async_trait::async_trait;

pub mod errors;

pub mod openai;

use errors::Error;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Trait for submitting prompts to a large language model.
///
/// The model is treated as an opaque capability: the pipeline hands over a
/// prompt and receives free-form text back. Keeping the boundary this
/// narrow means the response parser and the orchestrator can be tested with
/// deterministic fakes instead of a live model.
///
/// # Example Implementation
///
/// ```rust
/// use review_warden_model_clients::{ModelClient, errors::Error};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct CannedModel;
///
/// #[async_trait]
/// impl ModelClient for CannedModel {
///     async fn submit(&self, prompt: &str) -> Result<String, Error> {
///         # let _ = prompt;
///         Ok("{\"suggestions\": []}".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Submits a prompt to the model and returns its raw text response.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The full prompt text, including any instructions about
    ///   the expected response format
    ///
    /// # Returns
    ///
    /// A `Result` containing the model's raw, unvalidated text output
    async fn submit(&self, prompt: &str) -> Result<String, Error>;
}
