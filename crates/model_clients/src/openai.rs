use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{errors::Error, ModelClient};

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for [`OpenAiClient`].
///
/// Any provider that speaks the OpenAI chat-completions protocol can be
/// targeted by pointing `base_url` at it.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub base_url: String,

    /// Model identifier sent in chat-completions requests.
    pub model: String,

    /// API key used for bearer authentication.
    pub api_key: String,

    /// HTTP timeout for a single completion request.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// A [`ModelClient`] backed by an OpenAI-compatible chat-completions
/// endpoint.
///
/// The client sends a fixed system message establishing the reviewer
/// persona plus the supplied prompt as the user message, and returns the
/// first choice's content verbatim.
#[derive(Debug)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

/// The system message sent with every completion request.
pub const SYSTEM_MESSAGE: &str = "You are an expert code reviewer with deep knowledge of \
software architecture, security best practices, and code quality. Analyze code \
comprehensively and provide specific, actionable suggestions - not generic ones.";

impl OpenAiClient {
    /// Creates a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: OpenAiConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build the HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn submit(&self, prompt: &str) -> Result<String, Error> {
        let endpoint = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::QuotaExceeded);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "Model endpoint returned {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::MalformedResponse("no choices in response".to_string()))?;

        debug!(
            model = self.config.model.as_str(),
            response_len = content.len(),
            "Received model completion",
        );

        Ok(content)
    }
}
