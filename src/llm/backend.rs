//! Boundary between the chat domain and the external completion service.

use async_trait::async_trait;
use thiserror::Error;

/// One prior exchange, expanded by backends into a user turn followed by an
/// assistant turn.
#[derive(Clone, Debug)]
pub struct Exchange {
    /// What the user said.
    pub user: String,
    /// What the model replied.
    pub assistant: String,
}

impl Exchange {
    /// Build an exchange from its two sides.
    #[must_use]
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Everything one completion call needs.
#[derive(Clone, Debug)]
pub struct CompletionInput {
    /// Completion model identifier.
    pub model: String,
    /// Optional system instruction sent ahead of all turns.
    pub preamble: Option<String>,
    /// Prior exchanges, oldest first.
    pub history: Vec<Exchange>,
    /// The new user message, sent as the final turn.
    pub prompt: String,
    /// Sampling temperature; `None` keeps the provider default.
    pub temperature: Option<f64>,
    /// Output length cap in tokens.
    pub max_tokens: Option<u64>,
}

/// Completion backend error type.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// Completion error.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
}

/// External completion service.
///
/// The production implementation is [`crate::llm::OllamaBackend`]; tests
/// substitute scripted values behind the same trait.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Submit one completion call and return the generated text.
    ///
    /// # Errors
    /// Returns an error if the service cannot be reached or refuses the call.
    async fn complete(&self, input: CompletionInput) -> Result<String, LlmError>;
}
