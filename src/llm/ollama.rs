//! Completion backend speaking to an Ollama runtime through Rig.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, Message};
use rig::providers::ollama;

use super::backend::{CompletionBackend, CompletionInput, Exchange, LlmError};

/// Backend over a local or remote Ollama server.
pub struct OllamaBackend {
    client: ollama::Client<ReqwestClient>,
}

impl OllamaBackend {
    /// Build a backend, optionally pointed at a custom base URL.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: Option<&str>) -> Result<Self, LlmError> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(rig::client::Nothing);
        let builder = if let Some(base_url) = base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn complete(&self, input: CompletionInput) -> Result<String, LlmError> {
        let model = self.client.completion_model(input.model);
        let history = history_messages(input.history);

        let builder = model.completion_request(input.prompt);
        let builder = if let Some(preamble) = input.preamble {
            builder.preamble(preamble)
        } else {
            builder
        };
        let builder = if let Some(temperature) = input.temperature {
            builder.temperature(temperature)
        } else {
            builder
        };
        let request = builder
            .messages(history)
            .max_tokens_opt(input.max_tokens)
            .build();

        let response = model.completion(request).await?;
        Ok(extract_text(&response.choice))
    }
}

/// Flatten exchanges into alternating user and assistant turns, oldest first.
fn history_messages(history: Vec<Exchange>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() * 2);
    for exchange in history {
        messages.push(Message::user(exchange.user));
        messages.push(Message::assistant(exchange.assistant));
    }
    messages
}

/// Extract text from assistant response.
fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}
