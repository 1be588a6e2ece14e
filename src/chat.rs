//! Chat orchestration: one user message in, one persisted exchange out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::conversations::{ConversationError, ConversationId, ConversationManager, MessagePair};
use crate::llm::{CompletionBackend, CompletionInput, Exchange, LlmError};

/// System instruction sent ahead of every chat completion.
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Number of most recent message pairs replayed as context.
const HISTORY_WINDOW: usize = 5;

/// Output cap for chat completions, in tokens.
const CHAT_MAX_TOKENS: u64 = 3000;

/// Errors from a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Conversation lookup or persistence failed.
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    /// The completion backend failed.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Result of a successful chat turn.
#[derive(Clone, Debug)]
pub struct ChatOutcome {
    /// Generated reply text.
    pub response: String,
    /// Conversation the exchange was recorded in.
    pub conversation_id: ConversationId,
    /// Capture time of the persisted pair.
    pub timestamp: DateTime<Utc>,
}

/// Turns one incoming user message into one persisted exchange and one reply.
///
/// The service resolves the target conversation, creating one when the
/// caller names none or names one that no longer exists. A bounded window of
/// prior exchanges is replayed as context and the completed exchange is
/// recorded through the [`ConversationManager`]. A completion or persistence
/// failure aborts the turn with nothing appended.
pub struct ChatService {
    manager: Arc<ConversationManager>,
    backend: Arc<dyn CompletionBackend>,
}

impl ChatService {
    /// Build a service over a shared manager and completion backend.
    #[must_use]
    pub fn new(manager: Arc<ConversationManager>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { manager, backend }
    }

    /// Run one chat turn against `model`.
    ///
    /// # Errors
    /// Returns an error if conversation resolution hits a storage failure,
    /// if the completion backend fails, or if the exchange cannot be
    /// persisted.
    pub async fn chat(
        &self,
        message: &str,
        model: &str,
        conversation_id: Option<ConversationId>,
    ) -> Result<ChatOutcome, ChatError> {
        let (id, prior) = self.resolve(conversation_id).await?;

        let start = prior.len().saturating_sub(HISTORY_WINDOW);
        let history = prior[start..]
            .iter()
            .map(|pair| Exchange::new(pair.user_message.clone(), pair.bot_response.clone()))
            .collect();

        let input = CompletionInput {
            model: model.to_string(),
            preamble: Some(SYSTEM_PROMPT.to_string()),
            history,
            prompt: message.to_string(),
            temperature: None,
            max_tokens: Some(CHAT_MAX_TOKENS),
        };

        let reply = self.backend.complete(input).await?.trim().to_string();

        let pair = self.manager.add_message(id, message, &reply, model).await?;
        Ok(ChatOutcome {
            response: pair.bot_response,
            conversation_id: id,
            timestamp: pair.timestamp,
        })
    }

    /// Resolve the conversation a turn belongs to, with its prior messages.
    ///
    /// An absent identifier, or one with no document behind it, yields a
    /// fresh conversation. Any other lookup failure propagates rather than
    /// silently forking a new conversation.
    async fn resolve(
        &self,
        requested: Option<ConversationId>,
    ) -> Result<(ConversationId, Vec<MessagePair>), ChatError> {
        let Some(id) = requested else {
            return Ok((self.manager.create().await?, Vec::new()));
        };
        match self.manager.get(id).await {
            Ok(conversation) => Ok((id, conversation.messages)),
            Err(ConversationError::NotFound(_)) => {
                debug!("Requested conversation {id} not found, starting a new one");
                Ok((self.manager.create().await?, Vec::new()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
