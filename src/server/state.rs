//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::conversations::{ConversationManager, DocumentStore};
use crate::llm::{CompletionBackend, OllamaBackend};

/// Shared application state.
pub struct AppState {
    /// Conversation lifecycle and persistence.
    pub manager: Arc<ConversationManager>,
    /// Chat turn orchestration.
    pub chat: ChatService,
    /// Model used when a request names none.
    pub default_model: String,
}

impl AppState {
    /// Create a new application state from validated configuration.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be created or the data
    /// directory cannot be prepared.
    pub fn new(config: &AppConfig) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let backend = OllamaBackend::new(config.llm.base_url.as_deref())
            .map_err(|e| format!("Failed to create Ollama client: {e}"))?;
        let backend: Arc<dyn CompletionBackend> = Arc::new(backend);

        let store = DocumentStore::new(&config.data_dir).map_err(|e| {
            format!(
                "Failed to prepare data directory {}: {e}",
                config.data_dir.display()
            )
        })?;

        let manager = Arc::new(ConversationManager::new(store, Arc::clone(&backend)));
        let chat = ChatService::new(Arc::clone(&manager), backend);

        Ok(Arc::new(Self {
            manager,
            chat,
            default_model: config.llm.model.clone(),
        }))
    }
}
