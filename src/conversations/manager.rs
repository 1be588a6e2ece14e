//! Conversation lifecycle: creation, reads, listing, appends, edits, deletes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::llm::CompletionBackend;

use super::errors::{ConversationError, ConversationResult};
use super::store::DocumentStore;
use super::title::{self, FALLBACK_TITLE};
use super::types::{Conversation, ConversationId, ConversationSummary, MessagePair};

/// Per-identifier outcome of a bulk delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    /// Document existed and was removed.
    Deleted,
    /// No document for this identifier.
    NotFound,
    /// Document exists but could not be removed.
    Failed,
}

/// Sole owner of conversation persistence and mutation policy.
///
/// Constructed once at startup with its storage and completion backend
/// injected, then shared by every request handler. Mutations are
/// read-modify-write cycles over the whole document with no inter-request
/// locking: concurrent writers to the same identifier race last-writer-wins.
pub struct ConversationManager {
    store: DocumentStore,
    backend: Arc<dyn CompletionBackend>,
}

impl ConversationManager {
    /// Build a manager over `store`, using `backend` for title generation.
    #[must_use]
    pub fn new(store: DocumentStore, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { store, backend }
    }

    /// Create an empty conversation and return its identifier.
    ///
    /// # Errors
    /// Returns an error if the document cannot be written.
    pub async fn create(&self) -> ConversationResult<ConversationId> {
        let conversation = Conversation::new();
        self.store.save(&conversation).await?;
        info!("Created new conversation: {}", conversation.id);
        Ok(conversation.id)
    }

    /// Fetch the full document for `id`. Side-effect-free.
    ///
    /// # Errors
    /// Returns [`ConversationError::NotFound`] if no document exists, or a
    /// storage error if the document cannot be read.
    pub async fn get(&self, id: ConversationId) -> ConversationResult<Conversation> {
        self.store
            .load(id)
            .await?
            .ok_or(ConversationError::NotFound(id))
    }

    /// List all conversations as `{id, title, created_at}` projections,
    /// newest first.
    ///
    /// # Errors
    /// Returns an error if the store directory cannot be scanned.
    pub async fn list(&self) -> ConversationResult<Vec<ConversationSummary>> {
        let mut summaries: Vec<ConversationSummary> = self
            .store
            .load_all()
            .await?
            .iter()
            .map(Conversation::summary)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Append one exchange to `id` and return the pair as persisted.
    ///
    /// The first appended pair also triggers title generation; a generation
    /// failure falls back to [`FALLBACK_TITLE`] and never aborts the append.
    /// The updated document is written as a whole, once.
    ///
    /// # Errors
    /// Returns [`ConversationError::NotFound`] if no document exists, or a
    /// storage error if the rewrite fails.
    pub async fn add_message(
        &self,
        id: ConversationId,
        user_message: &str,
        bot_response: &str,
        model: &str,
    ) -> ConversationResult<MessagePair> {
        let mut conversation = self.get(id).await?;

        let pair = MessagePair::new(user_message, bot_response, model);
        conversation.messages.push(pair.clone());

        if conversation.messages.len() == 1 {
            conversation.title = self
                .first_pair_title(user_message, bot_response, model)
                .await;
            debug!("Titled conversation {id}: {}", conversation.title);
        }

        self.store.save(&conversation).await?;
        Ok(pair)
    }

    /// Title for a conversation that just received its first pair.
    async fn first_pair_title(&self, user_message: &str, bot_response: &str, model: &str) -> String {
        match title::generate_title(self.backend.as_ref(), user_message, bot_response, model).await
        {
            Ok(generated) if !generated.is_empty() => generated,
            Ok(_) => {
                warn!("Title generation produced an empty title, using fallback");
                FALLBACK_TITLE.to_string()
            }
            Err(err) => {
                warn!("Title generation failed, using fallback: {err}");
                FALLBACK_TITLE.to_string()
            }
        }
    }

    /// Overwrite the text fields of the pair at `index`.
    ///
    /// Each provided non-empty field replaces the corresponding side of the
    /// pair; an absent or empty field leaves that side unchanged. The model
    /// and timestamp of the pair are never touched.
    ///
    /// # Errors
    /// Returns [`ConversationError::NotFound`] if no document exists, or
    /// [`ConversationError::InvalidIndex`] if `index` is out of bounds; in
    /// both cases nothing is written.
    pub async fn edit_message(
        &self,
        id: ConversationId,
        index: usize,
        new_user_message: Option<&str>,
        new_bot_response: Option<&str>,
    ) -> ConversationResult<()> {
        let mut conversation = self.get(id).await?;

        let len = conversation.messages.len();
        let Some(pair) = conversation.messages.get_mut(index) else {
            return Err(ConversationError::InvalidIndex { index, len });
        };

        if let Some(text) = new_user_message.filter(|text| !text.is_empty()) {
            pair.user_message = text.to_string();
        }
        if let Some(text) = new_bot_response.filter(|text| !text.is_empty()) {
            pair.bot_response = text.to_string();
        }

        self.store.save(&conversation).await
    }

    /// Delete the document for `id`.
    ///
    /// # Errors
    /// Returns [`ConversationError::NotFound`] if no document exists, or a
    /// storage error if the removal fails.
    pub async fn delete(&self, id: ConversationId) -> ConversationResult<()> {
        if self.store.delete(id).await? {
            info!("Deleted conversation: {id}");
            Ok(())
        } else {
            Err(ConversationError::NotFound(id))
        }
    }

    /// Delete every identifier in `ids`, each independently.
    ///
    /// A missing or failing identifier never aborts its siblings; the
    /// returned map carries one status per input identifier.
    pub async fn delete_many(
        &self,
        ids: &[ConversationId],
    ) -> BTreeMap<ConversationId, DeleteStatus> {
        let mut results = BTreeMap::new();
        for &id in ids {
            let status = match self.store.delete(id).await {
                Ok(true) => {
                    info!("Deleted conversation: {id}");
                    DeleteStatus::Deleted
                }
                Ok(false) => DeleteStatus::NotFound,
                Err(err) => {
                    warn!("Failed to delete conversation {id}: {err}");
                    DeleteStatus::Failed
                }
            };
            results.insert(id, status);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::conversations::types::UNTITLED_TITLE;
    use crate::llm::{CompletionInput, LlmError};

    use super::*;

    enum Script {
        Reply(String),
        Fail,
    }

    /// Completion backend that returns a scripted value and records inputs.
    struct ScriptedBackend {
        script: Script,
        calls: Mutex<Vec<CompletionInput>>,
    }

    impl ScriptedBackend {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                script: Script::Reply(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                script: Script::Fail,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().expect("lock calls").len()
        }
    }

    #[async_trait]
    impl crate::llm::CompletionBackend for ScriptedBackend {
        async fn complete(&self, input: CompletionInput) -> Result<String, LlmError> {
            self.calls.lock().expect("lock calls").push(input);
            match &self.script {
                Script::Reply(text) => Ok(text.clone()),
                Script::Fail => Err(LlmError::Completion(
                    rig::completion::CompletionError::ProviderError(
                        "scripted failure".to_string(),
                    ),
                )),
            }
        }
    }

    fn manager_in(dir: &TempDir, backend: Arc<ScriptedBackend>) -> ConversationManager {
        let store = DocumentStore::new(dir.path().join("data")).expect("create store");
        ConversationManager::new(store, backend)
    }

    #[tokio::test]
    async fn test_create_then_get_returns_empty_untitled_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        let id = manager.create().await.expect("create");
        let conversation = manager.get(id).await.expect("get");

        assert_eq!(conversation.id, id);
        assert_eq!(conversation.title, UNTITLED_TITLE);
        assert!(conversation.messages.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_conversation_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        let err = manager.get(ConversationId::new()).await.expect_err("get");
        assert!(matches!(err, ConversationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_first_append_replaces_the_sentinel_title_exactly_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = ScriptedBackend::replying("Weather Small Talk");
        let manager = manager_in(&dir, Arc::clone(&backend));

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "how is the weather", "sunny", "test-model")
            .await
            .expect("first append");

        let conversation = manager.get(id).await.expect("get");
        assert_eq!(conversation.title, "Weather Small Talk");

        manager
            .add_message(id, "and tomorrow", "rainy", "test-model")
            .await
            .expect("second append");

        let conversation = manager.get(id).await.expect("get again");
        assert_eq!(conversation.title, "Weather Small Talk");
        assert_eq!(conversation.messages.len(), 2);
        // Only the first append consults the model.
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_title_generation_receives_the_first_exchange() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = ScriptedBackend::replying("Trip Planning");
        let manager = manager_in(&dir, Arc::clone(&backend));

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "plan me a trip", "where to?", "test-model")
            .await
            .expect("append");

        let calls = backend.calls.lock().expect("lock calls");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "test-model");
        assert!(calls[0].history.is_empty());
        assert_eq!(calls[0].max_tokens, Some(24));
        assert!(calls[0].prompt.contains("plan me a trip"));
        assert!(calls[0].prompt.contains("where to?"));
    }

    #[tokio::test]
    async fn test_failed_title_generation_falls_back_and_keeps_the_append() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::failing());

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "hello", "hi", "test-model")
            .await
            .expect("append despite title failure");

        let conversation = manager.get(id).await.expect("get");
        assert_eq!(conversation.title, FALLBACK_TITLE);
        assert_eq!(conversation.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_generated_title_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Cleans down to an empty string.
        let manager = manager_in(&dir, ScriptedBackend::replying(" \"\" "));

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "hello", "hi", "test-model")
            .await
            .expect("append");

        let conversation = manager.get(id).await.expect("get");
        assert_eq!(conversation.title, FALLBACK_TITLE);
    }

    #[tokio::test]
    async fn test_append_to_missing_conversation_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = ScriptedBackend::replying("unused");
        let manager = manager_in(&dir, Arc::clone(&backend));

        let err = manager
            .add_message(ConversationId::new(), "hello", "hi", "test-model")
            .await
            .expect_err("append");

        assert!(matches!(err, ConversationError::NotFound(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_list_orders_by_creation_time_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        let a = manager.create().await.expect("create a");
        tokio::time::sleep(Duration::from_millis(5)).await;
        let b = manager.create().await.expect("create b");
        tokio::time::sleep(Duration::from_millis(5)).await;
        let c = manager.create().await.expect("create c");

        let listed: Vec<ConversationId> = manager
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|summary| summary.id)
            .collect();

        assert_eq!(listed, vec![c, b, a]);
    }

    #[tokio::test]
    async fn test_list_tolerates_an_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        assert!(manager.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_edit_rewrites_only_the_requested_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("Title"));

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "first question", "first answer", "model-a")
            .await
            .expect("append 1");
        manager
            .add_message(id, "second question", "second answer", "model-b")
            .await
            .expect("append 2");

        manager
            .edit_message(id, 0, None, Some("corrected answer"))
            .await
            .expect("edit");

        let conversation = manager.get(id).await.expect("get");
        assert_eq!(conversation.messages[0].user_message, "first question");
        assert_eq!(conversation.messages[0].bot_response, "corrected answer");
        assert_eq!(conversation.messages[0].model, "model-a");
        assert_eq!(conversation.messages[1].user_message, "second question");
        assert_eq!(conversation.messages[1].bot_response, "second answer");
    }

    #[tokio::test]
    async fn test_edit_out_of_bounds_fails_without_side_effects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("Title"));

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "question", "answer", "test-model")
            .await
            .expect("append");

        let err = manager
            .edit_message(id, 1, Some("changed"), None)
            .await
            .expect_err("edit past the end");
        assert!(matches!(
            err,
            ConversationError::InvalidIndex { index: 1, len: 1 }
        ));

        let conversation = manager.get(id).await.expect("get");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].user_message, "question");
        assert_eq!(conversation.messages[0].bot_response, "answer");
    }

    #[tokio::test]
    async fn test_edit_with_empty_fields_changes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("Title"));

        let id = manager.create().await.expect("create");
        manager
            .add_message(id, "question", "answer", "test-model")
            .await
            .expect("append");

        manager
            .edit_message(id, 0, Some(""), Some(""))
            .await
            .expect("edit with empty fields");

        let conversation = manager.get(id).await.expect("get");
        assert_eq!(conversation.messages[0].user_message, "question");
        assert_eq!(conversation.messages[0].bot_response, "answer");
    }

    #[tokio::test]
    async fn test_delete_removes_the_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        let id = manager.create().await.expect("create");
        manager.delete(id).await.expect("delete");

        let err = manager.get(id).await.expect_err("get after delete");
        assert!(matches!(err, ConversationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_conversation_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        let err = manager
            .delete(ConversationId::new())
            .await
            .expect_err("delete");
        assert!(matches!(err, ConversationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_many_isolates_results_per_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = manager_in(&dir, ScriptedBackend::replying("unused"));

        let first = manager.create().await.expect("create first");
        let second = manager.create().await.expect("create second");
        let untouched = manager.create().await.expect("create untouched");
        let missing = ConversationId::new();

        let results = manager.delete_many(&[first, second, missing]).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.get(&first), Some(&DeleteStatus::Deleted));
        assert_eq!(results.get(&second), Some(&DeleteStatus::Deleted));
        assert_eq!(results.get(&missing), Some(&DeleteStatus::NotFound));

        assert!(manager.get(first).await.is_err());
        assert!(manager.get(second).await.is_err());
        assert!(manager.get(untouched).await.is_ok());
    }
}
