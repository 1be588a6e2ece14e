//! Flat-file persistence: one JSON document per conversation.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use super::errors::ConversationResult;
use super::types::{Conversation, ConversationId};

/// File extension of persisted documents.
const DOCUMENT_EXTENSION: &str = "json";

/// Directory-backed store holding one JSON document per conversation.
///
/// The document is the unit of durability: every mutation rewrites the whole
/// file. There is no index and no cross-document state.
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, id: ConversationId) -> PathBuf {
        self.dir.join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    /// Write the whole document for a conversation.
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails.
    pub async fn save(&self, conversation: &Conversation) -> ConversationResult<()> {
        let payload = serde_json::to_vec_pretty(conversation)?;
        tokio::fs::write(self.document_path(conversation.id), payload).await?;
        Ok(())
    }

    /// Read the document for `id`, or `None` if no document exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self, id: ConversationId) -> ConversationResult<Option<Conversation>> {
        let bytes = match tokio::fs::read(self.document_path(id)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Remove the document for `id`; returns `false` if none existed.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub async fn delete(&self, id: ConversationId) -> ConversationResult<bool> {
        match tokio::fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Read every document in the store.
    ///
    /// A file that does not look like a conversation document, or that fails
    /// to read or parse, is skipped with a warning so a single bad file
    /// cannot take down the listing.
    ///
    /// # Errors
    /// Returns an error if the store directory itself cannot be scanned.
    pub async fn load_all(&self) -> ConversationResult<Vec<Conversation>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut conversations = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_document_path(&path) {
                continue;
            }
            match read_document(&path).await {
                Ok(conversation) => conversations.push(conversation),
                Err(err) => {
                    warn!("Skipping unreadable conversation document {}: {err}", path.display());
                }
            }
        }

        Ok(conversations)
    }
}

/// Whether `path` is named like a conversation document (`<uuid>.json`).
fn is_document_path(path: &Path) -> bool {
    let named_by_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| Uuid::parse_str(stem).is_ok());
    named_by_id && path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION)
}

async fn read_document(path: &Path) -> ConversationResult<Conversation> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
