//! Error types for the conversation subsystem.

use thiserror::Error;

use super::types::ConversationId;

/// Conversation subsystem error type.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// No document exists for the given identifier.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
    /// Message index outside the bounds of the stored sequence.
    #[error("message index {index} out of bounds for {len} messages")]
    InvalidIndex {
        /// Index requested by the caller.
        index: usize,
        /// Number of messages currently stored.
        len: usize,
    },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for conversation operations.
pub type ConversationResult<T> = Result<T, ConversationError>;
