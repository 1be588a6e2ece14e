//! Conversation storage and lifecycle.
//!
//! A conversation is a titled, ordered list of message pairs persisted as a
//! single JSON document. [`ConversationManager`] is the only mutation path;
//! it owns a [`DocumentStore`] for persistence and a completion backend for
//! generating a title from the first exchange.

pub mod errors;
pub mod manager;
pub mod store;
pub mod title;
pub mod types;

pub use errors::{ConversationError, ConversationResult};
pub use manager::{ConversationManager, DeleteStatus};
pub use store::DocumentStore;
pub use title::FALLBACK_TITLE;
pub use types::{Conversation, ConversationId, ConversationSummary, MessagePair, UNTITLED_TITLE};
