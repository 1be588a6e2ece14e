//! Completion-service integration.
//!
//! `backend` defines the boundary to the external completion service,
//! `ollama` implements it with Rig's Ollama provider, and `models` holds the
//! static catalog offered to clients.

pub mod backend;
pub mod models;
pub mod ollama;

pub use backend::{CompletionBackend, CompletionInput, Exchange, LlmError};
pub use ollama::OllamaBackend;
