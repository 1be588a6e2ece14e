//! Mapping from domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::chat::ChatError;
use crate::conversations::ConversationError;

/// Error returned by API handlers.
///
/// Every variant renders as `{"error": "<message>"}` with the status code
/// the condition maps to.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The referenced conversation does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request is well-formed but invalid.
    #[error("{0}")]
    Validation(String),
    /// Storage or completion failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotFound(_) => Self::NotFound(err.to_string()),
            ConversationError::InvalidIndex { .. } => Self::Validation(err.to_string()),
            ConversationError::Serialization(_) | ConversationError::Io(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Conversation(inner) => inner.into(),
            ChatError::Llm(_) => Self::Internal(err.to_string()),
        }
    }
}
