//! HTTP route handlers for the conversation API.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversations::{Conversation, ConversationId, ConversationSummary, DeleteStatus};
use crate::llm::models::AVAILABLE_MODELS;

use super::errors::ApiError;
use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/{id}/messages/{index}", put(edit_message))
        .route("/api/conversations/delete", post(delete_conversations))
        .route("/api/chat", post(chat_completion))
        .route("/api/models", get(list_models))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "colloquy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Parse a caller-supplied identifier, mapping failure to a 400.
fn parse_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("invalid conversation id: {raw}")))
}

/// Response to conversation creation.
#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    /// Identifier of the new conversation.
    pub conversation_id: ConversationId,
}

/// Create an empty conversation.
async fn create_conversation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CreateConversationResponse>, ApiError> {
    let conversation_id = state.manager.create().await?;
    Ok(Json(CreateConversationResponse { conversation_id }))
}

/// List conversation summaries, newest first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(state.manager.list().await?))
}

/// Fetch one full conversation document.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.manager.get(id).await?))
}

/// Message edit request. An absent or empty field leaves that side of the
/// pair unchanged.
#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    /// Replacement user message.
    pub user_message: Option<String>,
    /// Replacement reply text.
    pub bot_response: Option<String>,
}

/// Overwrite one side of a recorded exchange.
async fn edit_message(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
    Json(request): Json<EditMessageRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .manager
        .edit_message(
            id,
            index,
            request.user_message.as_deref(),
            request.bot_response.as_deref(),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a single conversation.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.manager.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a batch of conversations named by a JSON array of identifiers.
///
/// Identifiers that are not well-formed are reported as `not_found` rather
/// than failing the batch.
async fn delete_conversations(
    State(state): State<Arc<AppState>>,
    Json(ids): Json<Vec<String>>,
) -> Json<BTreeMap<String, DeleteStatus>> {
    let mut results = BTreeMap::new();
    let mut parsed = Vec::new();
    for raw in ids {
        match raw.parse::<ConversationId>() {
            Ok(id) => parsed.push((raw, id)),
            Err(_) => {
                results.insert(raw, DeleteStatus::NotFound);
            }
        }
    }

    let targets: Vec<ConversationId> = parsed.iter().map(|(_, id)| *id).collect();
    let statuses = state.manager.delete_many(&targets).await;
    for (raw, id) in parsed {
        if let Some(status) = statuses.get(&id) {
            results.insert(raw, *status);
        }
    }
    Json(results)
}

/// Chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message; absent is treated as empty.
    #[serde(default)]
    pub message: String,
    /// Model identifier; the configured default when absent.
    pub model: Option<String>,
    /// Target conversation; a new one is created when absent or unknown.
    pub conversation_id: Option<String>,
}

/// Chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub response: String,
    /// Conversation the exchange was recorded in.
    pub conversation_id: ConversationId,
    /// Capture time of the exchange.
    pub timestamp: DateTime<Utc>,
}

/// Handle one chat turn.
async fn chat_completion(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.is_empty() {
        return Err(ApiError::Validation("message must not be empty".to_string()));
    }

    let model = request
        .model
        .filter(|model| !model.is_empty())
        .unwrap_or_else(|| state.default_model.clone());
    let conversation_id = request
        .conversation_id
        .as_deref()
        .and_then(|raw| raw.parse().ok());

    let outcome = state
        .chat
        .chat(&request.message, &model, conversation_id)
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        conversation_id: outcome.conversation_id,
        timestamp: outcome.timestamp,
    }))
}

/// List the static model catalog as `{identifier: display name}`.
async fn list_models() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(AVAILABLE_MODELS.iter().copied().collect())
}
