//! Chat history HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/chats       - List the caller's chats
//! - POST   /api/chats/new   - Allocate a fresh chat id
//! - GET    /api/chats/{id}  - Get a chat with its ordered messages
//! - DELETE /api/chats/{id}  - Delete a chat owned by the caller

use std::time::Instant;

use axum::extract::{Path, State};
use serde_json::json;

use askr_types::chat::{Chat, ChatId, ChatWithMessages};

use crate::http::error::AppError;
use crate::http::extractors::auth::{CurrentUser, MaybeUser};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Parse a chat id from a path parameter, returning a 400 error on invalid format.
fn parse_chat_id(s: &str) -> Result<ChatId, AppError> {
    s.parse::<ChatId>().map_err(AppError::Validation)
}

/// GET /api/chats - List the caller's chats, newest first.
pub async fn list_chats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<Chat>>, AppError> {
    let start = Instant::now();
    let chats = state.chat_service.list_chats(&user).await?;
    Ok(ApiResponse::success(chats, start).with_link("self", "/api/chats"))
}

/// POST /api/chats/new - Allocate a new chat id.
///
/// Nothing is stored until the first turn is saved.
pub async fn new_chat(CurrentUser(_user): CurrentUser) -> ApiResponse<serde_json::Value> {
    let start = Instant::now();
    let id = ChatId::generate();
    let href = format!("/api/chats/{id}");
    ApiResponse::success(json!({ "id": id }), start).with_link("chat", &href)
}

/// GET /api/chats/{id} - Chat and messages, 404 if absent or not owned.
pub async fn get_chat(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ChatWithMessages>, AppError> {
    let start = Instant::now();
    let chat_id = parse_chat_id(&id)?;

    let chat = state
        .chat_service
        .get_chat(&chat_id, user.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))?;

    let href = format!("/api/chats/{chat_id}");
    Ok(ApiResponse::success(chat, start).with_link("self", &href))
}

/// DELETE /api/chats/{id} - 401 when anonymous, 404 when not owned.
pub async fn delete_chat(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let start = Instant::now();
    let chat_id = parse_chat_id(&id)?;

    state.chat_service.delete_chat(&chat_id, user.as_ref()).await?;

    Ok(ApiResponse::success(json!({ "deleted": true, "id": chat_id }), start))
}
