//! Streaming chat endpoint.
//!
//! POST /api/chat
//!
//! Validates the request, resolves the model, then hands the turn to the
//! stream orchestrator and returns its data stream as the response body.
//! Frames are newline-terminated `CODE:JSON` lines (see
//! [`DataStreamPart`](askr_core::stream::data_stream::DataStreamPart)).

use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::field::Empty;

use askr_core::chat::repository::ChatRepository;
use askr_core::stream::data_stream::{DATA_STREAM_HEADER, DATA_STREAM_VERSION};
use askr_core::stream::orchestrator::ChatTurn;
use askr_observe::genai_attrs;
use askr_types::chat::ChatId;
use askr_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

/// Cookie holding the client's last selected model.
const SELECTED_MODEL_COOKIE: &str = "selected-model";

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The newest message, alone or as a one-element list.
    pub messages: IncomingMessages,
    pub id: String,
    /// Qualified model id (`provider:id`).
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub search: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessages {
    One(IncomingMessage),
    Many(Vec<IncomingMessage>),
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

impl IncomingMessages {
    /// Text of the user message being sent.
    fn into_user_text(self) -> Result<String, AppError> {
        let message = match self {
            IncomingMessages::One(message) => message,
            IncomingMessages::Many(mut messages) => messages
                .pop()
                .ok_or_else(|| AppError::Validation("messages must not be empty".to_string()))?,
        };
        if message.role != "user" {
            return Err(AppError::Validation(format!(
                "expected a user message, got role '{}'",
                message.role
            )));
        }
        if message.content.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }
        Ok(message.content)
    }
}

/// POST /api/chat - Stream one chat turn.
#[tracing::instrument(
    name = "chat_request",
    skip_all,
    fields(chat_id = Empty, gen_ai.request.model = Empty)
)]
pub async fn chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let chat_id: ChatId = request.id.parse().map_err(AppError::Validation)?;
    let span = tracing::Span::current();
    span.record("chat_id", chat_id.as_str());
    let message = request.messages.into_user_text()?;

    let selected = request.model.or_else(|| selected_model(&jar));
    let model = state
        .resolve_model(selected.as_deref())
        .ok_or_else(|| match &selected {
            Some(id) => AppError::Validation(format!("unknown or unavailable model '{id}'")),
            None => AppError::Validation("no model is available".to_string()),
        })?;
    span.record(genai_attrs::GEN_AI_REQUEST_MODEL, model.model_id());

    // Reject early when the chat id is taken by another user.
    if let Some(chat) = state.chat_service.repo().find_chat(&chat_id).await? {
        if chat.user_id != user.id {
            return Err(AppError::Chat(ChatError::NotFound));
        }
    }

    let body = state.orchestrator.start(ChatTurn {
        chat_id,
        user,
        message,
        model,
        search: request.search,
    });

    let body = Body::from_stream(body.map(|part| Ok::<_, Infallible>(part.encode())));
    Ok((
        [
            (CONTENT_TYPE.as_str(), "text/plain; charset=utf-8"),
            (DATA_STREAM_HEADER, DATA_STREAM_VERSION),
        ],
        body,
    )
        .into_response())
}

/// Model id from the selected-model cookie. The jar percent-decodes values.
fn selected_model(jar: &CookieJar) -> Option<String> {
    jar.get(SELECTED_MODEL_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_single_message_body() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":{"role":"user","content":"hi"},"id":"c1"}"#,
        )
        .unwrap();
        assert!(!request.search);
        assert_eq!(request.messages.into_user_text().unwrap(), "hi");
    }

    #[test]
    fn test_array_message_body_uses_last() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"first"},{"role":"user","content":"second"}],"id":"c1","search":true}"#,
        )
        .unwrap();
        assert!(request.search);
        assert_eq!(request.messages.into_user_text().unwrap(), "second");
    }

    #[test]
    fn test_rejects_non_user_and_empty_messages() {
        let assistant = IncomingMessages::One(IncomingMessage {
            role: "assistant".into(),
            content: "x".into(),
        });
        assert!(matches!(assistant.into_user_text(), Err(AppError::Validation(_))));
        assert!(matches!(
            IncomingMessages::Many(Vec::new()).into_user_text(),
            Err(AppError::Validation(_))
        ));
        let blank = IncomingMessages::One(IncomingMessage {
            role: "user".into(),
            content: "  ".into(),
        });
        assert!(matches!(blank.into_user_text(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_selected_model_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; selected-model=openai%3Agpt-4o-mini"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(selected_model(&jar).as_deref(), Some("openai:gpt-4o-mini"));
    }

    #[test]
    fn test_selected_model_cookie_missing_or_empty() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        assert_eq!(selected_model(&jar), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("selected-model="));
        assert_eq!(selected_model(&CookieJar::from_headers(&headers)), None);
    }

    #[test]
    fn test_selected_model_cookie_plain_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("selected-model=anthropic:claude"));
        assert_eq!(
            selected_model(&CookieJar::from_headers(&headers)).as_deref(),
            Some("anthropic:claude")
        );
    }
}
