//! Chat, message, and message payload types for askr.
//!
//! A chat belongs to one user and holds an ordered list of messages. Each
//! message carries a [`MessagePayload`], an explicit sum type discriminated
//! by its `role` tag, which is stored as JSON in the message store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::annotation::Annotation;

/// Title used when title generation fails or returns nothing.
pub const DEFAULT_CHAT_TITLE: &str = "New chat";

/// Maximum stored title length, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum chat identifier length (fits a hyphenated UUID).
pub const MAX_CHAT_ID_LEN: usize = 36;

/// Identifier of a chat.
///
/// Server-generated ids are UUIDv7 strings and therefore time-ordered;
/// clients may also supply their own id of 1-36 characters drawn from
/// `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatId(String);

impl ChatId {
    /// Generate a new time-ordered chat id.
    pub fn generate() -> Self {
        ChatId(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChatId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("chat id must not be empty".to_string());
        }
        if s.len() > MAX_CHAT_ID_LEN {
            return Err(format!(
                "chat id must be at most {MAX_CHAT_ID_LEN} characters"
            ));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!("invalid chat id: '{s}'"));
        }
        Ok(ChatId(s.to_string()))
    }
}

impl TryFrom<String> for ChatId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChatId> for String {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A persisted message row.
///
/// Messages are ordered by `(created_at, id)` within a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub chat_id: ChatId,
    pub payload: MessagePayload,
    pub created_at: DateTime<Utc>,
}

/// A chat together with its ordered message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub chat: Chat,
    pub messages: Vec<StoredMessage>,
}

/// Content of a single message, discriminated by `role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum MessagePayload {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        parts: Vec<AssistantPart>,
    },
    Tool {
        tool_call_id: String,
        tool_name: String,
        result: serde_json::Value,
    },
    /// A folded-in annotation.
    Data {
        annotation: Annotation,
    },
}

/// One part of an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssistantPart {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: serde_json::Value,
    },
}

impl MessagePayload {
    pub fn user(content: impl Into<String>) -> Self {
        MessagePayload::User {
            content: content.into(),
        }
    }

    /// Plain-text assistant message.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        MessagePayload::Assistant {
            parts: vec![AssistantPart::Text { text: text.into() }],
        }
    }

    pub fn data(annotation: Annotation) -> Self {
        MessagePayload::Data { annotation }
    }

    /// The `role` tag of this payload.
    pub fn role_name(&self) -> &'static str {
        match self {
            MessagePayload::System { .. } => "system",
            MessagePayload::User { .. } => "user",
            MessagePayload::Assistant { .. } => "assistant",
            MessagePayload::Tool { .. } => "tool",
            MessagePayload::Data { .. } => "data",
        }
    }

    /// Visible text of the message, if it has any.
    ///
    /// Assistant text parts are concatenated; reasoning parts are excluded.
    pub fn text(&self) -> Option<String> {
        match self {
            MessagePayload::System { content } | MessagePayload::User { content } => {
                Some(content.clone())
            }
            MessagePayload::Assistant { parts } => {
                let text: String = parts
                    .iter()
                    .filter_map(|p| match p {
                        AssistantPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if text.is_empty() { None } else { Some(text) }
            }
            MessagePayload::Tool { .. } | MessagePayload::Data { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RelatedQuestions;
    use serde_json::json;

    #[test]
    fn test_chat_id_accepts_uuid_and_short_ids() {
        assert!("c1".parse::<ChatId>().is_ok());
        assert!(ChatId::generate().as_str().len() == 36);
        let generated = ChatId::generate();
        assert_eq!(generated.as_str().parse::<ChatId>().unwrap(), generated);
    }

    #[test]
    fn test_chat_id_rejects_bad_input() {
        assert!("".parse::<ChatId>().is_err());
        assert!("a".repeat(37).parse::<ChatId>().is_err());
        assert!("../etc".parse::<ChatId>().is_err());
        assert!(serde_json::from_value::<ChatId>(json!("has space")).is_err());
    }

    #[test]
    fn test_generated_chat_ids_are_time_ordered() {
        let a = ChatId::generate();
        let b = ChatId::generate();
        assert!(a.as_str() < b.as_str());
    }

    #[test]
    fn test_user_payload_from_client_json() {
        // Clients send extra fields alongside role/content; they are ignored.
        let payload: MessagePayload = serde_json::from_value(json!({
            "id": "msg-1",
            "role": "user",
            "content": "What is the capital of France?",
            "createdAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(payload, MessagePayload::user("What is the capital of France?"));
    }

    #[test]
    fn test_assistant_payload_tagging() {
        let payload = MessagePayload::Assistant {
            parts: vec![
                AssistantPart::Reasoning { text: "think".into() },
                AssistantPart::Text { text: "Paris".into() },
            ],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["parts"][0]["type"], "reasoning");
        assert_eq!(value["parts"][1]["type"], "text");
        assert_eq!(payload.text().as_deref(), Some("Paris"));
    }

    #[test]
    fn test_data_payload_wraps_annotation() {
        let payload = MessagePayload::data(Annotation::RelatedQuestions(RelatedQuestions::default()));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["role"], "data");
        assert_eq!(value["annotation"]["type"], "related-questions");
        assert!(payload.text().is_none());
        assert_eq!(payload.role_name(), "data");
    }
}
