//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from askr-core. Message payloads are stored as
//! JSON text; timestamps as fixed-width RFC 3339 strings so that ordering by
//! the text column matches chronological order.

use askr_core::chat::repository::ChatRepository;
use askr_types::chat::{Chat, ChatId, MessagePayload, StoredMessage};
use askr_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed chat repository.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private row types for SQLite mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    id: String,
    title: String,
    user_id: String,
    created_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        let id: ChatId = self
            .id
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

        Ok(Chat {
            id,
            title: self.title,
            user_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    chat_id: String,
    payload: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<StoredMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let chat_id: ChatId = self
            .chat_id
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let payload: MessagePayload = serde_json::from_str(&self.payload)
            .map_err(|e| RepositoryError::Query(format!("invalid message payload: {e}")))?;

        Ok(StoredMessage {
            id,
            chat_id,
            payload,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn find_chat(&self, chat_id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(chat_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|row| {
            ChatRow::from_row(&row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_chat()
        })
        .transpose()
    }

    async fn get_chat(
        &self,
        chat_id: &ChatId,
        owner: &Uuid,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id.as_str())
            .bind(owner.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|row| {
            ChatRow::from_row(&row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_chat()
        })
        .transpose()
    }

    async fn get_messages(
        &self,
        chat_id: &ChatId,
        owner: &Uuid,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT m.* FROM messages m
               JOIN chats c ON c.id = m.chat_id
               WHERE m.chat_id = ? AND c.user_id = ?
               ORDER BY m.created_at ASC, m.id ASC"#,
        )
        .bind(chat_id.as_str())
        .bind(owner.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                MessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect()
    }

    async fn list_chats(&self, owner: &Uuid) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chats WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                ChatRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_chat()
            })
            .collect()
    }

    async fn delete_chat(&self, chat_id: &ChatId, owner: &Uuid) -> Result<(), RepositoryError> {
        // Messages go with the chat via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id.as_str())
            .bind(owner.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn save_turn(
        &self,
        chat: &Chat,
        messages: &[StoredMessage],
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let existing_owner: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM chats WHERE id = ?")
                .bind(chat.id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match existing_owner {
            Some(owner) if owner != chat.user_id.to_string() => {
                // Dropping the transaction rolls it back.
                return Err(RepositoryError::NotFound);
            }
            Some(_) => {}
            None => {
                sqlx::query(
                    "INSERT INTO chats (id, title, user_id, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(chat.id.as_str())
                .bind(&chat.title)
                .bind(chat.user_id.to_string())
                .bind(format_datetime(&chat.created_at))
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            }
        }

        for message in messages {
            let payload = serde_json::to_string(&message.payload)
                .map_err(|e| RepositoryError::Query(format!("failed to encode payload: {e}")))?;
            sqlx::query(
                "INSERT INTO messages (id, chat_id, payload, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(message.id.to_string())
            .bind(chat.id.as_str())
            .bind(payload)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
