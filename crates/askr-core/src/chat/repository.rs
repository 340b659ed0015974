//! ChatRepository trait definition.
//!
//! Chats, their ordered messages and owner-scoped access. Every read that
//! takes an owner filters by it in the query itself.

use askr_types::chat::{Chat, ChatId, StoredMessage};
use askr_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat and message persistence.
///
/// Implementations live in askr-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Look up a chat regardless of owner.
    fn find_chat(
        &self,
        chat_id: &ChatId,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Get a chat owned by `owner`.
    fn get_chat(
        &self,
        chat_id: &ChatId,
        owner: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Messages of a chat owned by `owner`, ordered by `(created_at, id)`.
    fn get_messages(
        &self,
        chat_id: &ChatId,
        owner: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Chats owned by `owner`, newest first.
    fn list_chats(
        &self,
        owner: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Delete a chat owned by `owner` together with its messages.
    ///
    /// Returns `RepositoryError::NotFound` if no such chat is owned by `owner`.
    fn delete_chat(
        &self,
        chat_id: &ChatId,
        owner: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist one turn in a single transaction.
    ///
    /// Creates `chat` if no chat with its id exists, then inserts `messages`.
    /// Fails with `RepositoryError::NotFound` (writing nothing) if the chat
    /// exists but belongs to a different user.
    fn save_turn(
        &self,
        chat: &Chat,
        messages: &[StoredMessage],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
