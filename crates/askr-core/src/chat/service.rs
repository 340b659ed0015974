//! Chat retrieval and save actions.
//!
//! ChatService translates between stored rows and in-memory message lists,
//! enforces ownership, and generates a title when a chat is first saved.

use askr_types::chat::{Chat, ChatId, ChatWithMessages, MessagePayload, StoredMessage};
use askr_types::error::{ChatError, RepositoryError};
use askr_types::user::User;
use chrono::{Duration, SubsecRound, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::agent::title::title_or_default;
use crate::chat::repository::ChatRepository;
use crate::llm::registry::ResolvedModel;

/// Chat retrieval and persistence, generic over the repository.
pub struct ChatService<R: ChatRepository> {
    repo: R,
}

impl<R: ChatRepository> ChatService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the chat repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Get a chat and its ordered messages.
    ///
    /// Anonymous callers never see a chat. For signed-in callers the lookup
    /// is filtered by owner, so another user's chat reads as absent.
    pub async fn get_chat(
        &self,
        chat_id: &ChatId,
        caller: Option<&User>,
    ) -> Result<Option<ChatWithMessages>, ChatError> {
        let Some(user) = caller else {
            return Ok(None);
        };
        let Some(chat) = self.repo.get_chat(chat_id, &user.id).await? else {
            return Ok(None);
        };
        let messages = self.repo.get_messages(chat_id, &user.id).await?;
        Ok(Some(ChatWithMessages { chat, messages }))
    }

    /// The user's chats, newest first.
    pub async fn list_chats(&self, user: &User) -> Result<Vec<Chat>, ChatError> {
        Ok(self.repo.list_chats(&user.id).await?)
    }

    /// Delete a chat owned by the caller.
    pub async fn delete_chat(&self, chat_id: &ChatId, caller: Option<&User>) -> Result<(), ChatError> {
        let user = caller.ok_or(ChatError::Unauthenticated)?;
        match self.repo.delete_chat(chat_id, &user.id).await {
            Ok(()) => {
                info!(chat_id = %chat_id, user_id = %user.id, "chat deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(ChatError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Prior messages for a new turn in `chat_id`.
    ///
    /// A chat that does not exist yet has no history. A chat owned by
    /// someone else is `NotFound`.
    pub async fn load_history(&self, chat_id: &ChatId, user: &User) -> Result<Vec<StoredMessage>, ChatError> {
        match self.repo.find_chat(chat_id).await? {
            None => Ok(Vec::new()),
            Some(chat) if chat.user_id != user.id => Err(ChatError::NotFound),
            Some(_) => Ok(self.repo.get_messages(chat_id, &user.id).await?),
        }
    }

    /// Persist the messages of one turn.
    ///
    /// Creates the chat on first save, titling it from the first user
    /// message with `title_model`. Messages receive strictly increasing
    /// timestamps in the given order. All writes happen in one transaction.
    pub async fn save_turn(
        &self,
        chat_id: &ChatId,
        user: &User,
        payloads: Vec<MessagePayload>,
        title_model: &ResolvedModel,
    ) -> Result<Chat, ChatError> {
        let existing = self.repo.find_chat(chat_id).await?;
        let chat = match existing {
            Some(chat) if chat.user_id != user.id => return Err(ChatError::NotFound),
            Some(chat) => chat,
            None => {
                let first_message = payloads
                    .iter()
                    .find_map(|p| match p {
                        MessagePayload::User { content } => Some(content.as_str()),
                        _ => None,
                    })
                    .unwrap_or_default();
                let title = title_or_default(title_model, first_message).await;
                debug!(chat_id = %chat_id, title = %title, "creating chat");
                Chat {
                    id: chat_id.clone(),
                    title,
                    user_id: user.id,
                    created_at: Utc::now().trunc_subsecs(6),
                }
            }
        };

        let base = Utc::now().trunc_subsecs(6);
        let messages: Vec<StoredMessage> = payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| StoredMessage {
                id: Uuid::now_v7(),
                chat_id: chat_id.clone(),
                payload,
                created_at: base + Duration::microseconds(i as i64),
            })
            .collect();

        match self.repo.save_turn(&chat, &messages).await {
            Ok(()) => {
                info!(chat_id = %chat_id, messages = messages.len(), "turn saved");
                Ok(chat)
            }
            Err(RepositoryError::NotFound) => Err(ChatError::NotFound),
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "failed to save turn");
                Err(e.into())
            }
        }
    }
}
