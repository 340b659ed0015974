//! Completion handling for a streamed turn.
//!
//! After the model stream ends: generate related questions (unless skipped),
//! fold the annotations into the message list and persist the turn.
//!
//! A client disconnect at any point before the save commits leaves the turn
//! unpersisted. The related-question and save futures are raced against the
//! turn's cancellation token; a dropped save rolls its transaction back.

use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use askr_types::annotation::Annotation;
use askr_types::chat::{Chat, ChatId, MessagePayload};
use askr_types::error::ChatError;
use askr_types::llm::Message;
use askr_types::user::User;

use crate::agent::related::generate_related_questions;
use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::llm::convert::to_llm_messages;
use crate::llm::registry::ResolvedModel;
use crate::stream::data_stream::DataStreamWriter;

/// What the model produced for one turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub user_message: MessagePayload,
    pub response: Vec<MessagePayload>,
    pub annotations: Vec<Annotation>,
    pub skip_related_questions: bool,
}

/// Models used by the finish step.
pub struct FinishModels<'a> {
    pub related: &'a ResolvedModel,
    pub title: &'a ResolvedModel,
}

/// Order the messages of a turn for persistence.
///
/// `[user, ...response[..last], ...annotations, response[last]]`; with no
/// response messages the annotations follow the user message.
pub fn assemble_turn(
    user_message: MessagePayload,
    mut response: Vec<MessagePayload>,
    annotations: Vec<Annotation>,
) -> Vec<MessagePayload> {
    let last = response.pop();
    let mut messages = Vec::with_capacity(response.len() + annotations.len() + 2);
    messages.push(user_message);
    messages.extend(response);
    messages.extend(annotations.into_iter().map(MessagePayload::data));
    messages.extend(last);
    messages
}

/// Generate related questions, emit annotations and persist the turn.
///
/// Related-question failures are logged and skipped; persistence failures
/// are returned. Returns `ChatError::Cancelled` without persisting once
/// `cancel` fires.
#[instrument(name = "handle_stream_finish", skip_all, fields(chat_id = %chat_id))]
pub async fn handle_stream_finish<R: ChatRepository>(
    chats: &ChatService<R>,
    chat_id: &ChatId,
    user: &User,
    models: FinishModels<'_>,
    output: TurnOutput,
    writer: &DataStreamWriter,
    cancel: &CancellationToken,
) -> Result<Chat, ChatError> {
    let TurnOutput {
        user_message,
        response,
        mut annotations,
        skip_related_questions,
    } = output;

    if !skip_related_questions {
        writer.annotation(Annotation::related_questions_loading()).await?;

        let mut conversation: Vec<Message> = to_llm_messages(std::iter::once(&user_message).chain(response.iter()));
        if conversation.is_empty() {
            conversation.push(Message::user(user_message.text().unwrap_or_default()));
        }

        let generated = tokio::select! {
            result = generate_related_questions(models.related, conversation) => result,
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
        };
        match generated {
            Ok(related) => {
                let annotation = Annotation::RelatedQuestions(related);
                writer.annotation(annotation.clone()).await?;
                annotations.push(annotation);
            }
            Err(e) => {
                warn!(error = %e, "related question generation failed, skipping");
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(ChatError::Cancelled);
    }

    let messages = assemble_turn(user_message, response, annotations);
    tokio::select! {
        biased;
        result = chats.save_turn(chat_id, user, messages, models.title) => result,
        _ = cancel.cancelled() => Err(ChatError::Cancelled),
    }
}
