//! Stream orchestration for a chat turn.
//!
//! One task per turn: load history, optionally run the search step, stream
//! the model's answer as data stream frames while interleaving annotations,
//! then hand off to the finish step for related questions and persistence.

use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use askr_types::annotation::{Annotation, ReasoningTiming};
use askr_types::chat::{AssistantPart, ChatId, MessagePayload};
use askr_types::error::ChatError;
use askr_types::llm::{CompletionRequest, Message, StopReason, StreamEvent, Usage};
use askr_types::user::User;

use crate::agent::prompt::researcher_prompt;
use crate::agent::tool_call::execute_search_step;
use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::llm::context_window::truncate_messages;
use crate::llm::convert::to_llm_messages;
use crate::llm::registry::ResolvedModel;
use crate::stream::data_stream::{self, DataStream, DataStreamPart, DataStreamWriter};
use crate::stream::finish::{FinishModels, TurnOutput, handle_stream_finish};
use crate::stream::reasoning::{ChunkKind, ReasoningTimer};
use crate::tool::search::BoxSearchProvider;

/// Thinking budget requested from providers that need an explicit opt-in.
const REASONING_BUDGET_TOKENS: u32 = 2048;

/// One user turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub chat_id: ChatId,
    pub user: User,
    pub message: String,
    pub model: ResolvedModel,
    pub search: bool,
}

/// Settings shared by every turn.
#[derive(Clone)]
pub struct TurnSettings {
    pub max_response_tokens: u32,
    pub search_max_results: u32,
    pub stream_buffer: usize,
    /// Model for titles; the turn's model when `None`.
    pub title_model: Option<ResolvedModel>,
    /// Model for related questions; the turn's model when `None`.
    pub related_model: Option<ResolvedModel>,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            max_response_tokens: 4096,
            search_max_results: 5,
            stream_buffer: 64,
            title_model: None,
            related_model: None,
        }
    }
}

/// Runs chat turns against a chat store, a model and an optional search tool.
pub struct StreamOrchestrator<R: ChatRepository> {
    chats: Arc<ChatService<R>>,
    search: Option<Arc<BoxSearchProvider>>,
    settings: TurnSettings,
}

impl<R: ChatRepository + 'static> StreamOrchestrator<R> {
    pub fn new(
        chats: Arc<ChatService<R>>,
        search: Option<Arc<BoxSearchProvider>>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            chats,
            search,
            settings,
        }
    }

    /// Spawn the turn task and return the response body stream.
    ///
    /// Dropping the returned stream cancels the turn; a cancelled turn is not
    /// persisted. Errors end the stream with an error frame.
    pub fn start(self: &Arc<Self>, turn: ChatTurn) -> DataStream {
        let cancel = CancellationToken::new();
        let (writer, body) = data_stream::channel(self.settings.stream_buffer, cancel.clone());
        let this = Arc::clone(self);

        let span = info_span!(
            "chat_turn",
            chat_id = %turn.chat_id,
            user_id = %turn.user.id,
            gen_ai.system = turn.model.provider.name(),
            gen_ai.request.model = %turn.model.model_id(),
            search = turn.search,
        );

        tokio::spawn(
            async move {
                match this.run(turn, &writer, &cancel).await {
                    Ok(()) => {}
                    Err(ChatError::Cancelled) => info!("turn cancelled by client, not persisted"),
                    Err(e) => {
                        error!(error = %e, "chat turn failed");
                        let _ = writer.error(e.to_string()).await;
                    }
                }
            }
            .instrument(span),
        );

        body
    }

    /// Execute one turn, writing frames to `writer`.
    pub async fn run(
        &self,
        turn: ChatTurn,
        writer: &DataStreamWriter,
        cancel: &CancellationToken,
    ) -> Result<(), ChatError> {
        let ChatTurn {
            chat_id,
            user,
            message,
            model,
            search,
        } = turn;

        if message.trim().is_empty() {
            return Err(ChatError::Invalid("message must not be empty".to_string()));
        }

        let prior = self.chats.load_history(&chat_id, &user).await?;
        let mut history = to_llm_messages(prior.iter().map(|m| &m.payload));
        history.push(Message::user(message.clone()));
        let mut history = truncate_messages(history, model.config.max_allowed_tokens());
        debug!(prior = prior.len(), sent = history.len(), "history prepared");

        let mut response: Vec<MessagePayload> = Vec::new();
        let mut annotations: Vec<Annotation> = Vec::new();

        let searched = match (search, &self.search) {
            (true, Some(search_tool)) => {
                let outcome = execute_search_step(
                    &model.tool_call_model(),
                    search_tool,
                    &history,
                    self.settings.search_max_results,
                    writer,
                )
                .await?;
                history.extend(outcome.context);
                response.extend(outcome.messages);
                annotations.push(outcome.annotation);
                true
            }
            (true, None) => {
                debug!("search requested but no search backend is configured");
                false
            }
            (false, _) => false,
        };

        let request = CompletionRequest {
            model: model.model_id().to_string(),
            messages: history,
            system: Some(researcher_prompt(Utc::now(), searched)),
            max_tokens: self.settings.max_response_tokens,
            temperature: None,
            stream: true,
            stop_sequences: None,
            thinking_budget: model.config.reasoning.then_some(REASONING_BUDGET_TOKENS),
        };

        let message_id = format!("msg-{}", Uuid::now_v7().simple());
        writer
            .write(DataStreamPart::StartStep { message_id })
            .await?;

        let mut events = model.provider.stream(request);
        let mut timer = ReasoningTimer::new();
        let mut text = String::new();
        let mut reasoning = String::new();
        let mut stop_reason = StopReason::EndTurn;
        let mut usage = Usage::default();

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                event = events.next() => event,
            };
            let Some(event) = event else { break };

            match event? {
                StreamEvent::Connected => {}
                StreamEvent::ThinkingDelta { thinking } => {
                    timer.observe(ChunkKind::Reasoning);
                    reasoning.push_str(&thinking);
                    writer.reasoning(thinking).await?;
                }
                StreamEvent::TextDelta { text: delta } => {
                    if let Some(timing) = timer.observe(ChunkKind::Text) {
                        writer.annotation(timing).await?;
                    }
                    text.push_str(&delta);
                    writer.text(delta).await?;
                }
                StreamEvent::MessageDelta { stop_reason: reason } => {
                    if let Some(timing) = timer.observe(ChunkKind::Other) {
                        writer.annotation(timing).await?;
                    }
                    stop_reason = reason;
                }
                StreamEvent::Usage(u) => {
                    if u.input_tokens > 0 {
                        usage.input_tokens = u.input_tokens;
                    }
                    if u.output_tokens > 0 {
                        usage.output_tokens = u.output_tokens;
                    }
                }
                StreamEvent::Done => break,
            }
        }
        drop(events);

        if let Some(timing) = timer.finish() {
            writer.annotation(timing).await?;
        }

        let finish_reason = stop_reason.as_finish_reason().to_string();
        writer
            .write(DataStreamPart::FinishStep {
                finish_reason: finish_reason.clone(),
                usage: usage.clone(),
            })
            .await?;
        info!(
            gen_ai.usage.input_tokens = usage.input_tokens,
            gen_ai.usage.output_tokens = usage.output_tokens,
            gen_ai.response.finish_reasons = %finish_reason,
            "model stream finished"
        );

        let mut parts = Vec::new();
        if !reasoning.is_empty() {
            let time_ms = timer
                .last_duration()
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default();
            annotations.push(Annotation::ReasoningTiming(ReasoningTiming {
                time_ms,
                reasoning: Some(reasoning.clone()),
            }));
            parts.push(AssistantPart::Reasoning { text: reasoning });
        }
        if !text.is_empty() {
            parts.push(AssistantPart::Text { text });
        }
        if !parts.is_empty() {
            response.push(MessagePayload::Assistant { parts });
        }

        if cancel.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let related = self.settings.related_model.as_ref().unwrap_or(&model);
        let title = self.settings.title_model.as_ref().unwrap_or(&model);
        let output = TurnOutput {
            user_message: MessagePayload::user(message),
            response,
            annotations,
            skip_related_questions: model.config.reasoning,
        };

        handle_stream_finish(
            &self.chats,
            &chat_id,
            &user,
            FinishModels { related, title },
            output,
            writer,
            cancel,
        )
        .await?;

        writer
            .write(DataStreamPart::FinishMessage {
                finish_reason,
                usage,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askr_types::annotation::ToolCallState;
    use askr_types::llm::LlmError;
    use crate::testing::{
        InMemoryChatRepository, ScriptedProvider, StaticSearch, resolved, test_user, text_stream,
    };
    use std::time::Duration;

    fn orchestrator(
        repo: &InMemoryChatRepository,
        search: Option<StaticSearch>,
        settings: TurnSettings,
    ) -> Arc<StreamOrchestrator<InMemoryChatRepository>> {
        Arc::new(StreamOrchestrator::new(
            Arc::new(ChatService::new(repo.clone())),
            search.map(|s| Arc::new(BoxSearchProvider::new(s))),
            settings,
        ))
    }

    fn turn(user: &User, model: ResolvedModel, message: &str, search: bool) -> ChatTurn {
        ChatTurn {
            chat_id: "c1".parse().unwrap(),
            user: user.clone(),
            message: message.to_string(),
            model,
            search,
        }
    }

    fn codes(parts: &[DataStreamPart]) -> String {
        parts.iter().map(|p| p.code()).collect()
    }

    #[tokio::test]
    async fn test_first_message_to_new_chat() {
        let repo = InMemoryChatRepository::new();
        let provider = ScriptedProvider::new("mock")
            .with_stream(text_stream(&["The capital ", "of France is Paris."]))
            .with_completion(r#"{"items":[{"query":"Population of Paris"},{"query":"History of Paris"},{"query":"Paris landmarks"}]}"#)
            .with_completion("Capital of France");
        let user = test_user("ada@example.com");
        let orch = orchestrator(&repo, None, TurnSettings::default());

        let body = orch.start(turn(&user, resolved(provider, false), "What is the capital of France?", false));
        let parts: Vec<DataStreamPart> = body.collect().await;

        assert_eq!(codes(&parts), "f00e88d");
        assert_eq!(parts[1], DataStreamPart::Text("The capital ".into()));
        match &parts[5] {
            DataStreamPart::Annotations(a) => match &a[0] {
                Annotation::RelatedQuestions(r) => assert_eq!(r.items.len(), 3),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            parts[6],
            DataStreamPart::FinishMessage {
                finish_reason: "stop".into(),
                usage: Usage { input_tokens: 12, output_tokens: 3 },
            }
        );

        let chats = repo.chats();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id.as_str(), "c1");
        assert_eq!(chats[0].title, "Capital of France");

        let messages = repo.messages();
        let roles: Vec<&str> = messages.iter().map(|m| m.payload.role_name()).collect();
        assert_eq!(roles, vec!["user", "data", "assistant"]);
        assert_eq!(
            messages[2].payload.text().as_deref(),
            Some("The capital of France is Paris.")
        );
        assert!(messages.windows(2).all(|w| w[0].created_at < w[1].created_at));
    }

    #[tokio::test]
    async fn test_history_is_sent_on_followup() {
        let repo = InMemoryChatRepository::new();
        let provider = ScriptedProvider::new("mock")
            .with_stream(text_stream(&["Paris."]))
            .with_completion(r#"{"items":[]}"#)
            .with_completion("France")
            .with_stream(text_stream(&["Berlin."]))
            .with_completion(r#"{"items":[]}"#);
        let handle = provider.clone();
        let user = test_user("ada@example.com");
        let orch = orchestrator(&repo, None, TurnSettings::default());
        let model = resolved(provider, false);

        orch.start(turn(&user, model.clone(), "Capital of France?", false))
            .collect::<Vec<_>>()
            .await;
        orch.start(turn(&user, model, "And Germany?", false))
            .collect::<Vec<_>>()
            .await;

        let stream_requests: Vec<CompletionRequest> =
            handle.requests().into_iter().filter(|r| r.stream).collect();
        assert_eq!(stream_requests.len(), 2);
        assert_eq!(
            stream_requests[1].messages,
            vec![
                Message::user("Capital of France?"),
                Message::assistant("Paris."),
                Message::user("And Germany?"),
            ]
        );
        assert_eq!(repo.messages().len(), 6);
    }

    #[tokio::test]
    async fn test_reasoning_model_timing_and_no_related_questions() {
        let repo = InMemoryChatRepository::new();
        let provider = ScriptedProvider::new("mock")
            .with_stream(vec![
                Ok(StreamEvent::Connected),
                Ok(StreamEvent::ThinkingDelta { thinking: "Let me ".into() }),
                Ok(StreamEvent::ThinkingDelta { thinking: "think.".into() }),
                Ok(StreamEvent::TextDelta { text: "Paris.".into() }),
                Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn }),
                Ok(StreamEvent::Done),
            ])
            .with_completion("Capital");
        let handle = provider.clone();
        let user = test_user("ada@example.com");
        let orch = orchestrator(&repo, None, TurnSettings::default());

        let parts: Vec<DataStreamPart> = orch
            .start(turn(&user, resolved(provider, true), "Capital of France?", false))
            .collect()
            .await;

        assert_eq!(codes(&parts), "fgg80ed");
        assert!(matches!(
            &parts[3],
            DataStreamPart::Annotations(a) if matches!(&a[0], Annotation::ReasoningTiming(t) if t.reasoning.is_none())
        ));
        let stream_request = handle.requests().into_iter().find(|r| r.stream).unwrap();
        assert_eq!(stream_request.thinking_budget, Some(REASONING_BUDGET_TOKENS));

        let messages = repo.messages();
        let roles: Vec<&str> = messages.iter().map(|m| m.payload.role_name()).collect();
        assert_eq!(roles, vec!["user", "data", "assistant"]);
        match &messages[1].payload {
            MessagePayload::Data {
                annotation: Annotation::ReasoningTiming(t),
            } => assert_eq!(t.reasoning.as_deref(), Some("Let me think.")),
            other => panic!("unexpected {other:?}"),
        }
        match &messages[2].payload {
            MessagePayload::Assistant { parts } => assert_eq!(parts.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_mode_runs_tool_first() {
        let repo = InMemoryChatRepository::new();
        let provider = ScriptedProvider::new("mock")
            .with_completion(r#"{"query":"capital of France"}"#)
            .with_stream(text_stream(&["Paris [1]."]))
            .with_completion(r#"{"items":[{"query":"Population of Paris"}]}"#)
            .with_completion("Capital of France");
        let handle = provider.clone();
        let search = StaticSearch::default();
        let user = test_user("ada@example.com");
        let orch = orchestrator(&repo, Some(search.clone()), TurnSettings::default());

        let parts: Vec<DataStreamPart> = orch
            .start(turn(&user, resolved(provider, false), "What is the capital of France?", true))
            .collect()
            .await;

        assert_eq!(codes(&parts), "88f0e88d");
        assert_eq!(search.queries(), vec!["capital of France"]);

        let requests = handle.requests();
        assert_eq!(requests[0].model, "mock-tool-model");
        let answer = requests.iter().find(|r| r.stream).unwrap();
        assert!(answer.system.as_deref().unwrap().contains("Web search results"));
        assert!(answer.messages.iter().any(|m| m.content.contains("Paris is the capital of France.")));

        let roles: Vec<&str> = repo.messages().iter().map(|m| m.payload.role_name()).collect();
        assert_eq!(roles, vec!["user", "assistant", "tool", "data", "data", "assistant"]);
        match &repo.messages()[3].payload {
            MessagePayload::Data {
                annotation: Annotation::ToolCallResult(t),
            } => assert_eq!(t.state, ToolCallState::Result),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generation_error_becomes_error_frame() {
        let repo = InMemoryChatRepository::new();
        let provider = ScriptedProvider::new("mock").with_stream(vec![
            Ok(StreamEvent::Connected),
            Ok(StreamEvent::TextDelta { text: "Par".into() }),
            Err(LlmError::Stream("connection reset".into())),
        ]);
        let user = test_user("ada@example.com");
        let orch = orchestrator(&repo, None, TurnSettings::default());

        let parts: Vec<DataStreamPart> = orch
            .start(turn(&user, resolved(provider, false), "Capital of France?", false))
            .collect()
            .await;

        assert_eq!(codes(&parts), "f03");
        match parts.last() {
            Some(DataStreamPart::Error(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(repo.chats().is_empty());
        assert!(repo.messages().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_chat_is_rejected() {
        let repo = InMemoryChatRepository::new();
        let owner = test_user("owner@example.com");
        let intruder = test_user("intruder@example.com");
        let orch = orchestrator(&repo, None, TurnSettings::default());

        let provider = ScriptedProvider::new("mock")
            .with_stream(text_stream(&["Hi."]))
            .with_completion(r#"{"items":[]}"#)
            .with_completion("Hello");
        orch.start(turn(&owner, resolved(provider, false), "hello", false))
            .collect::<Vec<_>>()
            .await;

        let provider = ScriptedProvider::new("mock");
        let handle = provider.clone();
        let parts: Vec<DataStreamPart> = orch
            .start(turn(&intruder, resolved(provider, false), "let me in", false))
            .collect()
            .await;
        assert_eq!(parts, vec![DataStreamPart::Error("chat not found".into())]);
        assert!(handle.requests().is_empty());
        assert_eq!(repo.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_client_disconnect_cancels_without_persisting() {
        let repo = InMemoryChatRepository::new();
        let provider = ScriptedProvider::new("mock").with_hanging_stream(vec![
            Ok(StreamEvent::Connected),
            Ok(StreamEvent::TextDelta { text: "Par".into() }),
        ]);
        let user = test_user("ada@example.com");
        let orch = orchestrator(&repo, None, TurnSettings::default());

        let mut body = orch.start(turn(&user, resolved(provider, false), "Capital of France?", false));
        assert!(matches!(body.next().await, Some(DataStreamPart::StartStep { .. })));
        assert_eq!(body.next().await, Some(DataStreamPart::Text("Par".into())));
        drop(body);

        // Give the task a moment to observe the cancellation.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(repo.chats().is_empty());
        assert!(repo.messages().is_empty());
    }

    #[tokio::test]
    async fn test_run_rejects_empty_message() {
        let repo = InMemoryChatRepository::new();
        let orch = orchestrator(&repo, None, TurnSettings::default());
        let (writer, _body) = data_stream::channel(4, CancellationToken::new());
        let err = orch
            .run(
                turn(&test_user("a@b.c"), resolved(ScriptedProvider::new("mock"), false), "  ", false),
                &writer,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Invalid(_)));
    }
}
