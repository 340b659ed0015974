//! Hand-written doubles for core tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use uuid::Uuid;

use askr_types::chat::{Chat, ChatId, StoredMessage};
use askr_types::error::{RepositoryError, ToolError};
use askr_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason,
    StreamEvent, Usage,
};
use askr_types::model::ModelConfig;
use askr_types::user::User;

use crate::chat::repository::ChatRepository;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::provider::{LlmEventStream, LlmProvider};
use crate::llm::registry::ResolvedModel;
use crate::tool::search::{SearchProvider, SearchResultItem, SearchResults};

// --- LLM ---

enum ScriptedStream {
    Finite(Vec<Result<StreamEvent, LlmError>>),
    /// Yields the events, then never completes.
    Hanging(Vec<Result<StreamEvent, LlmError>>),
}

enum ScriptedCompletion {
    Reply(Result<String, LlmError>),
    /// Never resolves.
    Hanging,
}

#[derive(Default)]
struct Script {
    completions: VecDeque<ScriptedCompletion>,
    streams: VecDeque<ScriptedStream>,
    requests: Vec<CompletionRequest>,
}

/// Provider that replays scripted completions and streams, recording every
/// request it receives.
#[derive(Clone)]
pub struct ScriptedProvider {
    name: String,
    capabilities: ProviderCapabilities,
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capabilities: ProviderCapabilities {
                streaming: true,
                extended_thinking: true,
                max_context_tokens: 128_000,
                max_output_tokens: 4_096,
            },
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn with_completion(self, text: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .completions
            .push_back(ScriptedCompletion::Reply(Ok(text.to_string())));
        self
    }

    pub fn with_completion_error(self, error: LlmError) -> Self {
        self.script
            .lock()
            .unwrap()
            .completions
            .push_back(ScriptedCompletion::Reply(Err(error)));
        self
    }

    pub fn with_hanging_completion(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .completions
            .push_back(ScriptedCompletion::Hanging);
        self
    }

    pub fn with_stream(self, events: Vec<Result<StreamEvent, LlmError>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .streams
            .push_back(ScriptedStream::Finite(events));
        self
    }

    pub fn with_hanging_stream(self, events: Vec<Result<StreamEvent, LlmError>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .streams
            .push_back(ScriptedStream::Hanging(events));
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(request.clone());
            script.completions.pop_front()
        };
        let model = request.model.clone();
        async move {
            let content = match next {
                Some(ScriptedCompletion::Reply(reply)) => reply?,
                Some(ScriptedCompletion::Hanging) => {
                    std::future::pending::<Result<String, LlmError>>().await?
                }
                None => {
                    return Err(LlmError::Provider {
                        message: "no scripted completion".to_string(),
                    });
                }
            };
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content,
                model,
                stop_reason: StopReason::EndTurn,
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
            })
        }
    }

    fn stream(&self, request: CompletionRequest) -> LlmEventStream {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(request);
            script.streams.pop_front()
        };
        match next {
            Some(ScriptedStream::Finite(events)) => Box::pin(futures_util::stream::iter(events)),
            Some(ScriptedStream::Hanging(events)) => Box::pin(
                futures_util::stream::iter(events).chain(futures_util::stream::pending()),
            ),
            None => Box::pin(futures_util::stream::iter(vec![Ok(StreamEvent::Done)])),
        }
    }
}

/// Stream events for a plain text answer.
pub fn text_stream(chunks: &[&str]) -> Vec<Result<StreamEvent, LlmError>> {
    let mut events = vec![Ok(StreamEvent::Connected)];
    events.extend(chunks.iter().map(|c| Ok(StreamEvent::TextDelta { text: c.to_string() })));
    events.push(Ok(StreamEvent::MessageDelta {
        stop_reason: StopReason::EndTurn,
    }));
    events.push(Ok(StreamEvent::Usage(Usage {
        input_tokens: 12,
        output_tokens: 3,
    })));
    events.push(Ok(StreamEvent::Done));
    events
}

pub fn test_model(reasoning: bool) -> ModelConfig {
    ModelConfig {
        id: "mock-model".to_string(),
        name: "Mock".to_string(),
        provider: "mock".to_string(),
        enabled: true,
        tool_call_model: Some("mock-tool-model".to_string()),
        reasoning,
        context_window: None,
    }
}

pub fn resolved(provider: ScriptedProvider, reasoning: bool) -> ResolvedModel {
    ResolvedModel {
        provider: Arc::new(BoxLlmProvider::new(provider)),
        config: test_model(reasoning),
    }
}

pub fn test_user(email: &str) -> User {
    User::new(email, false)
}

// --- Chat repository ---

#[derive(Default)]
struct Store {
    chats: Vec<Chat>,
    messages: Vec<StoredMessage>,
}

/// In-memory chat repository with the same ownership rules as the SQL one.
#[derive(Clone, Default)]
pub struct InMemoryChatRepository {
    store: Arc<Mutex<Store>>,
    fail_saves: bool,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository whose `save_turn` always fails.
    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn chats(&self) -> Vec<Chat> {
        self.store.lock().unwrap().chats.clone()
    }

    pub fn messages(&self) -> Vec<StoredMessage> {
        self.store.lock().unwrap().messages.clone()
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn find_chat(&self, chat_id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.chats.iter().find(|c| &c.id == chat_id).cloned())
    }

    async fn get_chat(&self, chat_id: &ChatId, owner: &Uuid) -> Result<Option<Chat>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .chats
            .iter()
            .find(|c| &c.id == chat_id && &c.user_id == owner)
            .cloned())
    }

    async fn get_messages(
        &self,
        chat_id: &ChatId,
        owner: &Uuid,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        let store = self.store.lock().unwrap();
        if !store.chats.iter().any(|c| &c.id == chat_id && &c.user_id == owner) {
            return Ok(Vec::new());
        }
        let mut messages: Vec<StoredMessage> = store
            .messages
            .iter()
            .filter(|m| &m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(messages)
    }

    async fn list_chats(&self, owner: &Uuid) -> Result<Vec<Chat>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut chats: Vec<Chat> = store
            .chats
            .iter()
            .filter(|c| &c.user_id == owner)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }

    async fn delete_chat(&self, chat_id: &ChatId, owner: &Uuid) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let before = store.chats.len();
        store.chats.retain(|c| !(&c.id == chat_id && &c.user_id == owner));
        if store.chats.len() == before {
            return Err(RepositoryError::NotFound);
        }
        store.messages.retain(|m| &m.chat_id != chat_id);
        Ok(())
    }

    async fn save_turn(&self, chat: &Chat, messages: &[StoredMessage]) -> Result<(), RepositoryError> {
        if self.fail_saves {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        let mut store = self.store.lock().unwrap();
        match store.chats.iter().find(|c| c.id == chat.id) {
            Some(existing) if existing.user_id != chat.user_id => return Err(RepositoryError::NotFound),
            Some(_) => {}
            None => store.chats.push(chat.clone()),
        }
        store.messages.extend_from_slice(messages);
        Ok(())
    }
}

// --- Search ---

/// Search backend returning one canned result per query.
#[derive(Clone, Default)]
pub struct StaticSearch {
    queries: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl StaticSearch {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<SearchResults, ToolError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(ToolError::Request("search backend unavailable".to_string()));
        }
        let results = (0..max_results.min(1))
            .map(|_| SearchResultItem {
                title: "Paris - Wikipedia".to_string(),
                url: "https://en.wikipedia.org/wiki/Paris".to_string(),
                content: "Paris is the capital of France.".to_string(),
            })
            .collect();
        Ok(SearchResults {
            query: query.to_string(),
            results,
            images: Vec::new(),
        })
    }
}
