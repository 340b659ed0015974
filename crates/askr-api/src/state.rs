//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Core services are generic over repository traits; AppState pins them to the
//! SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use askr_core::chat::service::ChatService;
use askr_core::llm::registry::{ProviderRegistry, ResolvedModel};
use askr_core::stream::orchestrator::{StreamOrchestrator, TurnSettings};
use askr_core::tool::search::BoxSearchProvider;
use askr_infra::auth::ApiKeyAuthProvider;
use askr_infra::config::{load_global_config, resolve_data_dir, secret_from_env};
use askr_infra::llm::build_registry;
use askr_infra::search::TavilySearchProvider;
use askr_infra::sqlite::chat::SqliteChatRepository;
use askr_infra::sqlite::pool::DatabasePool;
use askr_infra::sqlite::user::SqliteUserRepository;
use askr_types::config::GlobalConfig;

pub type ConcreteChatService = ChatService<SqliteChatRepository>;
pub type ConcreteOrchestrator = StreamOrchestrator<SqliteChatRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GlobalConfig>,
    pub users: SqliteUserRepository,
    pub auth: ApiKeyAuthProvider,
    pub chat_service: Arc<ConcreteChatService>,
    pub registry: Arc<ProviderRegistry>,
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("askr.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let registry = build_registry(&config);
        let search = build_search(&config);

        Ok(Self::from_parts(config, registry, search, data_dir, db_pool))
    }

    /// Wire services from already-constructed parts.
    pub fn from_parts(
        config: GlobalConfig,
        registry: ProviderRegistry,
        search: Option<BoxSearchProvider>,
        data_dir: PathBuf,
        db_pool: DatabasePool,
    ) -> Self {
        let users = SqliteUserRepository::new(db_pool.clone());
        let auth = ApiKeyAuthProvider::new(users.clone());
        let chat_service = Arc::new(ChatService::new(SqliteChatRepository::new(db_pool.clone())));

        let settings = TurnSettings {
            max_response_tokens: config.chat.max_response_tokens,
            search_max_results: config.search.max_results,
            stream_buffer: config.chat.stream_buffer,
            title_model: auxiliary_model(&config, &registry, config.chat.title_model.as_deref(), "title"),
            related_model: auxiliary_model(
                &config,
                &registry,
                config.chat.related_questions_model.as_deref(),
                "related questions",
            ),
        };

        let orchestrator = Arc::new(StreamOrchestrator::new(
            Arc::clone(&chat_service),
            search.map(Arc::new),
            settings,
        ));

        Self {
            config: Arc::new(config),
            users,
            auth,
            chat_service,
            registry: Arc::new(registry),
            orchestrator,
            data_dir,
            db_pool,
        }
    }

    /// Resolve a client-selected model to a provider-backed model.
    ///
    /// `None` selects the first enabled model.
    pub fn resolve_model(&self, qualified_id: Option<&str>) -> Option<ResolvedModel> {
        self.config
            .resolve_model(qualified_id)
            .and_then(|model| self.registry.resolve(model))
    }
}

/// Tavily search when its API key is present in the environment.
fn build_search(config: &GlobalConfig) -> Option<BoxSearchProvider> {
    let api_key = match secret_from_env(&config.search.api_key_env) {
        Ok(key) => key,
        Err(_) => {
            tracing::info!(env = %config.search.api_key_env, "search disabled, no API key set");
            return None;
        }
    };
    match TavilySearchProvider::new(api_key, config.search.base_url.as_deref()) {
        Ok(provider) => Some(BoxSearchProvider::new(provider)),
        Err(e) => {
            tracing::warn!(error = %e, "search disabled");
            None
        }
    }
}

/// Resolve the configured title or related-questions model.
///
/// Unset means "use the turn's model". A configured id that does not resolve
/// falls back to the same with a warning.
fn auxiliary_model(
    config: &GlobalConfig,
    registry: &ProviderRegistry,
    qualified_id: Option<&str>,
    purpose: &str,
) -> Option<ResolvedModel> {
    let qualified_id = qualified_id?;
    let resolved = config
        .resolve_model(Some(qualified_id))
        .and_then(|model| registry.resolve(model));
    if resolved.is_none() {
        tracing::warn!(model = %qualified_id, purpose, "configured model unavailable, using the chat model");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unresolvable_models_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();

        let mut config = GlobalConfig::default();
        config.chat.title_model = Some("openai:gpt-4o-mini".to_string());
        let state = AppState::from_parts(
            config,
            ProviderRegistry::new(),
            None,
            dir.path().to_path_buf(),
            pool,
        );

        // The default model is configured but its provider is not registered.
        assert!(state.config.resolve_model(None).is_some());
        assert!(state.resolve_model(None).is_none());
        assert!(state.resolve_model(Some("nope:model")).is_none());
    }
}
