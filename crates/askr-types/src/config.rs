//! Global configuration types for askr.
//!
//! `GlobalConfig` represents the top-level `config.toml`: server address,
//! providers, models, search backend and chat defaults.

use serde::{Deserialize, Serialize};

use crate::llm::{ProviderConfig, ProviderType};
use crate::model::ModelConfig;

/// Top-level configuration.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: default_providers(),
            models: default_models(),
            search: SearchConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Enabled models, in declaration order.
    pub fn enabled_models(&self) -> impl Iterator<Item = &ModelConfig> {
        self.models.iter().filter(|m| m.enabled)
    }

    /// Resolve a model by qualified id, falling back to the first enabled
    /// model when `qualified_id` is `None`.
    ///
    /// An explicitly requested id that is unknown or disabled yields `None`.
    pub fn resolve_model(&self, qualified_id: Option<&str>) -> Option<&ModelConfig> {
        match qualified_id {
            Some(qid) => self.enabled_models().find(|m| m.qualified_id() == qid),
            None => self.enabled_models().next(),
        }
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig {
        name: "openai".to_string(),
        provider_type: ProviderType::OpenAiCompatible,
        api_key_env: Some("OPENAI_API_KEY".to_string()),
        base_url: None,
    }]
}

fn default_models() -> Vec<ModelConfig> {
    vec![ModelConfig {
        id: "gpt-4o-mini".to_string(),
        name: "GPT-4o mini".to_string(),
        provider: "openai".to_string(),
        enabled: true,
        tool_call_model: None,
        reasoning: false,
        context_window: None,
    }]
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Web search backend used by search mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Environment variable holding the Tavily API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_max_results() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: None,
            max_results: default_max_results(),
        }
    }
}

/// Defaults for the chat flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model used for title generation (qualified id). Defaults to the
    /// chat's own model.
    #[serde(default)]
    pub title_model: Option<String>,
    /// Model used for related questions (qualified id). Defaults to the
    /// chat's own model.
    #[serde(default)]
    pub related_questions_model: Option<String>,
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,
    /// Capacity of the per-turn outbound frame channel.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_max_response_tokens() -> u32 {
    4096
}

fn default_stream_buffer() -> usize {
    64
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            title_model: None,
            related_questions_model: None,
            max_response_tokens: default_max_response_tokens(),
            stream_buffer: default_stream_buffer(),
        }
    }
}
