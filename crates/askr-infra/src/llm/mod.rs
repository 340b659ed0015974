//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`](askr_core::llm::provider::LlmProvider)
//! trait, a factory ([`create_provider`]) that builds the right provider from
//! a [`ProviderConfig`], and [`build_registry`] which registers every
//! configured provider at startup.

pub mod anthropic;
pub mod openai_compat;

use askr_core::llm::box_provider::BoxLlmProvider;
use askr_core::llm::registry::ProviderRegistry;
use askr_types::config::GlobalConfig;
use askr_types::error::ConfigError;
use askr_types::llm::{ProviderConfig, ProviderType};

use crate::config::secret_from_env;

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from a [`ProviderConfig`].
///
/// The API key is read from the environment variable named by
/// `api_key_env`. OpenAI-compatible providers without one (e.g. a local
/// Ollama) get a placeholder key.
pub fn create_provider(config: &ProviderConfig) -> Result<BoxLlmProvider, ConfigError> {
    let api_key = config.api_key_env.as_deref().map(secret_from_env).transpose()?;

    match config.provider_type {
        ProviderType::Anthropic => {
            let key = api_key.ok_or_else(|| {
                ConfigError::MissingEnv(format!("api_key_env for provider '{}'", config.name))
            })?;
            let mut provider = AnthropicProvider::new(key).map_err(|e| ConfigError::ProviderInit {
                name: config.name.clone(),
                message: e.to_string(),
            })?;
            if let Some(base_url) = config.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAiCompatible => {
            let key = api_key.unwrap_or_else(|| secrecy::SecretString::from("unused"));
            let oai_config =
                OpenAiCompatConfig::resolve(&config.name, config.base_url.as_deref(), key)
                    .ok_or_else(|| ConfigError::UnknownProvider(config.name.clone()))?;
            Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(oai_config)))
        }
    }
}

/// Register every configured provider that can be constructed.
///
/// Providers that fail (usually a missing API key) are skipped with a
/// warning; models that reference them will not resolve.
pub fn build_registry(config: &GlobalConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider_config in &config.providers {
        match create_provider(provider_config) {
            Ok(provider) => {
                tracing::info!(provider = %provider_config.name, "registered LLM provider");
                registry.register(provider_config.name.clone(), provider);
            }
            Err(e) => {
                tracing::warn!(provider = %provider_config.name, error = %e, "skipping LLM provider");
            }
        }
    }
    registry
}
