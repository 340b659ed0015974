//! Provider registry for runtime provider lookup.
//!
//! A name-indexed registry of boxed LLM providers. Models reference their
//! provider by name; `resolve` pairs a model with its provider.

use std::collections::HashMap;
use std::sync::Arc;

use askr_types::model::ModelConfig;

use super::box_provider::BoxLlmProvider;

/// Registry of available LLM providers, indexed by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<BoxLlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under the given name.
    ///
    /// If a provider with this name already exists, it is replaced.
    pub fn register(&mut self, name: impl Into<String>, provider: BoxLlmProvider) {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<Arc<BoxLlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Pair a model with the provider that serves it.
    pub fn resolve(&self, model: &ModelConfig) -> Option<ResolvedModel> {
        self.get(&model.provider).map(|provider| ResolvedModel {
            provider,
            config: model.clone(),
        })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured model bound to its provider.
#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub provider: Arc<BoxLlmProvider>,
    pub config: ModelConfig,
}

impl ResolvedModel {
    /// Provider-side model id.
    pub fn model_id(&self) -> &str {
        &self.config.id
    }

    /// The same provider, serving the model's tool-call model instead.
    pub fn tool_call_model(&self) -> ResolvedModel {
        let mut config = self.config.clone();
        config.id = self.config.tool_call_model_id().to_string();
        config.reasoning = false;
        ResolvedModel {
            provider: Arc::clone(&self.provider),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn model(provider: &str) -> ModelConfig {
        ModelConfig {
            id: "deepseek-reasoner".into(),
            name: "DeepSeek R1".into(),
            provider: provider.into(),
            enabled: true,
            tool_call_model: Some("deepseek-chat".into()),
            reasoning: true,
            context_window: None,
        }
    }

    #[test]
    fn test_resolve_by_provider_name() {
        let mut registry = ProviderRegistry::new();
        registry.register("deepseek", BoxLlmProvider::new(ScriptedProvider::new("deepseek")));

        let resolved = registry.resolve(&model("deepseek")).unwrap();
        assert_eq!(resolved.provider.name(), "deepseek");
        assert_eq!(resolved.model_id(), "deepseek-reasoner");
        assert!(registry.resolve(&model("missing")).is_none());
        assert_eq!(registry.list_names(), vec!["deepseek"]);
    }

    #[test]
    fn test_tool_call_model_swaps_id() {
        let mut registry = ProviderRegistry::new();
        registry.register("deepseek", BoxLlmProvider::new(ScriptedProvider::new("deepseek")));
        let resolved = registry.resolve(&model("deepseek")).unwrap();

        let tool = resolved.tool_call_model();
        assert_eq!(tool.model_id(), "deepseek-chat");
        assert!(!tool.config.reasoning);
        assert!(Arc::ptr_eq(&tool.provider, &resolved.provider));
    }
}
