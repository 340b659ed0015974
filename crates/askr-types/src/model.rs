//! Configured chat models.

use serde::{Deserialize, Serialize};

/// Context window assumed when a model does not declare one.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;

/// Tokens held back from the context window for the response.
pub const RESPONSE_TOKEN_RESERVE: u32 = 30_000;

/// Lower bound for the history budget of any model.
pub const MIN_ALLOWED_TOKENS: u32 = 1_000;

/// A model a user can chat with, as declared under `[[models]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider-side model identifier (e.g. "gpt-4o-mini").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Name of the provider entry that serves this model.
    pub provider: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cheaper model used for the search tool step; defaults to `id`.
    #[serde(default)]
    pub tool_call_model: Option<String>,
    /// Whether the model emits reasoning output.
    #[serde(default)]
    pub reasoning: bool,
    #[serde(default)]
    pub context_window: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl ModelConfig {
    /// `provider:id`, the identifier clients select models by.
    pub fn qualified_id(&self) -> String {
        format!("{}:{}", self.provider, self.id)
    }

    /// Model used for the tool-call step.
    pub fn tool_call_model_id(&self) -> &str {
        self.tool_call_model.as_deref().unwrap_or(&self.id)
    }

    /// Token budget available for conversation history.
    pub fn max_allowed_tokens(&self) -> u32 {
        self.context_window
            .unwrap_or(DEFAULT_CONTEXT_WINDOW)
            .saturating_sub(RESPONSE_TOKEN_RESERVE)
            .max(MIN_ALLOWED_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(context_window: Option<u32>) -> ModelConfig {
        ModelConfig {
            id: "gpt-4o-mini".into(),
            name: "GPT-4o mini".into(),
            provider: "openai".into(),
            enabled: true,
            tool_call_model: None,
            reasoning: false,
            context_window,
        }
    }

    #[test]
    fn test_qualified_id() {
        assert_eq!(model(None).qualified_id(), "openai:gpt-4o-mini");
    }

    #[test]
    fn test_max_allowed_tokens() {
        assert_eq!(model(None).max_allowed_tokens(), 98_000);
        assert_eq!(model(Some(200_000)).max_allowed_tokens(), 170_000);
        assert_eq!(model(Some(8_000)).max_allowed_tokens(), MIN_ALLOWED_TOKENS);
    }

    #[test]
    fn test_tool_call_model_falls_back_to_id() {
        let mut m = model(None);
        assert_eq!(m.tool_call_model_id(), "gpt-4o-mini");
        m.tool_call_model = Some("gpt-4.1-nano".into());
        assert_eq!(m.tool_call_model_id(), "gpt-4.1-nano");
    }

    #[test]
    fn test_deserialize_defaults() {
        let m: ModelConfig = serde_json::from_str(
            r#"{"id":"deepseek-reasoner","name":"DeepSeek R1","provider":"deepseek","reasoning":true}"#,
        )
        .unwrap();
        assert!(m.enabled);
        assert!(m.reasoning);
        assert!(m.context_window.is_none());
    }
}
