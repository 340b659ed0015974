//! Configuration and per-provider defaults for OpenAI-compatible providers.
//!
//! Well-known provider names resolve to their base URL and capabilities;
//! anything else needs an explicit `base_url` in config.toml.

use askr_types::llm::ProviderCapabilities;
use secrecy::SecretString;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name from config.toml (e.g., "openai", "groq").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    pub capabilities: ProviderCapabilities,
}

/// Base URL and capabilities for a well-known provider name.
pub fn known_provider(name: &str) -> Option<(&'static str, ProviderCapabilities)> {
    let (base_url, max_context_tokens, max_output_tokens) = match name {
        "openai" => ("https://api.openai.com/v1", 128_000, 16_384),
        "gemini" => (
            "https://generativelanguage.googleapis.com/v1beta/openai",
            1_000_000,
            65_536,
        ),
        "mistral" => ("https://api.mistral.ai/v1", 128_000, 32_768),
        "groq" => ("https://api.groq.com/openai/v1", 128_000, 32_768),
        "deepseek" => ("https://api.deepseek.com/v1", 64_000, 8_192),
        "ollama" => ("http://localhost:11434/v1", 32_000, 4_096),
        _ => return None,
    };
    Some((
        base_url,
        ProviderCapabilities {
            streaming: true,
            extended_thinking: false,
            max_context_tokens,
            max_output_tokens,
        },
    ))
}

/// Capabilities assumed for a provider reached through a custom base URL.
pub fn generic_capabilities() -> ProviderCapabilities {
    ProviderCapabilities {
        streaming: true,
        extended_thinking: false,
        max_context_tokens: 128_000,
        max_output_tokens: 4_096,
    }
}

impl OpenAiCompatConfig {
    /// Build a config from a provider name and optional base URL override.
    ///
    /// Returns `None` for an unknown provider name without a base URL.
    pub fn resolve(name: &str, base_url: Option<&str>, api_key: SecretString) -> Option<Self> {
        let known = known_provider(name);
        let (base_url, capabilities) = match (base_url, known) {
            (Some(url), Some((_, caps))) => (url.to_string(), caps),
            (Some(url), None) => (url.to_string(), generic_capabilities()),
            (None, Some((url, caps))) => (url.to_string(), caps),
            (None, None) => return None,
        };
        Some(Self {
            provider_name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_providers() {
        let (url, caps) = known_provider("openai").unwrap();
        assert_eq!(url, "https://api.openai.com/v1");
        assert_eq!(caps.max_context_tokens, 128_000);

        let (url, caps) = known_provider("gemini").unwrap();
        assert!(url.contains("generativelanguage"));
        assert_eq!(caps.max_output_tokens, 65_536);

        assert!(known_provider("acme").is_none());
    }

    #[test]
    fn test_resolve_with_override() {
        let cfg = OpenAiCompatConfig::resolve(
            "openai",
            Some("http://proxy.local/v1/"),
            SecretString::from("sk"),
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://proxy.local/v1");
        assert_eq!(cfg.capabilities.max_output_tokens, 16_384);
    }

    #[test]
    fn test_resolve_unknown_requires_base_url() {
        assert!(OpenAiCompatConfig::resolve("acme", None, SecretString::from("k")).is_none());
        let cfg = OpenAiCompatConfig::resolve("acme", Some("https://acme.ai/v1"), SecretString::from("k"))
            .unwrap();
        assert_eq!(cfg.provider_name, "acme");
        assert_eq!(cfg.capabilities.max_output_tokens, 4_096);
    }
}
