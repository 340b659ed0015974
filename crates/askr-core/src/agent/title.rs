//! Chat title generation via LLM.
//!
//! `generate_title` creates a short, descriptive title for a new chat from
//! its first user message.

use askr_types::chat::{DEFAULT_CHAT_TITLE, MAX_TITLE_CHARS};
use askr_types::llm::{CompletionRequest, LlmError, Message};
use tracing::warn;

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::registry::ResolvedModel;

/// System prompt for the title generation LLM call.
const TITLE_SYSTEM_PROMPT: &str = r#"Generate a short, descriptive title (3-7 words) for a conversation that starts with the user's message below. The title should capture the main topic or intent. Return ONLY the title text, nothing else.

Examples:
- "Capital of France"
- "Debugging Rust lifetime errors"
- "Planning a weekend trip to Tokyo""#;

/// Generate a chat title from the first user message.
///
/// Uses an LLM call at low temperature (0.3). The result is trimmed of
/// whitespace and surrounding quotes and cut to `MAX_TITLE_CHARS`.
#[tracing::instrument(
    name = "generate_title",
    skip(provider, first_message),
    fields(gen_ai.operation.name = "generate_title", gen_ai.request.model = %model)
)]
pub async fn generate_title(
    provider: &BoxLlmProvider,
    first_message: &str,
    model: &str,
) -> Result<String, LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user(first_message)],
        system: Some(TITLE_SYSTEM_PROMPT.to_string()),
        max_tokens: 50,
        temperature: Some(0.3),
        stream: false,
        stop_sequences: None,
        thinking_budget: None,
    };

    let response = provider.complete(&request).await?;
    Ok(clean_title(&response.content))
}

/// Generate a title, falling back to `DEFAULT_CHAT_TITLE` on any failure.
pub async fn title_or_default(model: &ResolvedModel, first_message: &str) -> String {
    if first_message.trim().is_empty() {
        return DEFAULT_CHAT_TITLE.to_string();
    }
    match generate_title(&model.provider, first_message, model.model_id()).await {
        Ok(title) if !title.is_empty() => title,
        Ok(_) => DEFAULT_CHAT_TITLE.to_string(),
        Err(e) => {
            warn!(error = %e, "title generation failed, using default");
            DEFAULT_CHAT_TITLE.to_string()
        }
    }
}

fn clean_title(raw: &str) -> String {
    let line = raw.trim().lines().next().unwrap_or_default();
    let title = line
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim();
    title.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, resolved};

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  \"Capital of France\"  "), "Capital of France");
        assert_eq!(clean_title("'Rust tips'\nmore text"), "Rust tips");
        assert_eq!(clean_title(&"a".repeat(150)).len(), MAX_TITLE_CHARS);
        assert_eq!(clean_title(""), "");
    }

    #[tokio::test]
    async fn test_generate_title_request_shape() {
        let scripted = ScriptedProvider::new("mock").with_completion("\"Capital of France\"");
        let handle = scripted.clone();
        let provider = BoxLlmProvider::new(scripted);

        let title = generate_title(&provider, "What is the capital of France?", "m")
            .await
            .unwrap();
        assert_eq!(title, "Capital of France");

        let request = &handle.requests()[0];
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, 50);
        assert_eq!(request.messages, vec![Message::user("What is the capital of France?")]);
    }

    #[tokio::test]
    async fn test_title_or_default_on_empty_output() {
        let model = resolved(ScriptedProvider::new("mock").with_completion("\"\""), false);
        assert_eq!(title_or_default(&model, "hello").await, DEFAULT_CHAT_TITLE);
    }
}
