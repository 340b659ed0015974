//! Structured output on top of plain completions.
//!
//! The JSON schema of the target type (from `schemars`) is embedded in the
//! system prompt; the first JSON object in the reply is parsed into `T`.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use askr_types::llm::{CompletionRequest, LlmError, Message};

use super::box_provider::BoxLlmProvider;

/// Request a JSON value matching `T`'s schema and parse it.
pub async fn generate_structured<T>(
    provider: &BoxLlmProvider,
    model: &str,
    instructions: &str,
    messages: Vec<Message>,
) -> Result<T, LlmError>
where
    T: JsonSchema + DeserializeOwned,
{
    let schema = schemars::schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema)
        .map_err(|e| LlmError::InvalidRequest(format!("schema serialization failed: {e}")))?;

    let system = format!(
        "{instructions}\n\nRespond with a single JSON object that conforms to this JSON schema. \
         Do not include any other text.\n\n{schema_json}"
    );

    let request = CompletionRequest {
        model: model.to_string(),
        messages,
        system: Some(system),
        max_tokens: 1024,
        temperature: Some(0.3),
        stream: false,
        stop_sequences: None,
        thinking_budget: None,
    };

    let response = provider.complete(&request).await?;
    parse_first_json_object(&response.content)
}

/// Parse the first JSON object in `text`.
///
/// Tolerates surrounding prose and Markdown code fences; anything after the
/// object is ignored.
pub fn parse_first_json_object<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let start = text
        .find('{')
        .ok_or_else(|| LlmError::Deserialization("no JSON object in model output".to_string()))?;

    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<serde_json::Value>();
    let value = match values.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(LlmError::Deserialization(e.to_string())),
        None => {
            return Err(LlmError::Deserialization(
                "no JSON object in model output".to_string(),
            ));
        }
    };

    serde_json::from_value(value).map_err(|e| LlmError::Deserialization(e.to_string()))
}
