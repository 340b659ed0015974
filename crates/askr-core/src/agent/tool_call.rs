//! Manual tool-call step for search mode.
//!
//! Before the answer is generated, the tool-call model picks a search query
//! (structured output), the search tool runs, and the results are appended
//! to the LLM history. The step streams a `tool-call-result` annotation in
//! state `call` and then in state `result`.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use askr_types::annotation::{Annotation, ToolCallAnnotation, ToolCallState};
use askr_types::chat::{AssistantPart, MessagePayload};
use askr_types::error::{ChatError, ToolError};
use askr_types::llm::Message;

use crate::agent::prompt::search_planner_prompt;
use crate::llm::registry::ResolvedModel;
use crate::llm::structured::generate_structured;
use crate::stream::data_stream::DataStreamWriter;
use crate::tool::search::{BoxSearchProvider, SEARCH_TOOL_NAME};

/// Arguments of the search tool, chosen by the tool-call model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchToolArgs {
    /// The search query to run.
    pub query: String,
    /// Maximum number of results to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Everything the search step contributes to a turn.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    /// Final (`result` state) annotation, kept for persistence.
    pub annotation: Annotation,
    /// `assistant{tool-call}` and `tool{..}` payloads to persist.
    pub messages: Vec<MessagePayload>,
    /// Messages appended to the LLM history for answer generation.
    pub context: Vec<Message>,
}

/// Run the search step, streaming its annotations through `writer`.
///
/// `max_results` caps whatever the model asks for.
#[tracing::instrument(
    name = "search_tool_step",
    skip_all,
    fields(gen_ai.operation.name = "execute_tool", gen_ai.request.model = %model.model_id())
)]
pub async fn execute_search_step(
    model: &ResolvedModel,
    search: &BoxSearchProvider,
    history: &[Message],
    max_results: u32,
    writer: &DataStreamWriter,
) -> Result<ToolCallOutcome, ChatError> {
    let planned: SearchToolArgs = generate_structured(
        &model.provider,
        model.model_id(),
        &search_planner_prompt(Utc::now()),
        history.to_vec(),
    )
    .await?;

    let query = planned.query.trim().to_string();
    if query.is_empty() {
        return Err(ToolError::InvalidArguments("empty search query".to_string()).into());
    }
    let max_results = planned.max_results.unwrap_or(max_results).clamp(1, max_results.max(1));
    let args = serde_json::json!({ "query": query, "max_results": max_results });

    let tool_call_id = format!("call_{}", Uuid::now_v7().simple());
    let mut annotation = ToolCallAnnotation {
        state: ToolCallState::Call,
        tool_call_id: tool_call_id.clone(),
        tool_name: SEARCH_TOOL_NAME.to_string(),
        args: args.clone(),
        result: None,
    };
    writer
        .annotation(Annotation::ToolCallResult(annotation.clone()))
        .await?;

    let results = search.search(&query, max_results).await?;
    info!(query = %query, results = results.results.len(), backend = search.name(), "search completed");
    let result_json = serde_json::to_value(&results)
        .map_err(|e| ToolError::Deserialization(e.to_string()))?;

    annotation.state = ToolCallState::Result;
    annotation.result = Some(result_json.clone());
    let annotation = Annotation::ToolCallResult(annotation);
    writer.annotation(annotation.clone()).await?;

    let messages = vec![
        MessagePayload::Assistant {
            parts: vec![AssistantPart::ToolCall {
                tool_call_id: tool_call_id.clone(),
                tool_name: SEARCH_TOOL_NAME.to_string(),
                args,
            }],
        },
        MessagePayload::Tool {
            tool_call_id,
            tool_name: SEARCH_TOOL_NAME.to_string(),
            result: result_json.clone(),
        },
    ];

    let context = vec![
        Message::assistant(format!("Web search results for \"{query}\": {result_json}")),
        Message::user("Now answer my previous question using these search results."),
    ];

    Ok(ToolCallOutcome {
        annotation,
        messages,
        context,
    })
}
