//! Out-of-band annotations attached to a streamed chat response.
//!
//! Annotations travel on the outbound data stream next to the answer text
//! and are folded into the persisted history as `data` messages. The wire
//! shape is `{ "type": "<tag>", "data": { ... } }`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A tagged annotation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Annotation {
    /// How long the model spent in a reasoning span.
    ReasoningTiming(ReasoningTiming),
    /// Follow-up questions suggested after the answer.
    RelatedQuestions(RelatedQuestions),
    /// A tool invocation and, once available, its result.
    ToolCallResult(ToolCallAnnotation),
}

impl Annotation {
    /// Tag name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Annotation::ReasoningTiming(_) => "reasoning-timing",
            Annotation::RelatedQuestions(_) => "related-questions",
            Annotation::ToolCallResult(_) => "tool-call-result",
        }
    }

    /// The "loading" placeholder sent before related questions are generated.
    pub fn related_questions_loading() -> Self {
        Annotation::RelatedQuestions(RelatedQuestions { items: Vec::new() })
    }
}

/// Duration of a reasoning span, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningTiming {
    #[serde(rename = "time")]
    pub time_ms: u64,
    /// Full reasoning text; only present on the persisted annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Related questions produced by a structured model call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelatedQuestions {
    /// Follow-up questions the user might ask next.
    pub items: Vec<RelatedQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelatedQuestion {
    /// A short, self-contained follow-up query.
    pub query: String,
}

/// Lifecycle state of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallState {
    Call,
    Result,
}

/// Tool invocation payload, camelCased for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallAnnotation {
    pub state: ToolCallState,
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_related_questions_wire_shape() {
        let annotation = Annotation::RelatedQuestions(RelatedQuestions {
            items: vec![RelatedQuestion {
                query: "What is the population of Paris?".into(),
            }],
        });
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "related-questions",
                "data": { "items": [{ "query": "What is the population of Paris?" }] }
            })
        );
    }

    #[test]
    fn test_loading_placeholder_has_no_items() {
        let value = serde_json::to_value(Annotation::related_questions_loading()).unwrap();
        assert_eq!(value["data"]["items"], json!([]));
    }

    #[test]
    fn test_reasoning_timing_omits_missing_text() {
        let annotation = Annotation::ReasoningTiming(ReasoningTiming {
            time_ms: 1250,
            reasoning: None,
        });
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value, json!({ "type": "reasoning-timing", "data": { "time": 1250 } }));
    }

    #[test]
    fn test_tool_call_annotation_camel_case() {
        let annotation = Annotation::ToolCallResult(ToolCallAnnotation {
            state: ToolCallState::Call,
            tool_call_id: "call_1".into(),
            tool_name: "search".into(),
            args: json!({ "query": "capital of france" }),
            result: None,
        });
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["type"], "tool-call-result");
        assert_eq!(value["data"]["toolCallId"], "call_1");
        assert_eq!(value["data"]["state"], "call");
        assert!(value["data"].get("result").is_none());

        let parsed: Annotation = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.kind(), "tool-call-result");
    }
}
