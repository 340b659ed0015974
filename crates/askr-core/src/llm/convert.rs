//! Conversion from stored message payloads to provider messages.

use askr_types::chat::{AssistantPart, MessagePayload};
use askr_types::llm::{Message, MessageRole};

/// Convert stored payloads into the uniform LLM message list.
///
/// - `data` messages are dropped (annotations are client-side only)
/// - assistant reasoning parts are dropped
/// - tool calls and tool results are rendered as assistant text
/// - system payloads are dropped; the system prompt is supplied per request
///
/// Adjacent messages with the same role are merged so the result alternates
/// between user and assistant turns.
pub fn to_llm_messages<'a, I>(payloads: I) -> Vec<Message>
where
    I: IntoIterator<Item = &'a MessagePayload>,
{
    let mut out: Vec<Message> = Vec::new();
    for payload in payloads {
        let Some((role, content)) = render(payload) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&content);
            }
            _ => out.push(Message { role, content }),
        }
    }
    out
}

fn render(payload: &MessagePayload) -> Option<(MessageRole, String)> {
    match payload {
        MessagePayload::User { content } => Some((MessageRole::User, content.clone())),
        MessagePayload::Assistant { parts } => {
            let rendered: Vec<String> = parts
                .iter()
                .filter_map(|part| match part {
                    AssistantPart::Text { text } => Some(text.clone()),
                    AssistantPart::Reasoning { .. } => None,
                    AssistantPart::ToolCall { tool_name, args, .. } => {
                        Some(format!("Called tool `{tool_name}` with arguments: {args}"))
                    }
                })
                .collect();
            Some((MessageRole::Assistant, rendered.join("\n\n")))
        }
        MessagePayload::Tool { tool_name, result, .. } => Some((
            MessageRole::Assistant,
            format!("Result of tool `{tool_name}`: {result}"),
        )),
        MessagePayload::System { .. } | MessagePayload::Data { .. } => None,
    }
}
