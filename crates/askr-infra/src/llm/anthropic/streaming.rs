//! SSE stream creation and state machine for the Anthropic Messages API.
//!
//! Event order on the wire:
//! 1. `message_start` -- message object with initial usage
//! 2. Per block: `content_block_start` -> N x `content_block_delta` -> `content_block_stop`
//! 3. `message_delta` -- stop_reason and cumulative output usage
//! 4. `message_stop` -- final event
//!
//! `ping` events may appear anywhere; `error` events may appear mid-stream.
//! Thinking blocks arrive as `thinking_delta` and map to
//! [`StreamEvent::ThinkingDelta`].

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use askr_core::llm::provider::LlmEventStream;
use askr_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::types::{
    AnthropicDelta, AnthropicRequest, ContentBlockDeltaPayload, ErrorPayload, MessageDeltaPayload,
    MessageStartPayload,
};

/// Per-stream state carried between SSE events.
#[derive(Default)]
struct StreamState {
    input_tokens: u32,
}

/// Map an Anthropic `stop_reason` string to [`StopReason`].
pub(crate) fn parse_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        Some("pause_turn") => StopReason::PauseTurn,
        _ => StopReason::EndTurn,
    }
}

/// Map a non-success HTTP status to an [`LlmError`].
pub(crate) fn error_for_status(status: reqwest::StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        529 => LlmError::Overloaded(body),
        400 => LlmError::InvalidRequest(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Process one SSE event into zero or more [`StreamEvent`]s.
fn process_event(
    event_type: &str,
    data: &str,
    state: &mut StreamState,
) -> Result<Vec<StreamEvent>, LlmError> {
    let mut events = Vec::new();

    match event_type {
        "message_start" => {
            let payload: MessageStartPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("message_start: {e}")))?;
            if let Some(usage) = payload.message.usage {
                state.input_tokens = usage.input_tokens;
            }
            events.push(StreamEvent::Connected);
        }

        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_delta: {e}")))?;
            match payload.delta {
                AnthropicDelta::TextDelta { text } => {
                    events.push(StreamEvent::TextDelta { text });
                }
                AnthropicDelta::ThinkingDelta { thinking } => {
                    events.push(StreamEvent::ThinkingDelta { thinking });
                }
                AnthropicDelta::SignatureDelta { .. } | AnthropicDelta::Other => {}
            }
        }

        "message_delta" => {
            let payload: MessageDeltaPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("message_delta: {e}")))?;
            events.push(StreamEvent::Usage(Usage {
                input_tokens: state.input_tokens.max(payload.usage.input_tokens),
                output_tokens: payload.usage.output_tokens,
            }));
            events.push(StreamEvent::MessageDelta {
                stop_reason: parse_stop_reason(payload.delta.stop_reason.as_deref()),
            });
        }

        "message_stop" => {
            events.push(StreamEvent::Done);
        }

        "content_block_start" | "content_block_stop" | "ping" => {}

        "error" => {
            let payload: ErrorPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("error event: {e}")))?;
            return Err(match payload.error.error_type.as_str() {
                "overloaded_error" => LlmError::Overloaded(payload.error.message),
                "rate_limit_error" => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                "authentication_error" => LlmError::AuthenticationFailed,
                _ => LlmError::Provider {
                    message: payload.error.message,
                },
            });
        }

        unknown => {
            tracing::warn!(event_type = unknown, "unknown Anthropic event type, skipping");
        }
    }

    Ok(events)
}

/// Create a streaming SSE connection to the Anthropic Messages API.
///
/// Sends the request, checks the status, then decodes the SSE body. The
/// stream always ends with [`StreamEvent::Done`] unless it fails first.
pub fn create_anthropic_stream(
    client: &reqwest::Client,
    url: &str,
    body: AnthropicRequest,
    api_key: &SecretString,
    api_version: &'static str,
) -> LlmEventStream {
    let client = client.clone();
    let url = url.to_string();
    let api_key = api_key.expose_secret().to_string();

    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "Anthropic stream API error response");
            Err::<(), LlmError>(error_for_status(status, error_body))?;
            return;
        }

        let mut state = StreamState::default();
        let mut sse = response.bytes_stream().eventsource();
        let mut finished = false;

        while let Some(event) = sse.next().await {
            let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;
            for out in process_event(&event.event, &event.data, &mut state)? {
                finished |= matches!(out, StreamEvent::Done);
                yield out;
            }
            if finished {
                break;
            }
        }

        if !finished {
            yield StreamEvent::Done;
        }
    })
}
