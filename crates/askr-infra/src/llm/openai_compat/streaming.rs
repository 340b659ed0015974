//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] events to the
//! provider-agnostic [`StreamEvent`] enum defined in `askr-types`.
//!
//! Reasoning models served over the chat completions protocol put their
//! thinking inline between `<think>` and `</think>`. When tag splitting is
//! on, that span is emitted as [`StreamEvent::ThinkingDelta`].

use futures_util::StreamExt;

use async_openai::types::chat::{ChatCompletionResponseStream, FinishReason};

use askr_core::llm::provider::LlmEventStream;
use askr_types::llm::{LlmError, StopReason, StreamEvent, Usage};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

pub(crate) fn map_finish_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Stop | FinishReason::ContentFilter => StopReason::EndTurn,
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::ToolUse,
    }
}

/// Splits streamed text into thinking and answer deltas on `<think>` tags.
///
/// Tags may be cut across chunks, so a possible tag prefix at the end of a
/// chunk is held back until the next one arrives.
#[derive(Debug, Default)]
pub struct ThinkTagSplitter {
    in_think: bool,
    pending: String,
}

impl ThinkTagSplitter {
    pub fn push(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.pending.push_str(chunk);
        let mut events = Vec::new();

        loop {
            let tag = if self.in_think { THINK_CLOSE } else { THINK_OPEN };
            match self.pending.find(tag) {
                Some(pos) => {
                    let before: String = self.pending.drain(..pos).collect();
                    self.pending.drain(..tag.len());
                    self.emit(before, &mut events);
                    self.in_think = !self.in_think;
                }
                None => {
                    let keep = partial_suffix_len(&self.pending, tag);
                    let ready_len = self.pending.len() - keep;
                    let ready: String = self.pending.drain(..ready_len).collect();
                    self.emit(ready, &mut events);
                    break;
                }
            }
        }

        events
    }

    /// Flush held-back text at end of stream.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        self.emit(rest, &mut events);
        events
    }

    fn emit(&self, text: String, events: &mut Vec<StreamEvent>) {
        if text.is_empty() {
            return;
        }
        events.push(if self.in_think {
            StreamEvent::ThinkingDelta { thinking: text }
        } else {
            StreamEvent::TextDelta { text }
        });
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`.
fn partial_suffix_len(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&n| text.len() >= n && text.is_char_boundary(text.len() - n) && tag.starts_with(&text[text.len() - n..]))
        .unwrap_or(0)
}

/// Map an async-openai [`ChatCompletionResponseStream`] to a stream of [`StreamEvent`]s.
///
/// The returned stream emits events in this order:
/// 1. `Connected` -- immediately on entry
/// 2. `TextDelta` / `ThinkingDelta` -- for each content chunk
/// 3. `MessageDelta` -- with the stop reason when finish_reason appears
/// 4. `Usage` -- token usage (requires `stream_options.include_usage = true`)
/// 5. `Done` -- at the end of the stream
pub fn map_openai_stream(stream: ChatCompletionResponseStream, split_think_tags: bool) -> LlmEventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut stream = stream;
        let mut splitter = split_think_tags.then(ThinkTagSplitter::default);

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| LlmError::Stream(e.to_string()))?;

            // The final chunk carries usage with an empty choices array.
            if let Some(usage) = chunk.usage.as_ref() {
                yield StreamEvent::Usage(Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                });
            }

            for choice in &chunk.choices {
                if let Some(text) = choice.delta.content.as_deref().filter(|t| !t.is_empty()) {
                    match splitter.as_mut() {
                        Some(splitter) => {
                            for event in splitter.push(text) {
                                yield event;
                            }
                        }
                        None => yield StreamEvent::TextDelta { text: text.to_string() },
                    }
                }

                if let Some(finish_reason) = choice.finish_reason.as_ref() {
                    if let Some(splitter) = splitter.as_mut() {
                        for event in splitter.finish() {
                            yield event;
                        }
                    }
                    yield StreamEvent::MessageDelta {
                        stop_reason: map_finish_reason(finish_reason),
                    };
                }
            }
        }

        if let Some(splitter) = splitter.as_mut() {
            for event in splitter.finish() {
                yield event;
            }
        }

        yield StreamEvent::Done;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunks: &[&str]) -> Vec<StreamEvent> {
        let mut splitter = ThinkTagSplitter::default();
        let mut out: Vec<StreamEvent> = chunks.iter().flat_map(|c| splitter.push(c)).collect();
        out.extend(splitter.finish());
        out
    }

    fn thinking(s: &str) -> StreamEvent {
        StreamEvent::ThinkingDelta { thinking: s.into() }
    }

    fn text(s: &str) -> StreamEvent {
        StreamEvent::TextDelta { text: s.into() }
    }

    #[test]
    fn test_splitter_plain_text_passes_through() {
        assert_eq!(collect(&["Hello", " world"]), vec![text("Hello"), text(" world")]);
    }

    #[test]
    fn test_splitter_separates_think_block() {
        assert_eq!(
            collect(&["<think>step one</think>Paris"]),
            vec![thinking("step one"), text("Paris")]
        );
    }

    #[test]
    fn test_splitter_handles_tags_split_across_chunks() {
        assert_eq!(
            collect(&["<thi", "nk>ponder", "ing</th", "ink>Answer"]),
            vec![thinking("ponder"), thinking("ing"), text("Answer")]
        );
    }

    #[test]
    fn test_splitter_flushes_false_tag_prefix() {
        assert_eq!(collect(&["a <", "b"]), vec![text("a "), text("<b")]);
        assert_eq!(collect(&["x <th"]), vec![text("x "), text("<th")]);
    }

    #[test]
    fn test_partial_suffix_len() {
        assert_eq!(partial_suffix_len("abc<thi", THINK_OPEN), 4);
        assert_eq!(partial_suffix_len("abc", THINK_OPEN), 0);
        assert_eq!(partial_suffix_len("é", THINK_OPEN), 0);
    }

    #[test]
    fn test_finish_reason_to_stop_reason_mapping() {
        assert_eq!(map_finish_reason(&FinishReason::Stop), StopReason::EndTurn);
        assert_eq!(map_finish_reason(&FinishReason::Length), StopReason::MaxTokens);
        assert_eq!(map_finish_reason(&FinishReason::ToolCalls), StopReason::ToolUse);
        assert_eq!(map_finish_reason(&FinishReason::ContentFilter), StopReason::EndTurn);
    }
}
