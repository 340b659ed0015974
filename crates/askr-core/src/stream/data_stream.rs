//! Data stream wire format and writer.
//!
//! The outbound response body is a sequence of newline-terminated frames
//! `CODE:JSON`, compatible with the AI SDK data stream protocol:
//!
//! | code | part            | payload                                   |
//! |------|-----------------|-------------------------------------------|
//! | `f`  | start step      | `{"messageId": "..."}`                    |
//! | `0`  | text delta      | JSON string                               |
//! | `g`  | reasoning delta | JSON string                               |
//! | `8`  | annotations     | JSON array                                |
//! | `3`  | error           | JSON string                               |
//! | `e`  | finish step     | `{"finishReason", "usage", "isContinued"}` |
//! | `d`  | finish message  | `{"finishReason", "usage"}`               |

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use pin_project_lite::pin_project;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

use askr_types::annotation::Annotation;
use askr_types::error::ChatError;
use askr_types::llm::Usage;

/// Response header announcing the data stream protocol version.
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";

/// One frame of the outbound stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DataStreamPart {
    StartStep { message_id: String },
    Text(String),
    Reasoning(String),
    Annotations(Vec<Annotation>),
    Error(String),
    FinishStep { finish_reason: String, usage: Usage },
    FinishMessage { finish_reason: String, usage: Usage },
}

impl DataStreamPart {
    pub fn code(&self) -> char {
        match self {
            DataStreamPart::StartStep { .. } => 'f',
            DataStreamPart::Text(_) => '0',
            DataStreamPart::Reasoning(_) => 'g',
            DataStreamPart::Annotations(_) => '8',
            DataStreamPart::Error(_) => '3',
            DataStreamPart::FinishStep { .. } => 'e',
            DataStreamPart::FinishMessage { .. } => 'd',
        }
    }

    fn payload(&self) -> Value {
        match self {
            DataStreamPart::StartStep { message_id } => json!({ "messageId": message_id }),
            DataStreamPart::Text(text) | DataStreamPart::Reasoning(text) | DataStreamPart::Error(text) => {
                Value::String(text.clone())
            }
            DataStreamPart::Annotations(annotations) => Value::Array(
                annotations
                    .iter()
                    .map(|a| serde_json::to_value(a).unwrap_or(Value::Null))
                    .collect(),
            ),
            DataStreamPart::FinishStep { finish_reason, usage } => json!({
                "finishReason": finish_reason,
                "usage": usage_json(usage),
                "isContinued": false,
            }),
            DataStreamPart::FinishMessage { finish_reason, usage } => json!({
                "finishReason": finish_reason,
                "usage": usage_json(usage),
            }),
        }
    }

    /// Encode as a single newline-terminated frame.
    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.code(), self.payload())
    }
}

fn usage_json(usage: &Usage) -> Value {
    json!({
        "promptTokens": usage.input_tokens,
        "completionTokens": usage.output_tokens,
    })
}

/// Create a bounded data stream channel.
///
/// Returns the writer used by the turn task and the body stream read by the
/// HTTP response. Dropping the body stream cancels `cancel`.
pub fn channel(capacity: usize, cancel: CancellationToken) -> (DataStreamWriter, DataStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let writer = DataStreamWriter { tx };
    let stream = DataStream {
        inner: ReceiverStream::new(rx),
        _guard: cancel.drop_guard(),
    };
    (writer, stream)
}

/// Sending half of a data stream.
#[derive(Clone, Debug)]
pub struct DataStreamWriter {
    tx: mpsc::Sender<DataStreamPart>,
}

impl DataStreamWriter {
    /// Send one frame. Fails with `ChatError::Cancelled` once the reader is gone.
    pub async fn write(&self, part: DataStreamPart) -> Result<(), ChatError> {
        self.tx.send(part).await.map_err(|_| ChatError::Cancelled)
    }

    pub async fn text(&self, text: impl Into<String>) -> Result<(), ChatError> {
        self.write(DataStreamPart::Text(text.into())).await
    }

    pub async fn reasoning(&self, text: impl Into<String>) -> Result<(), ChatError> {
        self.write(DataStreamPart::Reasoning(text.into())).await
    }

    pub async fn annotation(&self, annotation: Annotation) -> Result<(), ChatError> {
        self.write(DataStreamPart::Annotations(vec![annotation])).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<(), ChatError> {
        self.write(DataStreamPart::Error(message.into())).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pin_project! {
    /// Receiving half of a data stream, used as the response body.
    ///
    /// Holds the turn's cancellation guard: dropping the body cancels the turn.
    pub struct DataStream {
        #[pin]
        inner: ReceiverStream<DataStreamPart>,
        _guard: DropGuard,
    }
}

impl Stream for DataStream {
    type Item = DataStreamPart;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askr_types::annotation::{RelatedQuestion, RelatedQuestions};
    use futures_util::StreamExt;

    #[test]
    fn test_encode_text_escapes() {
        let part = DataStreamPart::Text("Hello, \"world\"\n".to_string());
        assert_eq!(part.encode(), "0:\"Hello, \\\"world\\\"\\n\"\n");
    }

    /// Split a frame into its code and parsed JSON payload.
    fn decode(frame: &str) -> (char, Value) {
        assert!(frame.ends_with('\n'));
        let (code, payload) = frame.trim_end().split_once(':').unwrap();
        (code.chars().next().unwrap(), serde_json::from_str(payload).unwrap())
    }

    #[test]
    fn test_encode_control_frames() {
        assert_eq!(
            decode(&DataStreamPart::StartStep { message_id: "msg-1".into() }.encode()),
            ('f', json!({ "messageId": "msg-1" }))
        );
        assert_eq!(DataStreamPart::Reasoning("hm".into()).encode(), "g:\"hm\"\n");
        assert_eq!(DataStreamPart::Error("boom".into()).encode(), "3:\"boom\"\n");

        let usage = Usage { input_tokens: 12, output_tokens: 3 };
        assert_eq!(
            decode(
                &DataStreamPart::FinishMessage { finish_reason: "stop".into(), usage: usage.clone() }
                    .encode()
            ),
            (
                'd',
                json!({ "finishReason": "stop", "usage": { "promptTokens": 12, "completionTokens": 3 } })
            )
        );
        let (code, step) = decode(&DataStreamPart::FinishStep { finish_reason: "stop".into(), usage }.encode());
        assert_eq!(code, 'e');
        assert_eq!(step["isContinued"], false);
    }

    #[test]
    fn test_encode_annotations_as_array() {
        let part = DataStreamPart::Annotations(vec![Annotation::RelatedQuestions(RelatedQuestions {
            items: vec![RelatedQuestion { query: "q".into() }],
        })]);
        assert_eq!(
            decode(&part.encode()),
            ('8', json!([{ "type": "related-questions", "data": { "items": [{ "query": "q" }] } }]))
        );
    }

    #[tokio::test]
    async fn test_dropping_body_cancels_token() {
        let cancel = CancellationToken::new();
        let (writer, mut body) = channel(4, cancel.clone());

        writer.text("hi").await.unwrap();
        assert_eq!(body.next().await, Some(DataStreamPart::Text("hi".into())));
        assert!(!cancel.is_cancelled());

        drop(body);
        assert!(cancel.is_cancelled());
        assert!(writer.is_closed());
        assert!(matches!(writer.text("late").await, Err(ChatError::Cancelled)));
    }

    #[tokio::test]
    async fn test_body_ends_when_writers_drop() {
        let (writer, body) = channel(4, CancellationToken::new());
        writer.error("boom").await.unwrap();
        drop(writer);
        let parts: Vec<DataStreamPart> = body.collect().await;
        assert_eq!(parts, vec![DataStreamPart::Error("boom".into())]);
    }
}
