//! Streaming response accumulator.
//!
//! Drains one turn's chunk stream: response text and reasoning text build up
//! in separate buffers, tool-call fragments are handed to the assembler
//! unchanged, and the last finish reason and usage report are tracked. A
//! caller-supplied async callback sees every text delta as it arrives —
//! reasoning included, so it streams visually like ordinary content — and is
//! awaited, so a slow callback throttles ingestion.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::trace;

use turnstile_core::error::{EngineError, Error};
use turnstile_core::stream::{ChunkReceiver, FinishReason, Usage};
use turnstile_core::tool::ToolCall;

use crate::assembler::ToolCallAssembler;

/// Async per-chunk text callback. Invoked with each content and reasoning
/// delta, then once more with the final chunk's content (or empty text) as a
/// completion marker. Failures abort the turn.
pub type ChunkSink =
    Arc<dyn Fn(String) -> BoxFuture<'static, turnstile_core::Result<()>> + Send + Sync>;

/// Accumulates one turn's stream. Fresh per turn — no state crosses turns.
#[derive(Default)]
pub struct StreamAccumulator {
    response: String,
    reasoning: String,
    assembler: ToolCallAssembler,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    last_content: String,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the stream to completion.
    ///
    /// On error (stream failure or callback failure) the buffers keep
    /// whatever partial text was gathered, so the caller can surface it.
    pub async fn drain(
        &mut self,
        mut rx: ChunkReceiver,
        on_chunk: Option<&ChunkSink>,
    ) -> Result<(), Error> {
        while let Some(item) = rx.recv().await {
            let chunk = item?;

            self.last_content = chunk.delta_content.clone().unwrap_or_default();

            if let Some(text) = chunk.delta_content {
                if !text.is_empty() {
                    self.response.push_str(&text);
                    self.forward(on_chunk, text).await?;
                }
            }

            if let Some(text) = chunk.delta_reasoning {
                if !text.is_empty() {
                    self.reasoning.push_str(&text);
                    // Reasoning streams through the same sink as content.
                    self.forward(on_chunk, text).await?;
                }
            }

            if !chunk.tool_call_fragments.is_empty() {
                trace!(
                    fragments = chunk.tool_call_fragments.len(),
                    "Forwarding tool call fragments"
                );
                self.assembler.add_fragments(&chunk.tool_call_fragments);
            }

            if let Some(reason) = chunk.finish_reason {
                self.finish_reason = Some(reason);
            }

            if let Some(usage) = chunk.usage {
                self.usage = Some(usage);
            }
        }

        // Completion marker: the final chunk's content, or empty text.
        let marker = std::mem::take(&mut self.last_content);
        self.forward(on_chunk, marker).await?;

        Ok(())
    }

    async fn forward(&self, on_chunk: Option<&ChunkSink>, text: String) -> Result<(), Error> {
        if let Some(sink) = on_chunk {
            sink(text)
                .await
                .map_err(|e| Error::Engine(EngineError::CallbackFailed(e.to_string())))?;
        }
        Ok(())
    }

    /// Accumulated response text (possibly partial after an error).
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Accumulated reasoning text.
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Last non-empty finish reason seen on the stream.
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.finish_reason.as_ref()
    }

    /// Usage report from the stream, if one arrived.
    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    /// Whether the terminal finish reason signals tool use.
    pub fn wants_tools(&self) -> bool {
        self.finish_reason == Some(FinishReason::ToolCalls)
    }

    /// The assembled tool calls, ordered by index.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.assembler.tool_calls()
    }

    /// Tear down into (response, reasoning) buffers.
    pub fn into_buffers(self) -> (String, String) {
        (self.response, self.reasoning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use turnstile_core::error::StreamError;
    use turnstile_core::stream::{StreamChunk, ToolCallFragment};

    fn channel_of(
        chunks: Vec<Result<StreamChunk, StreamError>>,
    ) -> ChunkReceiver {
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        tokio::spawn(async move {
            for chunk in chunks {
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn collecting_sink() -> (ChunkSink, Arc<Mutex<Vec<String>>>) {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_sink = seen.clone();
        let sink: ChunkSink = Arc::new(move |text| {
            let seen = seen_in_sink.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(text);
                Ok(())
            })
        });
        (sink, seen)
    }

    #[tokio::test]
    async fn accumulates_content_and_reasoning_separately() {
        let rx = channel_of(vec![
            Ok(StreamChunk::reasoning("let me think")),
            Ok(StreamChunk::content("Hello")),
            Ok(StreamChunk::content(", world")),
            Ok(StreamChunk::finish(FinishReason::Stop)),
        ]);

        let mut acc = StreamAccumulator::new();
        acc.drain(rx, None).await.unwrap();

        assert_eq!(acc.response(), "Hello, world");
        assert_eq!(acc.reasoning(), "let me think");
        assert_eq!(acc.finish_reason(), Some(&FinishReason::Stop));
        assert!(!acc.wants_tools());
    }

    #[tokio::test]
    async fn callback_sees_content_reasoning_and_completion_marker() {
        let (sink, seen) = collecting_sink();
        let rx = channel_of(vec![
            Ok(StreamChunk::reasoning("hmm")),
            Ok(StreamChunk::content("Hi")),
            Ok(StreamChunk::finish(FinishReason::Stop)),
        ]);

        let mut acc = StreamAccumulator::new();
        acc.drain(rx, Some(&sink)).await.unwrap();

        // hmm, Hi, then the final chunk's (empty) content as the marker.
        assert_eq!(*seen.lock().unwrap(), vec!["hmm", "Hi", ""]);
    }

    #[tokio::test]
    async fn callback_failure_propagates() {
        let sink: ChunkSink = Arc::new(|_| {
            Box::pin(async {
                Err(turnstile_core::Error::Internal("sink closed".into()))
            })
        });
        let rx = channel_of(vec![Ok(StreamChunk::content("x"))]);

        let mut acc = StreamAccumulator::new();
        let err = acc.drain(rx, Some(&sink)).await.unwrap_err();
        assert!(err.to_string().contains("sink closed"));
    }

    #[tokio::test]
    async fn stream_error_preserves_partial_text() {
        let rx = channel_of(vec![
            Ok(StreamChunk::content("partial ")),
            Err(StreamError::Interrupted("connection reset".into())),
        ]);

        let mut acc = StreamAccumulator::new();
        let err = acc.drain(rx, None).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(acc.response(), "partial ");
    }

    #[tokio::test]
    async fn fragments_reach_the_assembler() {
        let rx = channel_of(vec![
            Ok(StreamChunk {
                tool_call_fragments: vec![ToolCallFragment {
                    index: 0,
                    id: Some("call_1".into()),
                    name: Some("echo".into()),
                    arguments_fragment: "{\"text\":".into(),
                }],
                ..Default::default()
            }),
            Ok(StreamChunk {
                tool_call_fragments: vec![ToolCallFragment {
                    index: 0,
                    arguments_fragment: "\"hi\"}".into(),
                    ..Default::default()
                }],
                finish_reason: Some(FinishReason::ToolCalls),
                ..Default::default()
            }),
        ]);

        let mut acc = StreamAccumulator::new();
        acc.drain(rx, None).await.unwrap();

        assert!(acc.wants_tools());
        let calls = acc.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments, "{\"text\":\"hi\"}");
    }

    #[tokio::test]
    async fn last_finish_reason_wins() {
        let rx = channel_of(vec![
            Ok(StreamChunk::finish(FinishReason::Other("length".into()))),
            Ok(StreamChunk::finish(FinishReason::Stop)),
        ]);

        let mut acc = StreamAccumulator::new();
        acc.drain(rx, None).await.unwrap();
        assert_eq!(acc.finish_reason(), Some(&FinishReason::Stop));
    }

    #[tokio::test]
    async fn usage_is_tracked() {
        let rx = channel_of(vec![Ok(StreamChunk {
            finish_reason: Some(FinishReason::Stop),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            ..Default::default()
        })]);

        let mut acc = StreamAccumulator::new();
        acc.drain(rx, None).await.unwrap();
        assert_eq!(acc.usage().unwrap().total_tokens, 15);
    }
}
