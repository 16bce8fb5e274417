//! Provider trait and streaming wire types.
//!
//! A Provider knows how to send a conversation to an LLM service and yield
//! the response as a stream of chunks. The engine consumes that stream
//! without knowing which backend produced it — pure polymorphism.
//!
//! The chunk shape mirrors what streaming chat-completion APIs actually
//! emit: text deltas, reasoning deltas, and tool-call fragments that arrive
//! scattered across many chunks and must be reassembled by index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StreamError;
use crate::message::Message;

/// Why the model stopped emitting chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Normal completion.
    Stop,
    /// The model is requesting tool execution.
    ToolCalls,
    /// The stream terminated abnormally.
    Error,
    /// Provider-specific value with no loop semantics (e.g. "length").
    #[serde(untagged)]
    Other(String),
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::ToolCalls => "tool_calls",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

/// A partial piece of one tool call, delivered across multiple chunks.
///
/// `index` is the position of the tool call within the turn; fragments for
/// the same index concatenate in arrival order. `id` and `name` typically
/// appear only on the first fragment for an index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallFragment {
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Partial argument text; may be empty on fragments that only carry id/name.
    #[serde(default)]
    pub arguments_fragment: String,
}

/// Token usage information, typically attached to the final chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming response. Ephemeral: produced and consumed
/// within one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial response text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_content: Option<String>,

    /// Partial reasoning text (models with visible reasoning).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_reasoning: Option<String>,

    /// Tool-call fragments carried by this chunk, in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_fragments: Vec<ToolCallFragment>,

    /// Present on the terminal chunk (and only meaningful there).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Usage info (typically only on the final chunk).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// A pure text delta.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            delta_content: Some(text.into()),
            ..Self::default()
        }
    }

    /// A pure reasoning delta.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            delta_reasoning: Some(text.into()),
            ..Self::default()
        }
    }

    /// A terminal chunk carrying only a finish reason.
    pub fn finish(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools, passed through verbatim from the registry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A receiver of stream chunks for one turn.
pub type ChunkReceiver = tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, StreamError>>;

/// The model stream source.
///
/// Awaiting `stream()` performs the request and unwraps to the chunk
/// sequence; the sequence must eventually terminate with a meaningful
/// finish reason on its last chunk.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter", "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a stream of response chunks.
    async fn stream(&self, request: ProviderRequest)
        -> std::result::Result<ChunkReceiver, StreamError>;
}
