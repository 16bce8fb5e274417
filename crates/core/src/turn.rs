//! The result of processing one turn.

use serde::{Deserialize, Serialize};

use crate::stream::{FinishReason, Usage};
use crate::tool::ToolCall;

/// Everything one turn produced, returned to the caller.
///
/// `tool_results` is positionally aligned 1:1 with `tool_calls`; a failed
/// call holds a structured error object at its position. `error` and a
/// populated `response`/`tool_calls` are not expected to co-occur —
/// reasoning-only output is the one valid low-content success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Final response text (after sanitizing and reasoning promotion).
    pub response: String,

    /// Accumulated reasoning text.
    pub reasoning: String,

    /// The last non-empty finish reason seen on the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Assembled tool calls, ordered by stream index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// One result per tool call, same order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<serde_json::Value>,

    /// Error description, if the turn failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the sanitizer unwrapped a code-fenced structured payload.
    #[serde(default)]
    pub used_structured_output: bool,

    /// Token usage reported by the stream, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ProcessingResult {
    /// A failed turn: records the error alongside whatever partial text was
    /// gathered before the failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(FinishReason::Error),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Did this turn produce anything committable?
    pub fn has_valid_response(&self) -> bool {
        self.error.is_none()
            && (!self.response.is_empty()
                || !self.reasoning.is_empty()
                || !self.tool_calls.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_has_error_finish() {
        let r = ProcessingResult::failed("stream interrupted");
        assert_eq!(r.finish_reason, Some(FinishReason::Error));
        assert_eq!(r.error.as_deref(), Some("stream interrupted"));
        assert!(!r.has_valid_response());
    }

    #[test]
    fn reasoning_only_is_valid() {
        let r = ProcessingResult {
            reasoning: "thought hard".into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        };
        assert!(r.has_valid_response());
    }

    #[test]
    fn empty_stop_is_not_valid() {
        let r = ProcessingResult {
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        };
        assert!(!r.has_valid_response());
    }
}
