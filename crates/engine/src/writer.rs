//! Conversation state writer — atomic commit of one turn.
//!
//! History must never contain a user turn without its paired outcome, so
//! nothing is written until the whole turn is known to be valid: commit the
//! user message, the assistant message, and one tool message per tool result
//! — or commit nothing at all.

use std::sync::Arc;

use tracing::{debug, warn};

use turnstile_core::error::StoreError;
use turnstile_core::message::Message;
use turnstile_core::store::ConversationStore;
use turnstile_core::turn::ProcessingResult;

/// Stored in place of response text that trips the completeness check.
pub const INCOMPLETE_PLACEHOLDER: &str = "I wasn't able to produce a complete response.";

/// Turn completeness predicate: is this response text committable verbatim?
pub type CompletenessCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// What the writer did with a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The turn was committed; `messages` were appended.
    Committed { messages: usize },
    /// The turn was invalid; the store was left untouched.
    Skipped,
}

/// Commits one complete turn (or nothing) to the conversation store.
pub struct TurnWriter {
    completeness: CompletenessCheck,
}

impl Default for TurnWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnWriter {
    /// A writer with the standard completeness check: structured responses
    /// that carry intermediate sections but no final one are withheld.
    pub fn new() -> Self {
        Self {
            completeness: Arc::new(|text| !looks_like_partial_structured(text)),
        }
    }

    /// Replace the completeness predicate. `Arc::new(|_| true)` restores
    /// fully permissive behavior.
    pub fn with_completeness(mut self, check: CompletenessCheck) -> Self {
        self.completeness = check;
        self
    }

    /// Commit the turn if it is valid; otherwise leave the store untouched.
    ///
    /// Validity is decided before the first write, which is what makes the
    /// commit all-or-nothing against an append-only store.
    pub fn commit(
        &self,
        store: &dyn ConversationStore,
        user_message: &str,
        result: &ProcessingResult,
    ) -> Result<CommitOutcome, StoreError> {
        if !result.has_valid_response() {
            debug!(
                error = result.error.as_deref().unwrap_or("none"),
                "Turn not committable, leaving store untouched"
            );
            return Ok(CommitOutcome::Skipped);
        }

        store.store_message(Message::user(user_message))?;

        let content = if !result.response.is_empty() {
            if (self.completeness)(&result.response) {
                result.response.clone()
            } else {
                warn!("Response looks like an incomplete structured payload, storing placeholder");
                INCOMPLETE_PLACEHOLDER.to_string()
            }
        } else if !result.reasoning.is_empty() {
            result.reasoning.clone()
        } else {
            String::new()
        };

        let assistant = Message::assistant(content)
            .with_reasoning(result.reasoning.clone())
            .with_tool_calls(result.tool_calls.clone());
        store.store_message(assistant)?;

        let mut appended = 2;
        for (call, tool_result) in result.tool_calls.iter().zip(result.tool_results.iter()) {
            let text = serde_json::to_string(tool_result)
                .unwrap_or_else(|_| format!("{tool_result:?}"));
            store.store_message(Message::tool_result(&call.id, &call.name, text))?;
            appended += 1;
        }

        Ok(CommitOutcome::Committed { messages: appended })
    }
}

/// A structured response that opens intermediate sections ("analysis",
/// "commentary") without ever reaching a "final" section was cut off
/// mid-payload. Narrow pattern match, not schema validation.
pub fn looks_like_partial_structured(text: &str) -> bool {
    let t = text.trim_start();
    if !t.starts_with('{') {
        return false;
    }
    (t.contains("\"analysis\"") || t.contains("\"commentary\"")) && !t.contains("\"final\"")
}
