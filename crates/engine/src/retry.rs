//! Degenerate-turn retry policy.
//!
//! Some model backends occasionally report a clean stop while producing
//! nothing at all: no text, no reasoning, no tool calls. Such a turn is
//! re-requested with linear backoff before being given up on.

use std::time::Duration;

use turnstile_core::stream::FinishReason;
use turnstile_core::turn::ProcessingResult;

/// Bounded linear-backoff retry for degenerate turns.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (3 = one try + two retries).
    pub max_attempts: u32,

    /// Backoff unit: the wait before retry N is `base_delay × N`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A degenerate turn: normal completion with nothing usable in it.
    ///
    /// A reasoning-only turn is NOT degenerate — some models legitimately
    /// answer entirely in the reasoning channel.
    pub fn is_degenerate(&self, result: &ProcessingResult) -> bool {
        result.error.is_none()
            && result.response.is_empty()
            && result.reasoning.is_empty()
            && result.tool_calls.is_empty()
            && result.finish_reason == Some(FinishReason::Stop)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Linear backoff: 1× base after the first attempt, 2× after the second.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_stop() -> ProcessingResult {
        ProcessingResult {
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    #[test]
    fn empty_stop_is_degenerate() {
        let policy = RetryPolicy::default();
        assert!(policy.is_degenerate(&empty_stop()));
    }

    #[test]
    fn reasoning_only_is_not_degenerate() {
        let policy = RetryPolicy::default();
        let mut result = empty_stop();
        result.reasoning = "thought about it".into();
        assert!(!policy.is_degenerate(&result));
    }

    #[test]
    fn tool_calls_are_not_degenerate() {
        let policy = RetryPolicy::default();
        let mut result = empty_stop();
        result.finish_reason = Some(FinishReason::ToolCalls);
        result.tool_calls = vec![turnstile_core::tool::ToolCall {
            id: "c1".into(),
            name: "echo".into(),
            arguments: "{}".into(),
        }];
        assert!(!policy.is_degenerate(&result));
    }

    #[test]
    fn errors_are_not_degenerate() {
        let policy = RetryPolicy::default();
        let mut result = empty_stop();
        result.error = Some("boom".into());
        assert!(!policy.is_degenerate(&result));
    }

    #[test]
    fn missing_finish_reason_is_not_degenerate() {
        let policy = RetryPolicy::default();
        let mut result = empty_stop();
        result.finish_reason = None;
        assert!(!policy.is_degenerate(&result));
    }

    #[test]
    fn backoff_is_strictly_increasing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert!(policy.delay_after(2) > policy.delay_after(1));
    }

    #[test]
    fn three_attempts_total() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }
}
