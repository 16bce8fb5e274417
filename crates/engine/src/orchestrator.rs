//! The turn engine — one streamed model exchange, end to end.
//!
//! `TurnEngine::process` drives a single turn:
//!
//! 1. **Fetch history** from the conversation store
//! 2. **Request a stream** from the provider
//! 3. **Accumulate** chunks (text, reasoning, tool-call fragments)
//! 4. **Execute tools** if the stream signaled tool use
//! 5. **Retry** with linear backoff if the turn came back degenerate
//! 6. **Sanitize** incidentally fenced structured output
//! 7. **Commit or discard** the turn atomically
//!
//! Tool results are returned to the caller, never resubmitted here: issuing
//! a follow-up turn with tool-result messages appended is the external
//! continuation policy's job.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use turnstile_core::error::EngineError;
use turnstile_core::event::{EventBus, TurnEvent};
use turnstile_core::message::Message;
use turnstile_core::model::ModelProfile;
use turnstile_core::store::ConversationStore;
use turnstile_core::stream::{Provider, ProviderRequest};
use turnstile_core::tool::{AgentContext, ToolRegistry};
use turnstile_core::turn::ProcessingResult;

use crate::accumulator::{ChunkSink, StreamAccumulator};
use crate::dispatcher::{DispatchStrategy, ToolDispatcher};
use crate::retry::RetryPolicy;
use crate::sanitizer::sanitize;
use crate::writer::{CommitOutcome, CompletenessCheck, TurnWriter};

/// Per-call options for one turn.
#[derive(Clone, Default)]
pub struct TurnOptions {
    /// Async callback invoked with every text delta (content and reasoning)
    /// plus a final completion marker. Awaited per chunk.
    pub on_chunk: Option<ChunkSink>,

    /// Wall-clock bound on the whole turn — stream consumption plus tool
    /// execution. On expiry nothing is committed.
    pub timeout: Option<Duration>,

    /// Identity injected into tool arguments (see [`AgentContext`]).
    pub agent_context: Option<AgentContext>,
}

/// The core turn orchestrator.
///
/// All collaborators are injected; state is call-local apart from the
/// dispatcher's per-tool convention cache, so one engine can serve
/// concurrent turns across different conversations without locking.
pub struct TurnEngine {
    provider: Arc<dyn Provider>,
    registry: Arc<dyn ToolRegistry>,
    dispatcher: ToolDispatcher,
    writer: TurnWriter,
    retry: RetryPolicy,
    events: Option<Arc<EventBus>>,

    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    profile: ModelProfile,
}

impl TurnEngine {
    /// Create a new turn engine.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        registry: Arc<dyn ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            registry: registry.clone(),
            dispatcher: ToolDispatcher::new(registry),
            writer: TurnWriter::new(),
            retry: RetryPolicy::default(),
            events: None,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            profile: ModelProfile::default(),
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the model's declared tool-calling capabilities (used only for
    /// the advisory dispatch-strategy label).
    pub fn with_model_profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Replace the degenerate-turn retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the writer's turn-completeness predicate.
    pub fn with_completeness(mut self, check: CompletenessCheck) -> Self {
        self.writer = self.writer.with_completeness(check);
        self
    }

    /// Publish turn and tool events to the given bus.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.dispatcher = self.dispatcher.with_event_bus(events.clone());
        self.events = Some(events);
        self
    }

    /// Process one user message: stream the model response, execute any
    /// tool calls, and commit the turn (or nothing) to `store`.
    pub async fn process(
        &self,
        user_message: &str,
        store: &dyn ConversationStore,
        options: TurnOptions,
    ) -> ProcessingResult {
        let turn = self.run_turn(user_message, store, &options);

        match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, turn).await {
                Ok(result) => result,
                Err(_) => {
                    let error = EngineError::TurnTimeout(limit.as_secs_f64());
                    warn!(model = %self.model, "{error}");
                    self.publish(TurnEvent::TurnDiscarded {
                        reason: error.to_string(),
                        timestamp: Utc::now(),
                    });
                    ProcessingResult::failed(error.to_string())
                }
            },
            None => turn.await,
        }
    }

    async fn run_turn(
        &self,
        user_message: &str,
        store: &dyn ConversationStore,
        options: &TurnOptions,
    ) -> ProcessingResult {
        let history = match store.retrieve_messages() {
            Ok(history) => history,
            Err(e) => return ProcessingResult::failed(format!("Failed to load history: {e}")),
        };

        info!(
            model = %self.model,
            history = history.len(),
            "Processing turn"
        );

        let mut messages = history;
        messages.push(Message::user(user_message));

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.registry.definitions(),
            stop: vec![],
        };

        let mut attempt = 1u32;
        let mut result = loop {
            let result = self.stream_once(&request, options).await;

            if self.retry.is_degenerate(&result) && self.retry.allows_retry(attempt) {
                let delay = self.retry.delay_after(attempt);
                warn!(
                    attempt,
                    delay_secs = delay.as_secs_f64(),
                    "Degenerate turn, re-issuing request"
                );
                self.publish(TurnEvent::TurnRetried {
                    attempt,
                    delay_secs: delay.as_secs_f64(),
                    timestamp: Utc::now(),
                });
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            break result;
        };

        // Reasoning-only turns are accepted; promote the reasoning into the
        // response field for downstream compatibility.
        if result.error.is_none() && result.response.is_empty() && !result.reasoning.is_empty() {
            result.response = result.reasoning.clone();
        }

        let (clean, structured) = sanitize(&result.response);
        result.response = clean;
        result.used_structured_output = structured;

        match self.writer.commit(store, user_message, &result) {
            Ok(CommitOutcome::Committed { messages }) => {
                debug!(messages, "Turn committed");
                self.publish(TurnEvent::TurnCompleted {
                    model: self.model.clone(),
                    tool_calls: result.tool_calls.len(),
                    tokens_used: result.usage.map(|u| u.total_tokens),
                    timestamp: Utc::now(),
                });
            }
            Ok(CommitOutcome::Skipped) => {
                self.publish(TurnEvent::TurnDiscarded {
                    reason: result
                        .error
                        .clone()
                        .unwrap_or_else(|| "empty turn".into()),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist turn");
                result.error = Some(format!("Failed to persist turn: {e}"));
            }
        }

        result
    }

    /// One stream request: accumulate chunks and, on a tool signal,
    /// dispatch the assembled calls.
    async fn stream_once(
        &self,
        request: &ProviderRequest,
        options: &TurnOptions,
    ) -> ProcessingResult {
        let rx = match self.provider.stream(request.clone()).await {
            Ok(rx) => rx,
            Err(e) => return ProcessingResult::failed(e.to_string()),
        };

        let mut accumulator = StreamAccumulator::new();
        if let Err(e) = accumulator.drain(rx, options.on_chunk.as_ref()).await {
            // Keep whatever partial text was gathered before the failure.
            let mut result = ProcessingResult::failed(e.to_string());
            let (response, reasoning) = accumulator.into_buffers();
            result.response = response;
            result.reasoning = reasoning;
            return result;
        }

        let mut result = ProcessingResult {
            finish_reason: accumulator.finish_reason().cloned(),
            usage: accumulator.usage(),
            ..Default::default()
        };

        if accumulator.wants_tools() {
            let calls = accumulator.tool_calls();
            let strategy = DispatchStrategy::classify(calls.len(), &self.profile);
            debug!(
                count = calls.len(),
                ?strategy,
                "Dispatching tool calls sequentially"
            );

            let tool_results = self
                .dispatcher
                .execute(&calls, options.agent_context.as_ref())
                .await;
            result.tool_calls = calls;
            result.tool_results = tool_results;
        }

        let (response, reasoning) = accumulator.into_buffers();
        result.response = response;
        result.reasoning = reasoning;
        result
    }

    fn publish(&self, event: TurnEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}
