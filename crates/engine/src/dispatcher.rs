//! Tool execution dispatcher.
//!
//! Executes an assembled batch of tool calls in order. One call's failure —
//! bad name, unparseable arguments, unknown tool, or an execution error —
//! becomes a structured error object at that call's position and never
//! aborts its siblings. Results align 1:1 with the input calls.
//!
//! Two calling conventions coexist historically (see
//! [`ToolInvocation`]): the dispatcher probes bundled-first and remembers
//! per tool which convention worked, so the probe happens once per tool,
//! not once per call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use turnstile_core::error::ToolError;
use turnstile_core::event::{EventBus, TurnEvent};
use turnstile_core::model::ModelProfile;
use turnstile_core::tool::{AgentContext, Tool, ToolCall, ToolInvocation, ToolRegistry};

/// Which argument-passing form a tool accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convention {
    Bundled,
    Expanded,
}

/// Advisory label for a tool-call batch against a model's declared
/// capabilities.
///
/// Purely informational: dispatch is sequential regardless of the label.
/// It exists for diagnostics (logged at debug level) and must never gate
/// or alter execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// No tool calls in the batch.
    NoCalls,
    /// A single call — every model supports this.
    Single,
    /// Several calls against a model that emits them sequentially.
    SequentialBatch,
    /// Several calls against a model with declared parallel support.
    ParallelCapable,
    /// More calls than the model's declared per-turn limit.
    OverDeclaredLimit,
    /// Several calls from a model that only declares single-tool support.
    UndeclaredBatch,
}

impl DispatchStrategy {
    /// Classify a batch size against a model profile.
    pub fn classify(call_count: usize, profile: &ModelProfile) -> Self {
        match call_count {
            0 => Self::NoCalls,
            1 => Self::Single,
            n => {
                if profile
                    .max_tools_per_turn
                    .is_some_and(|limit| n > limit)
                {
                    Self::OverDeclaredLimit
                } else if profile.parallel_tool_calls {
                    Self::ParallelCapable
                } else if profile.multi_tool {
                    Self::SequentialBatch
                } else {
                    Self::UndeclaredBatch
                }
            }
        }
    }
}

/// Executes tool calls against an injected read-only registry.
pub struct ToolDispatcher {
    registry: Arc<dyn ToolRegistry>,

    /// Per-tool calling convention, resolved on first successful call.
    conventions: RwLock<HashMap<String, Convention>>,

    /// Optional event bus for `ToolExecuted` diagnostics.
    events: Option<Arc<EventBus>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            registry,
            conventions: RwLock::new(HashMap::new()),
            events: None,
        }
    }

    /// Publish `ToolExecuted` events to the given bus.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Execute a batch of tool calls in order.
    ///
    /// The returned vector is positionally aligned with `calls`: each entry
    /// is the tool's raw result, or an `{"error": ...}` object for that call
    /// alone. With `agent_context` present, identity fields are injected
    /// into a copy of each call's arguments.
    pub async fn execute(
        &self,
        calls: &[ToolCall],
        agent_context: Option<&AgentContext>,
    ) -> Vec<Value> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            results.push(self.execute_one(call, agent_context).await);
        }

        results
    }

    async fn execute_one(&self, call: &ToolCall, agent_context: Option<&AgentContext>) -> Value {
        if call.name.is_empty() {
            warn!(call_id = %call.id, "Tool call has no function name");
            return json!({
                "error": format!("Tool call {} is missing a function name", call.id)
            });
        }

        let arguments: Value = match serde_json::from_str(&call.arguments) {
            Ok(v) => v,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool arguments failed to parse");
                return json!({
                    "error": format!(
                        "Invalid arguments for {}: {}",
                        call.name, call.arguments
                    )
                });
            }
        };

        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return json!({ "error": format!("Unknown tool: {}", call.name) });
        };

        let arguments = match agent_context {
            Some(ctx) => enrich_arguments(&arguments, ctx),
            None => arguments,
        };

        let start = std::time::Instant::now();
        let outcome = self.invoke(tool.as_ref(), &call.name, &arguments).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (result, success) = match outcome {
            Ok(value) => (value, true),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                (
                    json!({ "error": format!("Failed to execute {}: {}", call.name, e) }),
                    false,
                )
            }
        };

        if let Some(events) = &self.events {
            events.publish(TurnEvent::ToolExecuted {
                tool_name: call.name.clone(),
                success,
                duration_ms,
                timestamp: Utc::now(),
            });
        }

        result
    }

    /// Invoke with calling-convention resolution.
    ///
    /// The cached convention (or bundled, on first contact) is tried first;
    /// a `ConventionMismatch` falls back to the other form. Whichever form
    /// succeeds is cached for this tool name.
    async fn invoke(
        &self,
        tool: &dyn Tool,
        name: &str,
        arguments: &Value,
    ) -> Result<Value, ToolError> {
        let cached = self.conventions.read().await.get(name).copied();
        let preferred = cached.unwrap_or(Convention::Bundled);

        match self.invoke_as(tool, name, arguments, preferred).await {
            Err(ToolError::ConventionMismatch { .. }) => {
                let fallback = match preferred {
                    Convention::Bundled => Convention::Expanded,
                    Convention::Expanded => Convention::Bundled,
                };
                debug!(tool = %name, ?fallback, "Calling convention mismatch, retrying");
                let value = self.invoke_as(tool, name, arguments, fallback).await?;
                self.conventions.write().await.insert(name.to_string(), fallback);
                Ok(value)
            }
            Ok(value) => {
                if cached.is_none() {
                    self.conventions
                        .write()
                        .await
                        .insert(name.to_string(), preferred);
                }
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }

    async fn invoke_as(
        &self,
        tool: &dyn Tool,
        name: &str,
        arguments: &Value,
        convention: Convention,
    ) -> Result<Value, ToolError> {
        match convention {
            Convention::Bundled => tool.execute(ToolInvocation::Bundled(arguments.clone())).await,
            Convention::Expanded => match arguments.as_object() {
                Some(map) => tool.execute(ToolInvocation::Expanded(map.clone())).await,
                None => Err(ToolError::InvalidArguments(format!(
                    "cannot expand non-object arguments for {name}"
                ))),
            },
        }
    }
}

/// Copy `args` and inject the caller's identity fields. The original value
/// is never mutated; non-object arguments pass through unchanged.
fn enrich_arguments(args: &Value, ctx: &AgentContext) -> Value {
    let mut enriched = args.clone();
    if let Some(map) = enriched.as_object_mut() {
        map.insert("_agent_id".into(), json!(ctx.agent_id));
        map.insert("_agent_name".into(), json!(ctx.agent_name));
        if let Some(from) = &ctx.from_agent {
            map.insert("_from_agent".into(), json!(from));
        }
    }
    enriched
}
