//! Tool trait — the abstraction over executable capabilities.
//!
//! Tools are what the model can act through: run a command, query a service,
//! edit a file. The engine looks tools up in a read-only registry and invokes
//! them with calling-convention tolerance (see [`ToolInvocation`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ToolError;
use crate::stream::ToolDefinition;

/// A fully assembled tool call, reconstructed from stream fragments.
///
/// `arguments` is the concatenated fragment text. It is *expected* to parse
/// as JSON but is not validated here — the dispatcher owns that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as raw JSON text
    pub arguments: String,
}

/// How a tool receives its arguments.
///
/// Two conventions coexist historically: older tools take the whole argument
/// object as one bundled payload, newer ones take the top-level fields as
/// individually named parameters. A tool accepts one of the two and returns
/// [`ToolError::ConventionMismatch`] (without side effects) for the other;
/// the dispatcher probes and remembers which one worked.
#[derive(Debug, Clone)]
pub enum ToolInvocation {
    /// The whole argument object as a single payload.
    Bundled(serde_json::Value),

    /// Top-level argument fields as individually named parameters.
    Expanded(serde_json::Map<String, serde_json::Value>),
}

impl ToolInvocation {
    /// The argument data regardless of convention, as a JSON value.
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Bundled(v) => v,
            Self::Expanded(m) => serde_json::Value::Object(m),
        }
    }

    /// Whether this is the bundled form.
    pub fn is_bundled(&self) -> bool {
        matches!(self, Self::Bundled(_))
    }
}

/// Identity of the agent on whose behalf tools are being executed.
///
/// When present, the dispatcher injects these into a *copy* of the call
/// arguments as `_agent_id`, `_agent_name` and `_from_agent`, so tools can
/// attribute side effects without the model having to thread identity
/// through its arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent_id: String,
    pub agent_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_agent: Option<String>,
}

/// The core Tool trait.
///
/// Implementations may be synchronous or asynchronous; `async_trait` makes
/// both uniform from the dispatcher's perspective. The return value is
/// opaque — any JSON shape a tool wants to hand back to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given invocation.
    async fn execute(
        &self,
        invocation: ToolInvocation,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A read-only registry of available tools, injected into the engine.
///
/// The engine uses exactly two operations: look up a tool to execute it, and
/// enumerate definitions to pass through verbatim on the model request.
pub trait ToolRegistry: Send + Sync {
    /// Get a tool by name.
    fn get(&self, name: &str) -> Option<Arc<dyn Tool>>;

    /// Get all tool definitions, in a stable order.
    fn definitions(&self) -> Vec<ToolDefinition>;
}

/// The standard registry: a name → tool map populated at startup.
///
/// Registration order is preserved so definitions reach the model in the
/// order tools were registered.
pub struct StaticToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl StaticToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }
}

impl Default for StaticToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry for StaticToolRegistry {
    fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool that accepts the bundled convention.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            invocation: ToolInvocation,
        ) -> std::result::Result<serde_json::Value, ToolError> {
            let args = invocation.into_value();
            Ok(serde_json::json!({ "echo": args["text"].as_str().unwrap_or("") }))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = StaticToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_definitions_preserve_order() {
        struct Named(&'static str);

        #[async_trait]
        impl Tool for Named {
            fn name(&self) -> &str {
                self.0
            }
            fn description(&self) -> &str {
                "test"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({"type": "object"})
            }
            async fn execute(
                &self,
                _invocation: ToolInvocation,
            ) -> std::result::Result<serde_json::Value, ToolError> {
                Ok(serde_json::Value::Null)
            }
        }

        let mut registry = StaticToolRegistry::new();
        registry.register(Arc::new(Named("zeta")));
        registry.register(Arc::new(Named("alpha")));
        registry.register(Arc::new(Named("mid")));

        let defs = registry.definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn echo_tool_executes() {
        let tool = EchoTool;
        let result = tool
            .execute(ToolInvocation::Bundled(
                serde_json::json!({"text": "hello world"}),
            ))
            .await
            .unwrap();
        assert_eq!(result["echo"], "hello world");
    }

    #[test]
    fn invocation_into_value_unifies_forms() {
        let bundled = ToolInvocation::Bundled(serde_json::json!({"a": 1}));
        let mut map = serde_json::Map::new();
        map.insert("a".into(), serde_json::json!(1));
        let expanded = ToolInvocation::Expanded(map);

        assert_eq!(bundled.into_value(), expanded.into_value());
    }
}
