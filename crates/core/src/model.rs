//! Model capability profile.
//!
//! A declared capability surface for the target model, supplied by the
//! caller's model metadata. The engine consumes it only for the advisory
//! dispatch-strategy label — never to gate execution.

use serde::{Deserialize, Serialize};

/// Declared tool-calling capabilities of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Can the model emit more than one tool call per turn?
    #[serde(default)]
    pub multi_tool: bool,

    /// Does the model declare parallel tool-call support?
    #[serde(default)]
    pub parallel_tool_calls: bool,

    /// Declared cap on tool calls per turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tools_per_turn: Option<usize>,
}

impl Default for ModelProfile {
    /// A conservative default: single tool call per turn.
    fn default() -> Self {
        Self {
            multi_tool: false,
            parallel_tool_calls: false,
            max_tools_per_turn: None,
        }
    }
}

impl ModelProfile {
    /// A profile for models with full parallel tool-calling.
    pub fn parallel() -> Self {
        Self {
            multi_tool: true,
            parallel_tool_calls: true,
            max_tools_per_turn: None,
        }
    }

    /// A profile for models that emit several calls per turn, sequentially.
    pub fn multi() -> Self {
        Self {
            multi_tool: true,
            parallel_tool_calls: false,
            max_tools_per_turn: None,
        }
    }
}
