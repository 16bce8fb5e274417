//! Tool call fragment assembler.
//!
//! Streaming APIs deliver tool calls shredded across chunks: the first
//! fragment for a call usually carries its id and name, every later one
//! appends a few characters of argument text. Fragments for different calls
//! interleave freely. This module reassembles them, keyed by stream index.

use std::collections::BTreeMap;

use turnstile_core::stream::ToolCallFragment;
use turnstile_core::tool::ToolCall;

/// An accumulating slot for one tool call index.
#[derive(Debug, Default)]
struct Slot {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Reassembles complete tool calls from interleaved argument fragments.
///
/// Fresh per turn; never shared across turns.
#[derive(Debug, Default)]
pub struct ToolCallAssembler {
    // BTreeMap keeps slots ordered by index, which is the call order the
    // model intended.
    slots: BTreeMap<u32, Slot>,
}

impl ToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk's fragments into the per-index slots.
    ///
    /// `id` and `name` are first-write-wins; argument text concatenates in
    /// arrival order. Fragments never leak across indices.
    pub fn add_fragments(&mut self, fragments: &[ToolCallFragment]) {
        for fragment in fragments {
            let slot = self.slots.entry(fragment.index).or_default();

            if slot.id.is_none() {
                if let Some(id) = &fragment.id {
                    slot.id = Some(id.clone());
                }
            }
            if slot.name.is_none() {
                if let Some(name) = &fragment.name {
                    slot.name = Some(name.clone());
                }
            }
            slot.arguments.push_str(&fragment.arguments_fragment);
        }
    }

    /// Whether any fragments have been seen this turn.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The assembled calls, ordered by index.
    ///
    /// Argument text is returned exactly as concatenated — parsing and
    /// validation belong to the dispatcher.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.slots
            .values()
            .map(|slot| ToolCall {
                id: slot.id.clone().unwrap_or_default(),
                name: slot.name.clone().unwrap_or_default(),
                arguments: slot.arguments.clone(),
            })
            .collect()
    }
}
