//! # Turnstile Engine
//!
//! The tool-calling turn orchestration loop: consume a streamed model
//! response, reassemble fragmented tool calls, dispatch tools with
//! calling-convention tolerance, retry degenerate completions, sanitize
//! incidentally fenced structured output, and commit the turn to
//! conversation history as an atomic unit.
//!
//! The engine deliberately does **not** decide whether to continue a
//! multi-turn exchange after tool execution — the caller appends the
//! returned tool results to history and invokes [`TurnEngine::process`]
//! again when further model work is needed.

pub mod accumulator;
pub mod assembler;
pub mod dispatcher;
pub mod orchestrator;
pub mod retry;
pub mod sanitizer;
pub mod writer;

pub use accumulator::{ChunkSink, StreamAccumulator};
pub use assembler::ToolCallAssembler;
pub use dispatcher::{DispatchStrategy, ToolDispatcher};
pub use orchestrator::{TurnEngine, TurnOptions};
pub use retry::RetryPolicy;
pub use sanitizer::sanitize;
pub use writer::{CommitOutcome, CompletenessCheck, TurnWriter, INCOMPLETE_PLACEHOLDER};
