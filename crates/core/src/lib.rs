//! # Turnstile Core
//!
//! Domain types, traits, and error definitions for the Turnstile turn
//! execution engine. This crate has **zero framework dependencies** — it
//! defines the domain model the engine and the store crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the engine is defined as a trait here:
//! the model stream source ([`Provider`]), the tool registry
//! ([`ToolRegistry`]), and the conversation store ([`ConversationStore`]).
//! Implementations are injected, never ambient, which keeps the engine
//! independently testable.

pub mod error;
pub mod event;
pub mod message;
pub mod model;
pub mod store;
pub mod stream;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{EngineError, Error, Result, StoreError, StreamError, ToolError};
pub use event::{EventBus, TurnEvent};
pub use message::{Message, Role};
pub use model::ModelProfile;
pub use store::ConversationStore;
pub use stream::{
    ChunkReceiver, FinishReason, Provider, ProviderRequest, StreamChunk, ToolCallFragment,
    ToolDefinition, Usage,
};
pub use tool::{AgentContext, StaticToolRegistry, Tool, ToolCall, ToolInvocation, ToolRegistry};
pub use turn::ProcessingResult;
