//! Error types for the Turnstile domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Turnstile operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Stream / model-client errors ---
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised by the model stream source before or during iteration.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Stream interrupted: {0}")]
    Interrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    /// The tool does not accept the calling convention it was invoked with.
    /// The dispatcher reacts by retrying the identical call in the other
    /// convention; tools must return this without side effects.
    #[error("Calling convention not accepted by {tool_name}")]
    ConventionMismatch { tool_name: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Errors raised by the turn engine itself (as opposed to its collaborators).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Turn timed out after {0:.1}s")]
    TurnTimeout(f64),

    #[error("Chunk callback failed: {0}")]
    CallbackFailed(String),
}
