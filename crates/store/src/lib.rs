//! # Turnstile Store
//!
//! Conversation store backends implementing
//! [`turnstile_core::ConversationStore`]:
//!
//! - [`InMemoryStore`] — ephemeral, for tests and throwaway sessions
//! - [`JsonlStore`] — append-only JSON-lines file, durable and
//!   human-inspectable

pub mod in_memory;
pub mod jsonl;

pub use in_memory::InMemoryStore;
pub use jsonl::JsonlStore;
