//! Conversation store trait — the engine's view of conversation history.
//!
//! The store is an external collaborator: the engine reads prior messages at
//! the start of a turn and appends the turn's messages at the end. Both
//! operations are synchronous from the engine's perspective; backends that
//! need real I/O keep it behind interior mutability.

use crate::error::StoreError;
use crate::message::Message;

/// Ordered, append-only access to one conversation's messages.
pub trait ConversationStore: Send + Sync {
    /// All prior messages, oldest first.
    fn retrieve_messages(&self) -> std::result::Result<Vec<Message>, StoreError>;

    /// Append one message.
    fn store_message(&self, message: Message) -> std::result::Result<(), StoreError>;
}
