//! In-memory store — useful for testing and ephemeral sessions.

use std::sync::RwLock;

use turnstile_core::error::StoreError;
use turnstile_core::message::Message;
use turnstile_core::store::ConversationStore;

/// An in-memory conversation store backed by a Vec.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Default)]
pub struct InMemoryStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConversationStore for InMemoryStore {
    fn retrieve_messages(&self) -> Result<Vec<Message>, StoreError> {
        self.messages
            .read()
            .map(|messages| messages.clone())
            .map_err(|_| StoreError::Storage("message lock poisoned".into()))
    }

    fn store_message(&self, message: Message) -> Result<(), StoreError> {
        self.messages
            .write()
            .map(|mut messages| messages.push(message))
            .map_err(|_| StoreError::Storage("message lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::Role;

    #[test]
    fn store_and_retrieve_in_order() {
        let store = InMemoryStore::new();
        store.store_message(Message::user("first")).unwrap();
        store.store_message(Message::assistant("second")).unwrap();

        let messages = store.retrieve_messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "second");
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn empty_store_retrieves_nothing() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert!(store.retrieve_messages().unwrap().is_empty());
    }
}
