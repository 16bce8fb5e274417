//! File-based conversation store — persistent JSON-lines storage.
//!
//! Each line is one JSON-encoded `Message`. Entries are loaded into memory
//! on creation; `store_message` appends a single line, so the file is an
//! append-only log that matches the store trait's append-only contract.
//!
//! Simple, portable, human-inspectable.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use turnstile_core::error::StoreError;
use turnstile_core::message::Message;
use turnstile_core::store::ConversationStore;

/// A file-backed conversation store using JSONL (one JSON object per line).
pub struct JsonlStore {
    path: PathBuf,
    messages: RwLock<Vec<Message>>,
}

impl JsonlStore {
    /// Open a store at the given path.
    ///
    /// If the file exists, messages are loaded from it; corrupt lines are
    /// skipped with a warning. If it does not exist, the store starts empty
    /// (the file is created on first write).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let messages = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = messages.len(), "JSONL conversation store loaded");
        Self {
            path,
            messages: RwLock::new(messages),
        }
    }

    fn load_from_disk(path: &Path) -> Vec<Message> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Vec::new(), // File doesn't exist yet — start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Message>(line) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted message line");
                    None
                }
            })
            .collect()
    }

    fn append_line(&self, message: &Message) -> Result<(), StoreError> {
        let line = serde_json::to_string(message)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl ConversationStore for JsonlStore {
    fn retrieve_messages(&self) -> Result<Vec<Message>, StoreError> {
        self.messages
            .read()
            .map(|messages| messages.clone())
            .map_err(|_| StoreError::Storage("message lock poisoned".into()))
    }

    fn store_message(&self, message: Message) -> Result<(), StoreError> {
        let mut messages = self
            .messages
            .write()
            .map_err(|_| StoreError::Storage("message lock poisoned".into()))?;
        self.append_line(&message)?;
        messages.push(message);
        Ok(())
    }
}
