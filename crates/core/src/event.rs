//! Turn event system — diagnostics without coupling.
//!
//! Events are published as the engine works through a turn. Callers can
//! subscribe for telemetry or UI without the engine knowing about them.
//! Publishing is fire-and-forget; a bus with no subscribers is fine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events emitted during turn processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A turn finished and was committed to the store.
    TurnCompleted {
        model: String,
        tool_calls: usize,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// A degenerate turn triggered a retry.
    TurnRetried {
        attempt: u32,
        delay_secs: f64,
        timestamp: DateTime<Utc>,
    },

    /// A turn produced nothing committable; the store was left untouched.
    TurnDiscarded {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed.
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for turn events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<TurnEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TurnEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TurnEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
