//! # Lifecycle Events
//!
//! Broadcast publisher for dispatch lifecycle events. Subscribers are
//! optional; publishing with nobody listening succeeds.

use serde_json::Value;
use tokio::sync::broadcast;

/// High-throughput publisher for dispatch lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<DispatchEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct DispatchEvent {
    /// Event name, one of [`crate::constants::events`]
    pub name: String,
    /// Event payload
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub fn publish(&self, event_name: impl Into<String>, context: Value) {
        let event = DispatchEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // send() errors when there are no subscribers; lifecycle events are
        // observability, not control flow, so that case is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EVENT_CAPACITY)
    }
}
