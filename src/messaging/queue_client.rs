//! # Queue Client Boundary
//!
//! The single seam between the dispatch components and the queue broker.
//!
//! The broker is assumed reliable with at-least-once delivery; submission
//! failures surface synchronously to the caller and are never retried at
//! this layer. [`InMemoryQueueClient`] is the embedded implementation used
//! by tests and single-process deployments.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, SignalRelayError};
use crate::messaging::message::DeliveryMessage;

/// Queue submission interface used by the Dispatch Coordinator and Retry
/// Controller
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Submit a message under a well-known task name, optionally delayed.
    ///
    /// Returns the broker's message ID. A failure here is a
    /// [`SignalRelayError::QueueSubmission`] surfaced to the caller.
    async fn submit(
        &self,
        task_name: &str,
        message: &DeliveryMessage,
        delay: Option<Duration>,
    ) -> Result<i64>;
}

/// One submitted work item, as handed to a worker
#[derive(Debug)]
pub struct QueueItem {
    /// Broker-assigned message ID
    pub message_id: i64,
    /// Well-known task name the item was submitted under
    pub task_name: String,
    /// The delivery payload
    pub message: DeliveryMessage,
    /// Delay requested at submission time; an external broker would apply
    /// this as message visibility, the in-process worker sleeps it off
    pub delay: Option<Duration>,
}

/// Channel-backed queue client for tests and embedded use
#[derive(Clone)]
pub struct InMemoryQueueClient {
    sender: mpsc::UnboundedSender<QueueItem>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryQueueClient {
    /// Create a client plus the receiving end a worker consumes from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<QueueItem>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                next_id: Arc::new(AtomicI64::new(1)),
            },
            receiver,
        )
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn submit(
        &self,
        task_name: &str,
        message: &DeliveryMessage,
        delay: Option<Duration>,
    ) -> Result<i64> {
        let message_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let item = QueueItem {
            message_id,
            task_name: task_name.to_string(),
            message: message.clone(),
            delay,
        };

        self.sender.send(item).map_err(|_| {
            SignalRelayError::queue_submission(task_name, "queue channel closed")
        })?;

        debug!(
            task_name = %task_name,
            message_id = message_id,
            signal_name = %message.signal_name,
            "Submitted message to queue"
        );
        Ok(message_id)
    }
}
